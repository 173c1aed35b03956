//! Scripted [`EdumedApi`] double for session and controller tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use edumed_api::{
    AccessToken, Chat, ChatListQuery, Difficulty, EndGameRequest, GameResult, LoginRequest,
    Message, NewChatRequest, Profile, RefreshRequest, RegisterRequest, SendMessageRequest,
    Sender, TokenPair, TopUser, User,
};
use tokio::sync::Notify;

use crate::api::EdumedApi;
use crate::error::{Error, Result};

pub fn unauthorized() -> Error {
    Error::Http {
        status: 401,
        body: r#"{"detail":"Token is invalid or expired"}"#.to_string(),
    }
}

pub fn http_error(status: u16) -> Error {
    Error::Http {
        status,
        body: String::new(),
    }
}

pub fn sample_chat(id: i64, finished: bool) -> Chat {
    Chat {
        id,
        doctor: Some(1),
        patient_data: None,
        messages: vec![sample_message(id * 100, Sender::Patient, "Hello doctor")],
        is_finished: finished,
        diagnosis: None,
        score: None,
        feedback: None,
        start_time: Utc.timestamp_opt(1_717_200_000 + id, 0).unwrap(),
        end_time: None,
        difficulty: Some(Difficulty::Easy),
    }
}

pub fn sample_message(id: i64, sender: Sender, content: &str) -> Message {
    Message {
        id,
        sender,
        content: content.to_string(),
        timestamp: Utc.timestamp_opt(1_717_200_500, 0).unwrap(),
        is_result_message: false,
    }
}

pub fn sample_profile() -> Profile {
    Profile {
        user: User {
            username: "drhouse".to_string(),
            email: "house@example.org".to_string(),
        },
        points: 4200,
        rank: 2,
    }
}

/// Validates bearer tokens against `valid_token` and serves scripted
/// responses. Counters record how often each interesting endpoint ran.
pub struct ScriptedApi {
    pub valid_token: Mutex<String>,
    /// Whether the refresh exchange succeeds.
    pub refresh_ok: bool,
    /// Whether a successful refresh makes the new token valid.
    pub rotate_on_refresh: bool,
    /// When set, the refresh exchange parks until notified.
    pub block_refresh: Option<Arc<Notify>>,
    /// When set, `update_chat` fails with a 500.
    pub fail_update: bool,

    pub refresh_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub send_calls: AtomicUsize,

    pub chats: Mutex<Vec<Chat>>,
    pub top: Mutex<Vec<TopUser>>,
    pub reply: Mutex<Option<Message>>,
    pub game_result: Mutex<Option<GameResult>>,
    pub created: Mutex<Option<Chat>>,

    pub created_difficulty: Mutex<Option<Difficulty>>,
    pub updated: Mutex<Option<Chat>>,
    pub last_query: Mutex<Option<(Option<String>, String)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            valid_token: Mutex::new("token-1".to_string()),
            refresh_ok: true,
            rotate_on_refresh: true,
            block_refresh: None,
            fail_update: false,
            refresh_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            chats: Mutex::new(Vec::new()),
            top: Mutex::new(Vec::new()),
            reply: Mutex::new(None),
            game_result: Mutex::new(None),
            created: Mutex::new(None),
            created_difficulty: Mutex::new(None),
            updated: Mutex::new(None),
            last_query: Mutex::new(None),
        }
    }

    fn check(&self, token: &str) -> Result<()> {
        if token == *self.valid_token.lock().unwrap() {
            Ok(())
        } else {
            Err(unauthorized())
        }
    }
}

impl EdumedApi for ScriptedApi {
    async fn register(&self, request: &RegisterRequest) -> Result<User> {
        Ok(User {
            username: request.username.clone(),
            email: request.email.clone(),
        })
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenPair> {
        if request.password == "secret" {
            Ok(TokenPair {
                access: self.valid_token.lock().unwrap().clone(),
                refresh: "refresh-1".to_string(),
            })
        } else {
            Err(unauthorized())
        }
    }

    async fn refresh(&self, _request: &RefreshRequest) -> Result<AccessToken> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.block_refresh {
            gate.notified().await;
        }
        if !self.refresh_ok {
            return Err(unauthorized());
        }
        if self.rotate_on_refresh {
            *self.valid_token.lock().unwrap() = "token-2".to_string();
        }
        Ok(AccessToken {
            access: "token-2".to_string(),
        })
    }

    async fn my_profile(&self, token: &str) -> Result<Profile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.check(token)?;
        Ok(sample_profile())
    }

    async fn top_users(&self) -> Result<Vec<TopUser>> {
        Ok(self.top.lock().unwrap().clone())
    }

    async fn list_chats(&self, token: &str, query: &ChatListQuery) -> Result<Vec<Chat>> {
        self.check(token)?;
        *self.last_query.lock().unwrap() = Some((query.search.clone(), query.ordering()));
        Ok(self.chats.lock().unwrap().clone())
    }

    async fn get_chat(&self, token: &str, id: i64) -> Result<Chat> {
        self.check(token)?;
        self.chats
            .lock()
            .unwrap()
            .iter()
            .find(|chat| chat.id == id)
            .cloned()
            .ok_or_else(|| http_error(404))
    }

    async fn create_chat(&self, token: &str, request: &NewChatRequest) -> Result<Chat> {
        self.check(token)?;
        *self.created_difficulty.lock().unwrap() = Some(request.difficulty);
        self.created
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| http_error(500))
    }

    async fn send_message(
        &self,
        token: &str,
        _chat_id: i64,
        _request: &SendMessageRequest,
    ) -> Result<Message> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.check(token)?;
        self.reply
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| http_error(500))
    }

    async fn end_game(
        &self,
        token: &str,
        _chat_id: i64,
        _request: &EndGameRequest,
    ) -> Result<GameResult> {
        self.check(token)?;
        self.game_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| http_error(400))
    }

    async fn update_chat(&self, token: &str, chat: &Chat) -> Result<Chat> {
        self.check(token)?;
        if self.fail_update {
            return Err(http_error(500));
        }
        *self.updated.lock().unwrap() = Some(chat.clone());
        Ok(chat.clone())
    }
}
