//! Game view state, reconstructed from server responses.

use chrono::{DateTime, Utc};
use edumed_api::{Chat, GameResult, Message, Sender};

/// Invitation shown when the player has no games yet.
pub const PLACEHOLDER_INVITE: &str =
    "You have no active games yet. Click \"New Game\" in the side panel to start.";

/// A locally-authored doctor message awaiting server confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMessage {
    pub local_id: u64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One transcript line.
///
/// Optimistic sends enter the transcript as [`TranscriptEntry::Pending`],
/// keyed by a client-side counter. On confirmation the entry keeps its
/// temporary id (the server never re-sends the doctor message); on failure
/// it is removed exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    Confirmed(Message),
    Pending(PendingMessage),
}

impl TranscriptEntry {
    pub fn sender(&self) -> Sender {
        match self {
            Self::Confirmed(msg) => msg.sender,
            Self::Pending(_) => Sender::Doctor,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Confirmed(msg) => &msg.content,
            Self::Pending(pending) => &pending.content,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    pub fn is_result(&self) -> bool {
        matches!(self, Self::Confirmed(msg) if msg.is_result_message)
    }
}

/// The chat currently on screen: chat metadata with the message list
/// replaced by tagged transcript entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveChat {
    pub id: i64,
    pub doctor: Option<i64>,
    pub patient_data: Option<serde_json::Value>,
    pub is_finished: bool,
    pub diagnosis: Option<String>,
    pub score: Option<i64>,
    pub feedback: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub difficulty: Option<edumed_api::Difficulty>,
    pub entries: Vec<TranscriptEntry>,
}

impl ActiveChat {
    /// Project the transcript back into a full wire record. Local entries
    /// are materialized with their temporary ids, as the server ignores the
    /// message list on update anyway.
    pub fn to_chat(&self) -> Chat {
        let messages = self
            .entries
            .iter()
            .map(|entry| match entry {
                TranscriptEntry::Confirmed(msg) => msg.clone(),
                TranscriptEntry::Pending(pending) => Message {
                    id: pending.local_id as i64,
                    sender: Sender::Doctor,
                    content: pending.content.clone(),
                    timestamp: pending.timestamp,
                    is_result_message: false,
                },
            })
            .collect();

        Chat {
            id: self.id,
            doctor: self.doctor,
            patient_data: self.patient_data.clone(),
            messages,
            is_finished: self.is_finished,
            diagnosis: self.diagnosis.clone(),
            score: self.score,
            feedback: self.feedback.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            difficulty: self.difficulty,
        }
    }
}

impl From<Chat> for ActiveChat {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id,
            doctor: chat.doctor,
            patient_data: chat.patient_data,
            is_finished: chat.is_finished,
            diagnosis: chat.diagnosis,
            score: chat.score,
            feedback: chat.feedback,
            start_time: chat.start_time,
            end_time: chat.end_time,
            difficulty: chat.difficulty,
            entries: chat
                .messages
                .into_iter()
                .map(TranscriptEntry::Confirmed)
                .collect(),
        }
    }
}

/// Past-game list plus the active transcript.
///
/// All methods are pure state transitions; the controller in `edumed-client`
/// feeds them with server responses and decides what goes on the wire.
#[derive(Debug, Clone, Default)]
pub struct GameView {
    pub past_games: Vec<Chat>,
    pub active: Option<ActiveChat>,
    next_local_id: u64,
}

impl GameView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the past-game list from a list response. The active chat
    /// becomes the first item; an empty result synthesizes a single local
    /// placeholder that is never persisted server-side.
    pub fn apply_past_games(&mut self, chats: Vec<Chat>, now: DateTime<Utc>) {
        if let Some(first) = chats.first() {
            self.active = Some(ActiveChat::from(first.clone()));
        } else {
            self.active = Some(ActiveChat::from(Self::placeholder(now)));
        }
        self.past_games = chats;
    }

    /// The invitation chat shown when the list is empty.
    pub fn placeholder(now: DateTime<Utc>) -> Chat {
        Chat {
            id: 0,
            doctor: None,
            patient_data: None,
            messages: vec![Message {
                id: 0,
                sender: Sender::Patient,
                content: PLACEHOLDER_INVITE.to_string(),
                timestamp: now,
                is_result_message: false,
            }],
            is_finished: false,
            diagnosis: None,
            score: None,
            feedback: None,
            start_time: now,
            end_time: None,
            difficulty: None,
        }
    }

    /// Replace the active chat with a freshly fetched one. Unsent local
    /// edits on the previous chat are dropped, not merged.
    pub fn open_chat(&mut self, chat: Chat) {
        self.active = Some(ActiveChat::from(chat));
    }

    /// Prepend a newly created chat and make it active.
    pub fn add_new_chat(&mut self, chat: Chat) {
        self.active = Some(ActiveChat::from(chat.clone()));
        self.past_games.insert(0, chat);
    }

    pub fn active_chat_id(&self) -> Option<i64> {
        self.active.as_ref().map(|chat| chat.id)
    }

    /// Send guard: non-blank text, a chat on screen, and not finished.
    pub fn can_send(&self, text: &str) -> bool {
        !text.trim().is_empty()
            && self.active.as_ref().is_some_and(|chat| !chat.is_finished)
    }

    pub fn can_end(&self) -> bool {
        self.active.as_ref().is_some_and(|chat| !chat.is_finished)
    }

    /// Optimistically append a pending doctor entry. Returns the local id
    /// used to confirm or roll back, or `None` when the guard refuses.
    pub fn begin_send(&mut self, content: &str, now: DateTime<Utc>) -> Option<u64> {
        if !self.can_send(content) {
            return None;
        }

        self.next_local_id += 1;
        let local_id = self.next_local_id;
        let active = self.active.as_mut()?;
        active.entries.push(TranscriptEntry::Pending(PendingMessage {
            local_id,
            content: content.to_string(),
            timestamp: now,
        }));
        Some(local_id)
    }

    /// The server answered: the pending entry becomes a confirmed doctor
    /// message under its temporary id and the patient reply is appended.
    pub fn confirm_send(&mut self, local_id: u64, reply: Message) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let pos = active
            .entries
            .iter()
            .position(|entry| matches!(entry, TranscriptEntry::Pending(p) if p.local_id == local_id));
        if let Some(pos) = pos
            && let TranscriptEntry::Pending(pending) = &active.entries[pos]
        {
            let confirmed = Message {
                id: pending.local_id as i64,
                sender: Sender::Doctor,
                content: pending.content.clone(),
                timestamp: pending.timestamp,
                is_result_message: false,
            };
            active.entries[pos] = TranscriptEntry::Confirmed(confirmed);
        }

        active.entries.push(TranscriptEntry::Confirmed(reply));
    }

    /// The send failed: remove exactly the pending entry, restoring the
    /// transcript to its pre-call contents.
    pub fn fail_send(&mut self, local_id: u64) {
        if let Some(active) = self.active.as_mut() {
            active.entries.retain(
                |entry| !matches!(entry, TranscriptEntry::Pending(p) if p.local_id == local_id),
            );
        }
    }

    /// Apply an end-game evaluation: mark the active chat finished, append
    /// the result message, sync the past-games entry, and return the full
    /// updated record for the follow-up PUT.
    pub fn finish_game(
        &mut self,
        diagnosis: &str,
        result: &GameResult,
        now: DateTime<Utc>,
    ) -> Option<Chat> {
        if !self.can_end() {
            return None;
        }
        let active = self.active.as_mut()?;

        self.next_local_id += 1;
        active.entries.push(TranscriptEntry::Confirmed(Message {
            id: self.next_local_id as i64,
            sender: Sender::System,
            content: format!(
                "Game over. Diagnosis: {}. Score: {}. Feedback: {}",
                diagnosis, result.score, result.feedback
            ),
            timestamp: now,
            is_result_message: true,
        }));
        active.is_finished = true;
        active.diagnosis = Some(diagnosis.to_string());
        active.score = Some(result.score);
        active.feedback = Some(result.feedback.clone());

        let updated = active.to_chat();
        if let Some(game) = self.past_games.iter_mut().find(|game| game.id == updated.id) {
            *game = updated.clone();
        }
        Some(updated)
    }

    /// Forget everything, as on logout.
    pub fn clear(&mut self) {
        self.past_games.clear();
        self.active = None;
    }
}
