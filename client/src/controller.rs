use std::sync::Arc;

use chrono::Utc;
use edumed_api::{ChatListQuery, Difficulty, EndGameRequest, NewChatRequest, SendMessageRequest};
use edumed_game::GameView;

use crate::api::EdumedApi;
use crate::error::Result;
use crate::session::Session;
use crate::store::TokenStore;

/// Binds the game view state to the API through the session's refresh path.
///
/// Guarded actions (send, end) are silent no-ops when the guard refuses,
/// exactly as the form submit handlers they replace were. Every other
/// failure is surfaced to the caller with the view left in its pre-action
/// or partially-applied state.
pub struct GameController<A, S> {
    session: Arc<Session<A, S>>,
    pub view: GameView,
}

impl<A: EdumedApi, S: TokenStore> GameController<A, S> {
    pub fn new(session: Arc<Session<A, S>>) -> Self {
        Self {
            session,
            view: GameView::new(),
        }
    }

    /// Fetch the filtered/sorted past-game list. An empty result leaves a
    /// single local placeholder chat inviting the player to start a game.
    pub async fn load_past_games(&mut self, query: &ChatListQuery) -> Result<()> {
        let session = self.session.as_ref();
        let chats = session
            .with_auth(|token| async move { session.api().list_chats(&token, query).await })
            .await?;
        self.view.apply_past_games(chats, Utc::now());
        Ok(())
    }

    /// Fetch one chat and put it on screen. Unsent local edits are dropped.
    pub async fn load_game(&mut self, id: i64) -> Result<()> {
        let session = self.session.as_ref();
        let chat = session
            .with_auth(|token| async move { session.api().get_chat(&token, id).await })
            .await?;
        self.view.open_chat(chat);
        Ok(())
    }

    pub async fn create_new_chat(&mut self, difficulty: Difficulty) -> Result<()> {
        let session = self.session.as_ref();
        let request = &NewChatRequest { difficulty };
        let chat = session
            .with_auth(|token| async move { session.api().create_chat(&token, request).await })
            .await?;
        self.view.add_new_chat(chat);
        Ok(())
    }

    /// Optimistically append the doctor message, post it, and either append
    /// the patient reply or roll the optimistic entry back.
    pub async fn send_message(&mut self, text: &str) -> Result<()> {
        let Some(chat_id) = self.view.active_chat_id() else {
            return Ok(());
        };
        let Some(local_id) = self.view.begin_send(text, Utc::now()) else {
            return Ok(());
        };

        let session = self.session.as_ref();
        let request = &SendMessageRequest {
            content: text.to_string(),
        };
        let sent = session
            .with_auth(|token| async move {
                session.api().send_message(&token, chat_id, request).await
            })
            .await;

        match sent {
            Ok(reply) => {
                self.view.confirm_send(local_id, reply);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(chat_id, error = %err, "Send failed, rolling back");
                self.view.fail_send(local_id);
                Err(err)
            }
        }
    }

    /// Submit the diagnosis for scoring, finish the chat locally, then
    /// persist the full updated record. The two round trips are not
    /// transactional: a failed PUT leaves the local view finished while the
    /// server record may not be, and is surfaced, not reconciled.
    pub async fn end_game(&mut self, diagnosis: &str) -> Result<()> {
        let Some(chat_id) = self.view.active_chat_id() else {
            return Ok(());
        };
        if !self.view.can_end() {
            return Ok(());
        }

        let session = self.session.as_ref();
        let request = &EndGameRequest {
            answer: diagnosis.to_string(),
        };
        let result = session
            .with_auth(|token| async move { session.api().end_game(&token, chat_id, request).await })
            .await?;

        let Some(updated) = self.view.finish_game(diagnosis, &result, Utc::now()) else {
            return Ok(());
        };

        let session = self.session.as_ref();
        let updated = &updated;
        session
            .with_auth(|token| async move { session.api().update_chat(&token, updated).await })
            .await
            .map(|_| ())
            .inspect_err(|err| {
                tracing::warn!(chat_id, error = %err, "Failed to persist finished game");
            })
    }

    /// Forget all view state, as on logout.
    pub fn reset(&mut self) {
        self.view.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use edumed_api::{GameResult, Sender, SortField, SortOrder};
    use edumed_game::PLACEHOLDER_INVITE;

    use super::*;
    use crate::store::MemoryTokenStore;
    use crate::testing::{sample_chat, sample_message, ScriptedApi};

    fn controller_with(api: ScriptedApi) -> GameController<ScriptedApi, MemoryTokenStore> {
        let store = MemoryTokenStore::with_pair("token-1", "refresh-1");
        GameController::new(Arc::new(Session::new(api, store)))
    }

    #[tokio::test]
    async fn test_empty_list_yields_placeholder() {
        let mut controller = controller_with(ScriptedApi::new());

        controller
            .load_past_games(&ChatListQuery::new())
            .await
            .unwrap();

        assert!(controller.view.past_games.is_empty());
        let active = controller.view.active.as_ref().unwrap();
        assert_eq!(active.id, 0);
        assert!(!active.is_finished);
        assert_eq!(active.entries.len(), 1);
        assert_eq!(active.entries[0].content(), PLACEHOLDER_INVITE);
    }

    #[tokio::test]
    async fn test_load_past_games_forwards_query_and_activates_first() {
        let api = ScriptedApi::new();
        *api.chats.lock().unwrap() = vec![sample_chat(7, false), sample_chat(3, true)];
        let mut controller = controller_with(api);

        let query = ChatListQuery::new()
            .search("flu")
            .sort(SortField::Score, SortOrder::Ascending);
        controller.load_past_games(&query).await.unwrap();

        assert_eq!(controller.view.active_chat_id(), Some(7));
        assert_eq!(controller.view.past_games.len(), 2);
        let recorded = controller.session.api().last_query.lock().unwrap().clone();
        assert_eq!(recorded, Some((Some("flu".to_string()), "score".to_string())));
    }

    #[tokio::test]
    async fn test_load_game_replaces_active() {
        let api = ScriptedApi::new();
        *api.chats.lock().unwrap() = vec![sample_chat(7, false), sample_chat(3, true)];
        let mut controller = controller_with(api);

        controller.load_game(3).await.unwrap();
        assert_eq!(controller.view.active_chat_id(), Some(3));
        assert!(controller.view.active.as_ref().unwrap().is_finished);
    }

    #[tokio::test]
    async fn test_create_new_chat_posts_difficulty_and_prepends() {
        let api = ScriptedApi::new();
        *api.chats.lock().unwrap() = vec![sample_chat(7, false)];
        *api.created.lock().unwrap() = Some(sample_chat(99, false));
        let mut controller = controller_with(api);
        controller
            .load_past_games(&ChatListQuery::new())
            .await
            .unwrap();

        controller.create_new_chat(Difficulty::Easy).await.unwrap();

        assert_eq!(controller.view.active_chat_id(), Some(99));
        assert_eq!(controller.view.past_games[0].id, 99);
        assert_eq!(controller.view.past_games[1].id, 7);
        let posted = *controller.session.api().created_difficulty.lock().unwrap();
        assert_eq!(posted, Some(Difficulty::Easy));
    }

    #[tokio::test]
    async fn test_send_message_appends_pending_then_reply() {
        let api = ScriptedApi::new();
        *api.chats.lock().unwrap() = vec![sample_chat(1, false)];
        *api.reply.lock().unwrap() = Some(sample_message(
            201,
            Sender::Patient,
            "It started on Monday.",
        ));
        let mut controller = controller_with(api);
        controller
            .load_past_games(&ChatListQuery::new())
            .await
            .unwrap();

        controller.send_message("fever").await.unwrap();

        let active = controller.view.active.as_ref().unwrap();
        let contents: Vec<&str> = active.entries.iter().map(|entry| entry.content()).collect();
        assert_eq!(contents, vec!["Hello doctor", "fever", "It started on Monday."]);
        assert!(active.entries.iter().all(|entry| !entry.is_pending()));
    }

    #[tokio::test]
    async fn test_send_message_failure_rolls_back() {
        let api = ScriptedApi::new();
        *api.chats.lock().unwrap() = vec![sample_chat(1, false)];
        let mut controller = controller_with(api);
        controller
            .load_past_games(&ChatListQuery::new())
            .await
            .unwrap();
        let before = controller.view.active.clone().unwrap();

        let err = controller.send_message("fever").await.unwrap_err();
        assert!(matches!(err, crate::Error::Http { status: 500, .. }));
        assert_eq!(controller.view.active.as_ref().unwrap(), &before);
    }

    #[tokio::test]
    async fn test_finished_chat_never_dispatches_send() {
        let api = ScriptedApi::new();
        *api.chats.lock().unwrap() = vec![sample_chat(1, true)];
        let mut controller = controller_with(api);
        controller
            .load_past_games(&ChatListQuery::new())
            .await
            .unwrap();

        controller.send_message("fever").await.unwrap();
        controller.send_message("   ").await.unwrap();

        assert_eq!(
            controller.session.api().send_calls.load(Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn test_end_game_finishes_and_persists() {
        let api = ScriptedApi::new();
        *api.chats.lock().unwrap() = vec![sample_chat(5, false)];
        *api.game_result.lock().unwrap() = Some(GameResult {
            score: 80,
            feedback: "Good".to_string(),
        });
        let mut controller = controller_with(api);
        controller
            .load_past_games(&ChatListQuery::new())
            .await
            .unwrap();

        controller.end_game("flu").await.unwrap();

        let active = controller.view.active.as_ref().unwrap();
        assert!(active.is_finished);
        assert_eq!(active.diagnosis.as_deref(), Some("flu"));
        assert_eq!(active.score, Some(80));

        let updated = controller.session.api().updated.lock().unwrap().clone().unwrap();
        assert!(updated.is_finished);
        assert_eq!(updated.score, Some(80));
        let last = updated.messages.last().unwrap();
        assert!(last.is_result_message);
        assert_eq!(
            last.content,
            "Game over. Diagnosis: flu. Score: 80. Feedback: Good"
        );
        assert_eq!(controller.view.past_games[0], updated);
    }

    #[tokio::test]
    async fn test_end_game_put_failure_keeps_local_finish() {
        let api = ScriptedApi {
            fail_update: true,
            ..ScriptedApi::new()
        };
        *api.chats.lock().unwrap() = vec![sample_chat(5, false)];
        *api.game_result.lock().unwrap() = Some(GameResult {
            score: 80,
            feedback: "Good".to_string(),
        });
        let mut controller = controller_with(api);
        controller
            .load_past_games(&ChatListQuery::new())
            .await
            .unwrap();

        let err = controller.end_game("flu").await.unwrap_err();
        assert!(matches!(err, crate::Error::Http { status: 500, .. }));

        // The local view stays finished; the server record may not be.
        assert!(controller.view.active.as_ref().unwrap().is_finished);
        assert!(controller.session.api().updated.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_end_game_refused_when_finished() {
        let api = ScriptedApi::new();
        *api.chats.lock().unwrap() = vec![sample_chat(5, true)];
        let mut controller = controller_with(api);
        controller
            .load_past_games(&ChatListQuery::new())
            .await
            .unwrap();

        // Scripted end_game would fail with a 400; the guard never lets it run.
        controller.end_game("flu").await.unwrap();
        assert!(controller.session.api().game_result.lock().unwrap().is_none());
    }
}
