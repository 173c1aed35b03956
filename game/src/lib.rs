//! View-state tracking and rendering for the EduMed diagnosis simulator.
//!
//! # Overview
//!
//! `edumed-game` sits between `edumed-api` (wire format) and whatever drives
//! the UI:
//!
//! ```text
//! edumed-api (wire format)
//!        │
//!        ▼
//! edumed-game (view state + rendering) ← THIS CRATE
//!        │
//!        └─> edumed-client (controller wiring state to the network)
//! ```
//!
//! # Main Types
//!
//! - [`GameView`] - past-game list plus the active transcript, updated from
//!   server responses
//! - [`ActiveChat`] - the chat on screen, with pending/confirmed entries
//! - [`TranscriptEntry`] - one transcript line, optimistic sends tagged
//!   [`TranscriptEntry::Pending`] until the server replies
//! - [`render`] - stateless text rendering of transcript, side panel,
//!   profile and leaderboard
//!
//! # Example Usage
//!
//! ```ignore
//! use edumed_game::GameView;
//!
//! let mut view = GameView::new();
//! view.apply_past_games(chats, Utc::now());
//!
//! if let Some(local_id) = view.begin_send("Where does it hurt?", Utc::now()) {
//!     // ... POST the message, then:
//!     view.confirm_send(local_id, reply);
//! }
//! ```

pub mod render;
pub mod view;

pub use view::{ActiveChat, GameView, PendingMessage, TranscriptEntry, PLACEHOLDER_INVITE};
