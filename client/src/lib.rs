//! Async client for the EduMed virtual-patient diagnosis simulator.
//!
//! The remote API owns every piece of business logic; this crate renders it
//! reachable: authorized requests against the fixed endpoint set
//! ([`ApiClient`]), durable token caching ([`TokenStore`]), the
//! login/refresh/logout lifecycle ([`Session`]) and the game controller
//! ([`GameController`]) driving `edumed-game` view state.

pub mod api;
pub mod controller;
pub mod error;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, EdumedApi};
pub use controller::GameController;
pub use error::{Error, Result};
pub use session::{Session, SessionEvent, SessionState};
pub use store::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenStore};

pub use edumed_api::{ChatListQuery, Difficulty, Endpoints, SortField, SortOrder, DEFAULT_API_HOST};
