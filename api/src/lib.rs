use thiserror::Error;

pub mod chat;
pub mod endpoints;
pub mod user;

pub use chat::{
    Chat, ChatListQuery, Difficulty, EndGameRequest, GameResult, Message, NewChatRequest,
    SendMessageRequest, Sender, SortField, SortOrder,
};
pub use endpoints::{DEFAULT_API_HOST, Endpoints};
pub use user::{
    AccessToken, LoginRequest, Profile, RefreshRequest, RegisterRequest, TokenPair, TopUser, User,
};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),
}
