use thiserror::Error;

/// Failure taxonomy of the client.
///
/// Per-action failures are surfaced to the caller and leave the view
/// interactive; only [`Error::SessionExpired`] forces a fresh login.
#[derive(Error, Debug)]
pub enum Error {
    /// No token in the store; the caller must log in first.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The token was rejected and the refresh exchange could not recover.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Non-2xx response.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a usable response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("Unexpected response payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// Token persistence failed.
    #[error("Token store error: {0}")]
    Store(#[from] std::io::Error),
}

impl Error {
    /// Whether this is the 401 that should enter the refresh path.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
