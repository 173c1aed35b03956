use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Doctor,
    Patient,
    System,
}

/// A single transcript message as the server serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,

    /// Set locally on the end-of-game summary message. The server never
    /// sends this field, so it must default when absent.
    #[serde(default, rename = "isResultMessage")]
    pub is_result_message: bool,
}

/// Case difficulty selected at game creation, interpreted entirely server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ParseError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// One diagnosis session, as `GET /api/core/chats/` serializes it.
///
/// `doctor`, `patient_data`, `end_time` and `difficulty` are not shown by
/// the views but ride along so a full record can be PUT back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub doctor: Option<i64>,
    #[serde(default)]
    pub patient_data: Option<serde_json::Value>,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub is_finished: bool,
    pub diagnosis: Option<String>,
    pub score: Option<i64>,
    pub feedback: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Body of `POST /api/core/chats/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChatRequest {
    pub difficulty: Difficulty,
}

/// Body of `POST /api/core/chats/{id}/send_message/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Body of `POST /api/core/chats/{id}/end_game/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndGameRequest {
    pub answer: String,
}

/// Response of the end-game evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub score: i64,
    pub feedback: String,
}

/// Sortable columns of the chat list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    StartTime,
    EndTime,
    Score,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartTime => "start_time",
            Self::EndTime => "end_time",
            Self::Score => "score",
        }
    }
}

impl FromStr for SortField {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start_time" => Ok(Self::StartTime),
            "end_time" => Ok(Self::EndTime),
            "score" => Ok(Self::Score),
            other => Err(ParseError::UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn toggle(&self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Search/ordering parameters of `GET /api/core/chats/`.
///
/// The server speaks Django's ordering convention: a leading `-` marks a
/// descending sort. The default matches the server default, newest first.
#[derive(Debug, Clone, Default)]
pub struct ChatListQuery {
    pub search: Option<String>,
    pub field: SortField,
    pub order: SortOrder,
}

impl ChatListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.field = field;
        self.order = order;
        self
    }

    pub fn ordering(&self) -> String {
        match self.order {
            SortOrder::Ascending => self.field.as_str().to_string(),
            SortOrder::Descending => format!("-{}", self.field.as_str()),
        }
    }

    /// Query pairs in the form reqwest's `query()` accepts.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs.push(("ordering", self.ordering()));
        pairs
    }
}
