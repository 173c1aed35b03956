use std::fmt;

/// Default host the development backend listens on.
pub const DEFAULT_API_HOST: &str = "http://127.0.0.1:8000";

/// Builds full URLs for the fixed endpoint set, rooted at one host.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(host: impl Into<String>) -> Self {
        let mut base = host.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    pub fn host(&self) -> &str {
        &self.base
    }

    pub fn register(&self) -> String {
        format!("{}/api/users/users/register/", self.base)
    }

    pub fn login(&self) -> String {
        format!("{}/api/token/", self.base)
    }

    pub fn refresh(&self) -> String {
        format!("{}/api/token/update/", self.base)
    }

    pub fn my_profile(&self) -> String {
        format!("{}/api/users/profile/", self.base)
    }

    pub fn top_users(&self) -> String {
        format!("{}/api/users/top-users/", self.base)
    }

    /// Chat collection: list/search on GET, create on POST.
    pub fn chats(&self) -> String {
        format!("{}/api/core/chats/", self.base)
    }

    /// Single chat: fetch on GET, full update on PUT.
    pub fn chat(&self, id: i64) -> String {
        format!("{}/api/core/chats/{}/", self.base, id)
    }

    pub fn send_message(&self, chat_id: i64) -> String {
        format!("{}/api/core/chats/{}/send_message/", self.base, chat_id)
    }

    pub fn end_game(&self, chat_id: i64) -> String {
        format!("{}/api/core/chats/{}/end_game/", self.base, chat_id)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_HOST)
    }
}

impl fmt::Display for Endpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}
