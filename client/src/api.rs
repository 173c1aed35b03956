use edumed_api::{
    AccessToken, Chat, ChatListQuery, EndGameRequest, Endpoints, GameResult, LoginRequest,
    Message, NewChatRequest, Profile, RefreshRequest, RegisterRequest, SendMessageRequest,
    TokenPair, TopUser, User,
};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// The fixed endpoint surface of the EduMed API.
///
/// `ApiClient` is the HTTP implementation; session and controller code is
/// generic over this trait so it can be exercised against a scripted fake.
/// Every method is a single attempt: no retry, no timeout, no backoff.
pub trait EdumedApi: Send + Sync {
    fn register(&self, request: &RegisterRequest) -> impl Future<Output = Result<User>> + Send;
    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<TokenPair>> + Send;
    fn refresh(&self, request: &RefreshRequest) -> impl Future<Output = Result<AccessToken>> + Send;
    fn my_profile(&self, token: &str) -> impl Future<Output = Result<Profile>> + Send;
    fn top_users(&self) -> impl Future<Output = Result<Vec<TopUser>>> + Send;
    fn list_chats(
        &self,
        token: &str,
        query: &ChatListQuery,
    ) -> impl Future<Output = Result<Vec<Chat>>> + Send;
    fn get_chat(&self, token: &str, id: i64) -> impl Future<Output = Result<Chat>> + Send;
    fn create_chat(
        &self,
        token: &str,
        request: &NewChatRequest,
    ) -> impl Future<Output = Result<Chat>> + Send;
    fn send_message(
        &self,
        token: &str,
        chat_id: i64,
        request: &SendMessageRequest,
    ) -> impl Future<Output = Result<Message>> + Send;
    fn end_game(
        &self,
        token: &str,
        chat_id: i64,
        request: &EndGameRequest,
    ) -> impl Future<Output = Result<GameResult>> + Send;
    fn update_chat(&self, token: &str, chat: &Chat) -> impl Future<Output = Result<Chat>> + Send;
}

/// HTTP implementation of [`EdumedApi`] over one reqwest client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_host(host: impl Into<String>) -> Self {
        Self::with_endpoints(Endpoints::new(host))
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get<T: DeserializeOwned>(&self, url: String, token: Option<&str>) -> Result<T> {
        tracing::debug!(%url, "GET");
        let mut request = self.http.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        decode(request.send().await?).await
    }

    async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        url: String,
        token: Option<&str>,
        body: &B,
    ) -> Result<T> {
        tracing::debug!(%url, "POST");
        let mut request = self.http.post(&url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        decode(request.send().await?).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EdumedApi for ApiClient {
    async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.post(self.endpoints.register(), None, request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenPair> {
        self.post(self.endpoints.login(), None, request).await
    }

    async fn refresh(&self, request: &RefreshRequest) -> Result<AccessToken> {
        self.post(self.endpoints.refresh(), None, request).await
    }

    async fn my_profile(&self, token: &str) -> Result<Profile> {
        self.get(self.endpoints.my_profile(), Some(token)).await
    }

    async fn top_users(&self) -> Result<Vec<TopUser>> {
        self.get(self.endpoints.top_users(), None).await
    }

    async fn list_chats(&self, token: &str, query: &ChatListQuery) -> Result<Vec<Chat>> {
        let url = self.endpoints.chats();
        tracing::debug!(%url, ordering = %query.ordering(), "GET chat list");
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&query.to_pairs())
            .send()
            .await?;
        decode(response).await
    }

    async fn get_chat(&self, token: &str, id: i64) -> Result<Chat> {
        self.get(self.endpoints.chat(id), Some(token)).await
    }

    async fn create_chat(&self, token: &str, request: &NewChatRequest) -> Result<Chat> {
        self.post(self.endpoints.chats(), Some(token), request).await
    }

    async fn send_message(
        &self,
        token: &str,
        chat_id: i64,
        request: &SendMessageRequest,
    ) -> Result<Message> {
        self.post(self.endpoints.send_message(chat_id), Some(token), request)
            .await
    }

    async fn end_game(
        &self,
        token: &str,
        chat_id: i64,
        request: &EndGameRequest,
    ) -> Result<GameResult> {
        self.post(self.endpoints.end_game(chat_id), Some(token), request)
            .await
    }

    async fn update_chat(&self, token: &str, chat: &Chat) -> Result<Chat> {
        let url = self.endpoints.chat(chat.id);
        tracing::debug!(%url, "PUT");
        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .json(chat)
            .send()
            .await?;
        decode(response).await
    }
}

/// Check the status, then decode the body. The body is read as text first
/// so a non-2xx reply can carry the server's error message.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Request failed");
        return Err(Error::Http {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(Error::Decode)
}
