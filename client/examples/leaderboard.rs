use anyhow::Result;
use edumed_client::{ApiClient, DEFAULT_API_HOST, EdumedApi};
use edumed_game::render;

#[tokio::main]
async fn main() -> Result<()> {
    let host = std::env::var("EDUMED_API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string());
    let api = ApiClient::with_host(host);

    // The leaderboard is public, no login required.
    let top_users = api.top_users().await?;
    print!("{}", render::leaderboard(&top_users));

    Ok(())
}
