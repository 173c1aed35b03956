//! Stateless text rendering of view state.
//!
//! Every function here derives its output purely from the structures it is
//! given; form state (inputs, selectors) lives with the caller.

use edumed_api::{Chat, Profile, Sender, TopUser};

use crate::view::{ActiveChat, TranscriptEntry};

/// Render the transcript, one bubble per line. Doctor lines read as "You",
/// pending sends are marked until the server confirms, and the end-of-game
/// result stands out from regular system messages.
pub fn transcript(chat: &ActiveChat) -> String {
    let mut out = String::new();
    for entry in &chat.entries {
        out.push_str(&transcript_line(entry));
        out.push('\n');
    }
    out
}

fn transcript_line(entry: &TranscriptEntry) -> String {
    if entry.is_result() {
        return format!("=== {} ===", entry.content());
    }
    match entry.sender() {
        Sender::Doctor if entry.is_pending() => format!("You: {} (sending...)", entry.content()),
        Sender::Doctor => format!("You: {}", entry.content()),
        Sender::Patient => format!("Patient: {}", entry.content()),
        Sender::System => format!("System: {}", entry.content()),
    }
}

/// Render the past-games side panel, newest first, with the active game
/// marked. Mirrors what the game list shows per entry: date, diagnosis and
/// score with their not-yet fallbacks.
pub fn side_panel(games: &[Chat], current_id: Option<i64>) -> String {
    let mut sorted: Vec<&Chat> = games.iter().collect();
    sorted.sort_by(|a, b| b.start_time.cmp(&a.start_time));

    let mut out = String::from("Past Simulations\n");
    for game in sorted {
        let marker = if current_id == Some(game.id) { "*" } else { " " };
        let diagnosis = game.diagnosis.as_deref().unwrap_or("Not completed");
        let score = game
            .score
            .map(|score| score.to_string())
            .unwrap_or_else(|| "No score".to_string());
        out.push_str(&format!(
            "{} [{}] {} | Diagnosis: {} | Score: {}\n",
            marker,
            game.id,
            game.start_time.format("%Y-%m-%d %H:%M"),
            diagnosis,
            score
        ));
    }
    out
}

/// Render the profile card with the literal points and rank the server sent.
pub fn profile_card(profile: &Profile) -> String {
    format!(
        "Username: {}\nEmail: {}\nPoints: {}\nRank: #{}\n",
        profile.user.username, profile.user.email, profile.points, profile.rank
    )
}

/// Render the leaderboard; the top three ranks get their medal markers.
pub fn leaderboard(top_users: &[TopUser]) -> String {
    if top_users.is_empty() {
        return "No top users data available.\n".to_string();
    }

    let mut out = String::from("Top Users\n");
    for top in top_users {
        let medal = match top.rank {
            1 => " [gold]",
            2 => " [silver]",
            3 => " [bronze]",
            _ => "",
        };
        out.push_str(&format!(
            "{:>3}. {} - {} points{}\n",
            top.rank, top.user.username, top.points, medal
        ));
    }
    out
}
