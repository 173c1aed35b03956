use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use edumed_client::{
    ApiClient, ChatListQuery, DEFAULT_API_HOST, EdumedApi, FileTokenStore, GameController,
    Session, SessionEvent, SortField, SortOrder,
};
use edumed_game::render;

type Cli = GameController<ApiClient, FileTokenStore>;
type CliSession = Session<ApiClient, FileTokenStore>;

fn print_help() {
    println!("Commands:");
    println!("  /new <easy|medium|hard>      - Start a new simulation");
    println!("  /games                       - List past simulations");
    println!("  /open <id>                   - Open a past simulation");
    println!("  /search <term>               - Filter past simulations");
    println!("  /sort <field> <asc|desc>     - Sort by start_time, end_time or score");
    println!("  /end <diagnosis>             - Submit your diagnosis");
    println!("  /profile                     - Show your profile");
    println!("  /top                         - Show the leaderboard");
    println!("  /logout                      - Log out");
    println!("  /quit                        - Exit");
    println!("  <message>                    - Ask the patient a question");
}

fn prompt_credentials() -> Result<(String, String)> {
    print!("Email: ");
    io::stdout().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email)?;

    print!("Password: ");
    io::stdout().flush()?;
    let mut password = String::new();
    io::stdin().read_line(&mut password)?;

    Ok((email.trim().to_string(), password.trim().to_string()))
}

fn show_active(cli: &Cli) {
    if let Some(active) = &cli.view.active {
        print!("{}", render::transcript(active));
    }
}

fn show_games(cli: &Cli) {
    print!(
        "{}",
        render::side_panel(&cli.view.past_games, cli.view.active_chat_id())
    );
}

async fn handle_line(
    line: &str,
    cli: &mut Cli,
    session: &Arc<CliSession>,
    query: &mut ChatListQuery,
) -> Result<bool> {
    if line.is_empty() {
        return Ok(true);
    }

    if let Some(rest) = line.strip_prefix('/') {
        let parts: Vec<&str> = rest.splitn(2, ' ').collect();
        let cmd = parts[0];
        let arg = parts.get(1).map(|s| s.trim());

        match cmd {
            "help" => print_help(),
            "new" => {
                let difficulty = arg.unwrap_or("easy").parse().unwrap_or_default();
                match cli.create_new_chat(difficulty).await {
                    Ok(()) => show_active(cli),
                    Err(e) => println!("Error creating new game: {}", e),
                }
            }
            "games" => show_games(cli),
            "open" => match arg.and_then(|a| a.parse::<i64>().ok()) {
                Some(id) => match cli.load_game(id).await {
                    Ok(()) => show_active(cli),
                    Err(e) => println!("Error loading game: {}", e),
                },
                None => println!("Usage: /open <id>"),
            },
            "search" => {
                *query = query.clone().search(arg.unwrap_or("").to_string());
                match cli.load_past_games(query).await {
                    Ok(()) => show_games(cli),
                    Err(e) => println!("Error loading past games: {}", e),
                }
            }
            "sort" => {
                let args: Vec<&str> = arg.unwrap_or("").split_whitespace().collect();
                let field = args
                    .first()
                    .and_then(|f| f.parse::<SortField>().ok())
                    .unwrap_or_default();
                let order = match args.get(1) {
                    Some(&"asc") => SortOrder::Ascending,
                    _ => SortOrder::Descending,
                };
                *query = query.clone().sort(field, order);
                match cli.load_past_games(query).await {
                    Ok(()) => show_games(cli),
                    Err(e) => println!("Error loading past games: {}", e),
                }
            }
            "end" => match arg {
                Some(diagnosis) => match cli.end_game(diagnosis).await {
                    Ok(()) => show_active(cli),
                    Err(e) => println!("Error ending game: {}", e),
                },
                None => println!("Usage: /end <diagnosis>"),
            },
            "profile" => match session.profile().await {
                Ok(profile) => print!("{}", render::profile_card(&profile)),
                Err(e) => println!("Error fetching profile: {}", e),
            },
            "top" => match session.api().top_users().await {
                Ok(top) => print!("{}", render::leaderboard(&top)),
                Err(e) => println!("Error fetching top users: {}", e),
            },
            "logout" => {
                session.logout();
                cli.reset();
                return Ok(false);
            }
            "quit" | "exit" => return Ok(false),
            _ => println!("Unknown command: /{}. Type /help for commands.", cmd),
        }
    } else {
        match cli.send_message(line).await {
            Ok(()) => show_active(cli),
            Err(e) => println!("Error sending message: {}", e),
        }
    }

    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("EduMed Virtual Doctor's Office");
    println!("==============================");

    let host = std::env::var("EDUMED_API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string());
    let session = Arc::new(Session::new(
        ApiClient::with_host(host),
        FileTokenStore::new()?,
    ));

    // Other views resynchronize off the login-state broadcast.
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::LoggedIn => println!("[session] logged in"),
                SessionEvent::LoggedOut => println!("[session] logged out"),
            }
        }
    });

    if !session.is_authenticated() {
        let (email, password) = prompt_credentials()?;
        session.login(&email, &password).await?;
    }

    // Verify the stored token before trusting it; a dead session falls back
    // to a fresh login.
    let profile = match session.verify().await {
        Ok(profile) => profile,
        Err(e) => {
            println!("Authentication error: {}", e);
            let (email, password) = prompt_credentials()?;
            session.login(&email, &password).await?;
            session.verify().await?
        }
    };
    print!("{}", render::profile_card(&profile));

    let mut cli = GameController::new(session.clone());
    let mut query = ChatListQuery::new();
    cli.load_past_games(&query).await?;
    show_games(&cli);
    show_active(&cli);
    println!("Type /help for commands");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        if !handle_line(line.trim(), &mut cli, &session, &mut query).await? {
            break;
        }
    }

    Ok(())
}
