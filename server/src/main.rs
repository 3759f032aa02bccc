use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use explorer_server::config::ExplorerConfig;
use explorer_server::explorer::PlayerStatisticsRequest;
use explorer_server::follow::{FollowOutcome, FollowPositionRequest, NewExplorerGame};
use explorer_server::ingest::GameRecord;
use explorer_server::persistence::sqlite::Database;
use explorer_server::SqliteExplorer;

#[derive(Parser)]
#[command(name = "explorer-server", version, about = "Player position explorer")]
struct Cli {
    /// Database file (overrides EXPLORER_DATA_DIR)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Per-move statistics for a player at a position
    Stats {
        /// JSON request, or `-` to read it from stdin
        request: String,
    },
    /// Follow or unfollow a position
    Follow {
        /// Follower id
        user: String,
        /// JSON `{ fen, unfollow, metadata? }`, or `-` for stdin
        request: String,
    },
    /// List the followers of a position
    Followers { fen: String },
    /// List the positions a user follows
    Following { user: String },
    /// Followers of a position that want to hear about a new game
    Notify {
        fen: String,
        /// JSON game description, or `-` for stdin
        game: String,
    },
    /// Index games from a JSON lines file (`-` for stdin)
    Import { path: PathBuf },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportSummary {
    imported: u64,
    rejected: u64,
    total_games: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with span durations
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ExplorerConfig::from_env(cli.db.as_deref());
    tracing::info!(
        database = %config.database_path.display(),
        max_connections = config.max_connections,
        "Opening explorer database"
    );

    let db = Database::open(&config.database_path, config.max_connections)
        .await
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    let explorer = SqliteExplorer::sqlite(&db);

    match cli.command {
        Command::Stats { request } => {
            let request: PlayerStatisticsRequest =
                serde_json::from_str(&read_arg(&request).await?).context("parsing request")?;
            let rows = explorer.player_statistics(&request).await?;
            print_json(&rows)?;
        }
        Command::Follow { user, request } => {
            let request: FollowPositionRequest =
                serde_json::from_str(&read_arg(&request).await?).context("parsing request")?;
            match explorer.follow_position(&user, request).await? {
                FollowOutcome::Followed(record) => print_json(&record)?,
                FollowOutcome::Unfollowed { position, existed } => print_json(&serde_json::json!({
                    "unfollowed": position,
                    "existed": existed,
                }))?,
            }
        }
        Command::Followers { fen } => {
            print_json(&explorer.followers(&fen).await?)?;
        }
        Command::Following { user } => {
            print_json(&explorer.followed_positions(&user).await?)?;
        }
        Command::Notify { fen, game } => {
            let game: NewExplorerGame =
                serde_json::from_str(&read_arg(&game).await?).context("parsing game")?;
            print_json(&explorer.notification_recipients(&fen, &game).await?)?;
        }
        Command::Import { path } => {
            let input = if path.as_os_str() == "-" {
                read_stdin().await?
            } else {
                tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?
            };

            let mut summary = ImportSummary {
                imported: 0,
                rejected: 0,
                total_games: 0,
            };
            for (line_no, line) in input.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let mut record: GameRecord = match serde_json::from_str(line) {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!(line = line_no + 1, error = %e, "Skipping unparseable game");
                        summary.rejected += 1;
                        continue;
                    }
                };
                if record.game_id.trim().is_empty() {
                    record.game_id = uuid::Uuid::new_v4().to_string();
                }
                match explorer.ingest_game(record).await {
                    Ok(_) => summary.imported += 1,
                    Err(e @ explorer_server::ExplorerError::InvalidGame { .. }) => {
                        tracing::warn!(line = line_no + 1, error = %e, "Skipping invalid game");
                        summary.rejected += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            summary.total_games = explorer.game_count().await?;
            tracing::info!(
                imported = summary.imported,
                rejected = summary.rejected,
                "Import complete"
            );
            print_json(&summary)?;
        }
    }

    Ok(())
}

/// An inline JSON argument, or stdin when the argument is `-`.
async fn read_arg(arg: &str) -> anyhow::Result<String> {
    if arg == "-" {
        read_stdin().await
    } else {
        Ok(arg.to_string())
    }
}

async fn read_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("reading stdin")?;
    Ok(buf)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
