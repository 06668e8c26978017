use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::controller::{GameController, SaveStatus};
use crate::db::Database;
use crate::game::{GameKind, GameSession};
use crate::replay::{replay, replay_live, Recording, ReplaySummary};
use crate::report::SessionReport;
use crate::settings::{GameOptions, Level, SettingsStore};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

const DEFAULT_DATA_DIR: &str = "physioplay-data";
const GUEST_PLAYER: &str = "guest";
const LIVE_LINGER: Duration = Duration::from_millis(300);

#[derive(Parser, Debug)]
#[command(name = "physioplay")]
#[command(about = "Motion-controlled physiotherapy mini-games driven by recorded pose streams")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Replay a recorded pose stream through one game
    Replay {
        /// star, balloon or obstacle
        kind: GameKind,

        /// JSON-lines pose recording
        recording: PathBuf,

        /// Player the report belongs to
        #[arg(long)]
        player: Option<String>,

        /// Feed frames in real time through the game controller
        #[arg(long)]
        live: bool,

        /// Save the finished report for the player
        #[arg(long, requires = "player")]
        save: bool,

        /// Seed for reproducible spawns
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List a player's saved sessions, newest first
    History {
        player: String,

        /// Print every results table instead of one line per session
        #[arg(long)]
        full: bool,
    },

    /// Print one saved session
    Show { id: String },

    /// Delete one saved session
    Delete { id: String },

    /// List known players
    Players {
        /// Register this player before listing
        #[arg(long)]
        add: Option<String>,
    },

    /// Print the stored game options, applying any changes
    Options {
        #[arg(long)]
        level: Option<Level>,

        /// Star game length in seconds (30, 60 or 90)
        #[arg(long = "duration")]
        duration_secs: Option<u32>,

        #[arg(long = "clouds")]
        cloud_count: Option<u32>,

        #[arg(long = "obstacles")]
        obstacle_count: Option<u32>,
    },
}

/// Paths and collaborators shared by every command.
pub struct AppContext {
    pub data_dir: PathBuf,
    pub db: Database,
    pub settings: SettingsStore,
}

impl AppContext {
    pub fn open() -> Result<Self> {
        let data_dir = std::env::var_os("PHYSIOPLAY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self::open_at(data_dir)
    }

    pub fn open_at(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        let db = Database::new(data_dir.join("physioplay.sqlite3"))?;
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        Ok(Self {
            data_dir,
            db,
            settings,
        })
    }
}

pub async fn execute(command: Command, ctx: &AppContext) -> Result<()> {
    match command {
        Command::Replay {
            kind,
            recording,
            player,
            live,
            save,
            seed,
        } => {
            let options = ctx.settings.game_options();
            let recording = Recording::load(&recording)?;
            log_info!(
                "replaying {} events ({} ms) into {}",
                recording.events.len(),
                recording.duration_ms(),
                kind.display_name()
            );

            let session = match seed {
                Some(seed) => GameSession::with_seed(kind, &options, seed)?,
                None => GameSession::new(kind, &options)?,
            };

            let (summary, controller) = if live {
                let controller = GameController::with_session(session, Some(ctx.db.clone()));
                let summary = replay_live(&controller, &recording, LIVE_LINGER).await?;
                (summary, controller)
            } else {
                let mut session = session;
                let summary = replay(&mut session, &recording, Instant::now());
                (summary, GameController::with_session(session, Some(ctx.db.clone())))
            };

            print_summary(kind, &summary, player.as_deref());

            if save {
                let player = player.as_deref().unwrap_or(GUEST_PLAYER);
                match controller.save(player).await? {
                    SaveStatus::Started(handle) => {
                        handle.await.context("save task panicked")?;
                        if !controller.is_saved() {
                            log_error!("session for {player} was not saved");
                            bail!("failed to save session for {player}");
                        }
                        println!("Saved session for {player}.");
                    }
                    SaveStatus::AlreadySaved => println!("Session already saved."),
                }
            }
            Ok(())
        }
        Command::History { player, full } => {
            if full {
                let sessions = ctx.db.load_sessions(&player).await?;
                if sessions.is_empty() {
                    println!("No saved sessions for {player}.");
                }
                for report in sessions {
                    print_report(&report);
                }
                return Ok(());
            }

            let summaries = ctx.db.list_report_summaries(&player).await?;
            if summaries.is_empty() {
                println!("No saved sessions for {player}.");
            }
            for summary in summaries {
                println!(
                    "{}  {}  {}  score {}",
                    summary.id,
                    summary.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    summary.game,
                    summary.score
                );
            }
            Ok(())
        }
        Command::Show { id } => {
            let Some(report) = ctx.db.get_report(&id).await? else {
                bail!("no saved session with id {id}");
            };
            println!("Player: {}", report.player_id);
            print_report(&report);
            Ok(())
        }
        Command::Delete { id } => {
            if !ctx.db.delete_report(&id).await? {
                bail!("no saved session with id {id}");
            }
            log_info!("deleted session {id}");
            println!("Deleted session {id}.");
            Ok(())
        }
        Command::Players { add } => {
            if let Some(player) = add {
                let player = ctx.db.register_player(&player).await?;
                println!("Registered {}.", player.id);
            }
            for player in ctx.db.list_players().await? {
                println!(
                    "{}  since {}",
                    player.id,
                    player.created_at.format("%Y-%m-%d")
                );
            }
            Ok(())
        }
        Command::Options {
            level,
            duration_secs,
            cloud_count,
            obstacle_count,
        } => {
            let current = ctx.settings.game_options();
            let updated = GameOptions {
                level: level.unwrap_or(current.level),
                duration_secs: duration_secs.unwrap_or(current.duration_secs),
                cloud_count: cloud_count.unwrap_or(current.cloud_count),
                obstacle_count: obstacle_count.unwrap_or(current.obstacle_count),
                canvas: current.canvas,
            };
            if updated != current {
                ctx.settings.update_game_options(updated.clone())?;
            }
            println!("{}", serde_json::to_string_pretty(&updated)?);
            Ok(())
        }
    }
}

fn print_report(report: &SessionReport) {
    println!(
        "{}  {}  score {}",
        report.timestamp.format("%Y-%m-%d %H:%M:%S"),
        report.game,
        report.score
    );
    println!("{}", report.table());
}

fn print_summary(kind: GameKind, summary: &ReplaySummary, player: Option<&str>) {
    println!(
        "{}: {} frames, ended {}",
        kind.display_name(),
        summary.frames,
        summary.status.as_str()
    );
    match &summary.outcome {
        Some(outcome) => {
            let report = SessionReport::assemble(player.unwrap_or(GUEST_PLAYER), outcome, Utc::now());
            println!("Score: {}", report.score);
            println!("{}", report.table());
        }
        None => println!("The recording ended before the game was over."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{GameDetails, GameOutcome};

    fn parse(line: &str) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("physioplay").chain(line.split_whitespace()))
            .map(|cli| cli.command)
    }

    fn temp_context() -> (PathBuf, AppContext) {
        let dir = std::env::temp_dir().join(format!("physioplay-cli-{}", uuid::Uuid::new_v4()));
        let ctx = AppContext::open_at(dir.clone()).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_parse_replay() {
        let command = parse("replay balloon run.jsonl --player ana --save --seed 4").unwrap();
        assert_eq!(
            command,
            Command::Replay {
                kind: GameKind::Balloon,
                recording: PathBuf::from("run.jsonl"),
                player: Some("ana".into()),
                live: false,
                save: true,
                seed: Some(4),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("replay star run.jsonl --save").is_err());
        assert!(parse("replay chess run.jsonl").is_err());
        assert!(parse("options --clouds many").is_err());
        assert!(parse("history").is_err());
        assert!(parse("show").is_err());
    }

    #[test]
    fn test_parse_options() {
        let command = parse("options --level high --obstacles 7").unwrap();
        assert_eq!(
            command,
            Command::Options {
                level: Some(Level::High),
                duration_secs: None,
                cloud_count: None,
                obstacle_count: Some(7),
            }
        );
    }

    #[tokio::test]
    async fn test_options_and_history_commands() {
        let (dir, ctx) = temp_context();

        execute(parse("options --clouds 3").unwrap(), &ctx).await.unwrap();
        assert_eq!(ctx.settings.game_options().cloud_count, 3);
        assert!(execute(parse("options --clouds 30").unwrap(), &ctx)
            .await
            .is_err());

        execute(parse("history nobody").unwrap(), &ctx).await.unwrap();
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_players_show_and_delete_commands() {
        let (dir, ctx) = temp_context();

        execute(parse("players --add ana").unwrap(), &ctx).await.unwrap();
        assert!(ctx.db.check_exists("ana").await.unwrap());

        let outcome = GameOutcome {
            kind: GameKind::Obstacle,
            score: 0,
            rows: Vec::new(),
            details: GameDetails::Obstacle {
                obstacle_count: 1,
                failed: 0,
            },
            advice: Vec::new(),
        };
        let report = SessionReport::assemble("ana", &outcome, Utc::now());
        ctx.db.save_report("ana", &report).await.unwrap();

        execute(parse("history ana").unwrap(), &ctx).await.unwrap();
        execute(parse("history ana --full").unwrap(), &ctx).await.unwrap();
        execute(parse(&format!("show {}", report.id)).unwrap(), &ctx)
            .await
            .unwrap();
        execute(parse(&format!("delete {}", report.id)).unwrap(), &ctx)
            .await
            .unwrap();
        assert!(ctx.db.get_report(&report.id).await.unwrap().is_none());
        assert!(execute(parse(&format!("delete {}", report.id)).unwrap(), &ctx)
            .await
            .is_err());
        assert!(execute(parse("show missing").unwrap(), &ctx).await.is_err());
        let _ = std::fs::remove_dir_all(dir);
    }
}
