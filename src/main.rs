//! # Speakercast CLI (`speakercast`)
//!
//! Operates the speaker index: initialize the database, refresh it from
//! the catalog, and query speakers, talks, and ids.
//!
//! ## Usage
//!
//! ```bash
//! speakercast --config ./config/speakercast.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `speakercast init` | Create the SQLite database and run schema migrations |
//! | `speakercast update [--force]` | Rebuild if the catalog version changed |
//! | `speakercast watch --interval-secs N` | Re-run `update` on a fixed interval |
//! | `speakercast speakers` | List speakers by talk count |
//! | `speakercast talks <SPEAKER>...` | List talks for one or more speakers |
//! | `speakercast id <SPEAKER>...` | Get or create the id for a speaker set |
//! | `speakercast resolve <ID>` | Show the speakers behind an id |
//! | `speakercast stats` | Show what the database holds |
//! | `speakercast ids clear` | Remove every id mapping |
//!
//! Logs go to stderr and honour `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use speakercast::catalog::build_catalog;
use speakercast::config::{load_config, Config};
use speakercast::sqlite_store::SqliteStore;
use speakercast::update::RefreshOutcome;
use speakercast::SpeakerIndex;

/// Speakercast CLI: a speaker-indexed store of conference talks.
#[derive(Parser)]
#[command(name = "speakercast", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/speakercast.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations. Safe to run repeatedly.
    Init,

    /// Refresh the speaker index if the catalog version changed.
    Update {
        /// Rebuild even if the stored version matches the catalog.
        #[arg(long)]
        force: bool,
    },

    /// Refresh on a fixed interval until interrupted.
    Watch {
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
    },

    /// List speakers with their talk counts, most talks first.
    Speakers {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List the talks of one or more speakers, oldest first.
    Talks {
        #[arg(required = true)]
        speakers: Vec<String>,
    },

    /// Print the id for a set of speakers, creating it if needed.
    Id {
        #[arg(required = true)]
        speakers: Vec<String>,
    },

    /// Print the speakers registered under an id.
    Resolve { id: String },

    /// Show database counts and the stored catalog version.
    Stats,

    /// Manage id mappings.
    Ids {
        #[command(subcommand)]
        action: IdsAction,
    },
}

#[derive(Subcommand)]
enum IdsAction {
    /// Remove every id mapping.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let store = Arc::new(SqliteStore::open(&config).await?);
    let result = run(&config, cli.command, store.clone()).await;
    store.close().await;
    result
}

async fn run(config: &Config, command: Commands, store: Arc<SqliteStore>) -> Result<()> {
    let catalog = build_catalog(config)?;
    let index = SpeakerIndex::from_config(config, store, catalog);

    match command {
        Commands::Init => {
            println!("initialized {}", config.db.path.display());
            Ok(())
        }
        Commands::Update { force } => update(&index, force).await,
        Commands::Watch { interval_secs } => {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            loop {
                ticker.tick().await;
                if let Err(e) = update(&index, false).await {
                    warn!(error = %e, "scheduled update failed");
                }
            }
        }
        Commands::Speakers { limit } => {
            let counts = index.all_speakers_and_counts().await?;
            let limit = limit.unwrap_or(counts.len());
            for row in counts.iter().take(limit) {
                println!("{:>5}  {}", row.count, row.speaker);
            }
            Ok(())
        }
        Commands::Talks { speakers } => {
            let mut talks = index.talks(&speakers).await?;
            if talks.is_empty() {
                println!("not found");
                return Ok(());
            }
            talks.sort_by_key(|t| t.scheduled_time);
            for talk in &talks {
                println!(
                    "{}  {:<28} {:<24} {}",
                    talk.scheduled_time.format("%Y-%m-%d %H:%M"),
                    talk.session.label(),
                    talk.speaker,
                    talk.title
                );
            }
            Ok(())
        }
        Commands::Id { speakers } => {
            println!("{}", index.generate_id(&speakers).await?);
            Ok(())
        }
        Commands::Resolve { id } => {
            match index.speakers(&id).await? {
                Some(speakers) => {
                    for speaker in speakers {
                        println!("{}", speaker);
                    }
                }
                None => println!("not found"),
            }
            Ok(())
        }
        Commands::Stats => {
            let stats = index.stats().await?;
            println!("  Database:    {}", config.db.path.display());
            println!("  Version:     {}", stats.version.as_deref().unwrap_or("never built"));
            println!("  Speakers:    {}", stats.speakers);
            println!("  Talks:       {}", stats.talks);
            println!("  Id mappings: {}", stats.id_mappings);
            Ok(())
        }
        Commands::Ids {
            action: IdsAction::Clear,
        } => {
            let removed = index.clear_ids().await?;
            println!("removed {} id mappings", removed);
            Ok(())
        }
    }
}

async fn update(index: &SpeakerIndex, force: bool) -> Result<()> {
    match index.update_database(force).await {
        Ok(RefreshOutcome::UpToDate { version }) => {
            println!("up to date (version {})", version);
            Ok(())
        }
        Ok(RefreshOutcome::Rebuilt { version, summary }) => {
            println!("rebuilt (version {})", version);
            println!(
                "  periods: {} ({} failed)",
                summary.periods, summary.periods_failed
            );
            println!("  talks: {}", summary.talks_kept);
            if summary.dropped_incomplete > 0 {
                println!("  incomplete records skipped: {}", summary.dropped_incomplete);
            }
            println!("  speakers: {}", summary.speakers);
            println!("ok");
            Ok(())
        }
        Err(e) => {
            println!("update failed, previous data still served");
            Err(e.into())
        }
    }
}
