//! CLI command implementations.
//!
//! Each subcommand opens the engine against the durable stores, performs
//! one operation, and prints a human-readable result. All user-facing
//! wording lives here; the engine reports outcomes as values.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `observe` | Record a link share and report whether it was a repost |
//! | `leaderboard` | Show the top reposters |
//! | `count` | Show one identity's repost count and rank |
//! | `merge` | Alias a name to a primary identity and merge counts |
//! | `unmerge` | Remove an alias mapping (counts stay with the primary) |
//! | `aliases` | List alias mappings |
//! | `purge` | Remove one identity's count, or all repost data |
//! | `status` | Show store statistics |

use crate::models::{ObserveOutcome, PurgeTarget};
use crate::services::RepostEngine;
use crate::{EngineConfig, current_timestamp};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};

/// Dejavu - repost detection and identity resolution for chat channels.
#[derive(Parser)]
#[command(name = "dejavu")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Data directory override.
    #[arg(long, global = true, env = "DEJAVU_DATA_DIR")]
    pub data_dir: Option<String>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Record a link share and report whether it was a repost.
    Observe {
        /// The shared URL.
        url: String,

        /// The identity that shared it.
        identity: String,

        /// Timestamp of the share (Unix seconds; defaults to now).
        #[arg(long)]
        at: Option<u64>,
    },

    /// Show the top reposters.
    Leaderboard {
        /// Maximum number of entries.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show an identity's repost count and rank.
    Count {
        /// The identity to look up.
        identity: String,
    },

    /// Alias a name to a primary identity and merge their counts.
    Merge {
        /// The primary identity to keep.
        primary: String,

        /// The name that becomes an alias of the primary.
        alias: String,
    },

    /// Remove an alias mapping. Counts stay with the primary.
    Unmerge {
        /// The alias to remove.
        alias: String,
    },

    /// List alias mappings.
    Aliases,

    /// Purge one identity's repost count, or `all` repost data.
    Purge {
        /// An identity name, or `all`.
        target: String,
    },

    /// Show store statistics.
    Status,
}

/// Runs a parsed command against the engine. Returns the process exit code.
///
/// # Errors
///
/// Returns an error if the engine cannot be opened; per-command failures
/// (rejected merges, unknown identities) are printed and reported through
/// the exit code instead.
pub fn run(cli: &Cli) -> anyhow::Result<std::process::ExitCode> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(std::path::Path::new(path))?,
        None => EngineConfig::load_default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config = config.with_data_dir(data_dir);
    }

    let engine = RepostEngine::open(config)?;
    Ok(dispatch(&engine, &cli.command))
}

/// Formats an elapsed duration as `XhYm`.
fn format_elapsed(elapsed_secs: u64) -> String {
    let hours = elapsed_secs / 3600;
    let minutes = (elapsed_secs % 3600) / 60;
    format!("{hours}h {minutes}m")
}

/// Renders a Unix timestamp as a UTC wall-clock time.
fn format_timestamp(ts: u64) -> String {
    let ts = i64::try_from(ts).unwrap_or(i64::MAX);
    Utc.timestamp_opt(ts, 0).single().map_or_else(
        || format!("@{ts}"),
        |dt| dt.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

#[allow(clippy::print_stdout)]
fn dispatch(engine: &RepostEngine, command: &Commands) -> std::process::ExitCode {
    use std::process::ExitCode;

    match command {
        Commands::Observe { url, identity, at } => {
            let now = at.unwrap_or_else(current_timestamp);
            match engine.observe(url, identity, now) {
                ObserveOutcome::Fresh => println!("fresh link"),
                ObserveOutcome::SamePoster => println!("same poster, window extended"),
                ObserveOutcome::Repost {
                    original_poster,
                    posted_at,
                    elapsed_secs,
                    count,
                } => {
                    println!(
                        "repost! originally posted by {original_poster} {} ago ({}); \
                         repost count for {identity} is now {count}",
                        format_elapsed(elapsed_secs),
                        format_timestamp(posted_at)
                    );
                }
            }
            ExitCode::SUCCESS
        }

        Commands::Leaderboard { limit } => {
            let board = engine.leaderboard(*limit);
            if board.is_empty() {
                println!("no reposts have been recorded yet");
            } else {
                for (rank, (identity, count)) in board.iter().enumerate() {
                    println!("{:>3}. {identity}: {count}", rank + 1);
                }
            }
            ExitCode::SUCCESS
        }

        Commands::Count { identity } => {
            match engine.repost_count_for(identity) {
                (0, _) => println!("{identity} has not been caught reposting"),
                (count, Some(rank)) => {
                    let plural = if count == 1 { "" } else { "s" };
                    println!("{identity} has committed {count} repost{plural}, ranked {rank}");
                }
                (count, None) => println!("{identity} has committed {count} reposts"),
            }
            ExitCode::SUCCESS
        }

        Commands::Merge { primary, alias } => match engine.merge_alias(primary, alias) {
            Ok(()) => {
                println!("aliased {alias} -> {primary} and merged counts");
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("merge rejected: {e}");
                ExitCode::FAILURE
            }
        },

        Commands::Unmerge { alias } => match engine.unmerge_alias(alias) {
            Ok(()) => {
                println!("removed alias for {alias}; counts stay with the primary");
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("unmerge rejected: {e}");
                ExitCode::FAILURE
            }
        },

        Commands::Aliases => {
            let aliases = engine.aliases();
            if aliases.is_empty() {
                println!("no aliases configured");
            } else {
                for (alias, primary) in aliases {
                    println!("{alias} -> {primary}");
                }
            }
            ExitCode::SUCCESS
        }

        Commands::Purge { target } => match engine.purge(&PurgeTarget::parse(target)) {
            Ok(()) => {
                if PurgeTarget::parse(target) == PurgeTarget::All {
                    println!("all repost data has been purged");
                } else {
                    println!("repost count for {target} has been purged");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("purge rejected: {e}");
                ExitCode::FAILURE
            }
        },

        Commands::Status => {
            let stats = engine.stats();
            println!("tracked links:      {}", stats.tracked_links);
            println!("counted identities: {}", stats.counted_identities);
            println!("alias edges:        {}", stats.alias_edges);
            println!("total reposts:      {}", stats.total_reposts);
            ExitCode::SUCCESS
        }
    }
}
