//! Cricket Score CLI
//!
//! Replays a JSON score sheet through the scoring engine and prints the
//! scorecards, or the career numbers of one player.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "cricket-score")]
#[command(about = "Score cricket matches from ball-by-ball sheets", long_about = None)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Replay a score sheet and print scorecards and result
    Score {
        /// Input score sheet (JSON)
        #[arg(long)]
        input: PathBuf,

        /// Scoring config (.yaml, .yml or .json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Replay a score sheet and print one player's career numbers
    Career {
        /// Input score sheet (JSON)
        #[arg(long)]
        input: PathBuf,

        /// Player id from the sheet
        #[arg(long)]
        player: u32,

        /// Scoring config (.yaml, .yml or .json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[cfg(feature = "cli")]
struct StderrLogger;

#[cfg(feature = "cli")]
impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

#[cfg(feature = "cli")]
static LOGGER: StderrLogger = StderrLogger;

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Score { input, config, json } => {
            let played = replay(&input, config.as_deref())?;
            let report = cricket_cli::match_report(&played)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }

            if !report.is_consistent() {
                anyhow::bail!("Stored scorecards differ from the delivery log");
            }
        }

        Commands::Career { input, player, config, json } => {
            let played = replay(&input, config.as_deref())?;
            let report = cricket_cli::career_report(&played, cricket_core::models::PlayerId(player))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn replay(input: &Path, config: Option<&Path>) -> Result<cricket_cli::PlayedMatch> {
    let config = match config {
        Some(path) => cricket_core::ScoringConfig::load(path)?,
        None => cricket_core::ScoringConfig::default(),
    };
    let sheet = cricket_cli::load(input)?;
    cricket_cli::play(&sheet, config)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("cricket-score CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
