use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use cardsight::storage::{FileStorage, StorageError};
use cardsight::{Trainer, TrainerError};
use clap::Parser;
use derive_more::From;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod page;
mod utils;

use app::App;
use config::{Config, ConfigError};

/// Name of the log file inside the data directory
const LOG_FILE: &str = "flashdeck.log";

/// Drill your playing-card recognition speed in the terminal
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory containing `settings.toml`
    #[arg(long, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Directory sessions, settings and logs are stored in
    #[arg(long, value_name = "DIR")]
    data: Option<PathBuf>,

    /// Log more (-v for info, -vv for debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Error, From)]
enum AppError {
    #[error("{0}")]
    Config(ConfigError),

    #[error("{0}")]
    Storage(StorageError),

    #[error("{0}")]
    Trainer(TrainerError),

    #[error("Failed to open log file '{}': {error}", path.display())]
    #[from(skip)]
    Log { path: PathBuf, error: std::io::Error },

    #[error("Terminal error: {0}")]
    Terminal(std::io::Error),
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("flashdeck: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::get(cli.config, cli.data)?;
    init_logging(&config.data_dir, cli.verbose)?;

    tracing::info!(
        config = %config.config_dir.display(),
        data = %config.data_dir.display(),
        "starting flashdeck"
    );

    let storage = FileStorage::new(&config.data_dir)?;
    let trainer = Trainer::load(storage, config.settings.engine.clone())?;

    App::new(config, trainer).run()?;

    tracing::info!("exiting");
    Ok(())
}

/// Logs go to a file, as the terminal belongs to the UI
fn init_logging(data_dir: &Path, verbose: u8) -> Result<(), AppError> {
    let path = data_dir.join(LOG_FILE);
    let file = fs::create_dir_all(data_dir)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(&path))
        .map_err(|error| AppError::Log {
            path: path.clone(),
            error,
        })?;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();

        let cli = Cli::parse_from(["flashdeck", "--data", "/tmp/deck", "-vv"]);
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/deck")));
        assert_eq!(cli.config, None);
        assert_eq!(cli.verbose, 2);
    }
}
