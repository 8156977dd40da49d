use std::path::{Path, PathBuf};

use cardsight::Configuration;
use derive_more::From;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod theme;

/// Name of the settings file inside the config directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Prefix of environment variables that override settings
pub const ENV_PREFIX: &str = "FLASHDECK_";

const SETTINGS_HEADER: &str = "\
# FlashDeck settings
#
# Every value below is the default. Remove a line to keep following the default,
# or override any value with an environment variable, e.g.
# FLASHDECK_ENGINE__TRANSITION_DELAY=150
";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub theme: theme::Theme,
    pub engine: Configuration,
    /// Where sessions and settings are stored. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Where exports are written. Defaults to `exports` inside the data directory.
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, From, Error)]
pub enum ConfigError {
    #[error(
        "Failed to get configuration directory. Please specify the location using the `--config <path>` flag"
    )]
    NoDirectory,

    #[error("Failed to create config directory: {0}")]
    CreateDirectory(std::io::Error),

    #[error("Failed to write default settings: {0}")]
    #[from(skip)]
    WriteDefaults(std::io::Error),

    #[error("Failed to encode default settings: {0}")]
    Encode(toml::ser::Error),

    #[error("Failed to parse config: {0}")]
    Parse(Box<figment::Error>),
}

#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Config {
    /// Loads the configuration
    ///
    /// Layers, lowest first: defaults, `settings.toml`, `FLASHDECK_` variables,
    /// and finally the `--data` override.
    pub fn get(
        config_override: Option<PathBuf>,
        data_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("com", "FlashDeck", "FlashDeck");

        // Check for toml file location
        let config_dir = config_override
            .or_else(|| dirs.as_ref().map(|dirs| dirs.config_dir().to_path_buf()))
            .ok_or(ConfigError::NoDirectory)?;

        // Ensure path exists
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)?;
        }

        let settings_toml = config_dir.join(SETTINGS_FILE);
        if !settings_toml.exists() {
            write_defaults(&settings_toml)?;
        }

        let mut settings = Self::figment(&settings_toml)
            .extract::<Settings>()
            .map_err(Box::new)?;
        settings.theme.detect_terminal_colors();

        let data_dir = data_override
            .or_else(|| settings.data_dir.clone())
            .or_else(|| dirs.as_ref().map(|dirs| dirs.data_dir().to_path_buf()))
            .unwrap_or_else(|| config_dir.join("data"));

        let export_dir = settings
            .export_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("exports"));

        Ok(Self {
            settings,
            config_dir,
            data_dir,
            export_dir,
        })
    }

    fn figment(settings_toml: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(settings_toml))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

/// Writes a commented settings file holding every default
fn write_defaults(path: &Path) -> Result<(), ConfigError> {
    let body = toml::to_string_pretty(&Settings::default())?;
    std::fs::write(path, format!("{SETTINGS_HEADER}\n{body}")).map_err(ConfigError::WriteDefaults)
}
