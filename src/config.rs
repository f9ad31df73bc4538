//! Configuration module.
//!
//! The bootstrap forwards its command line untouched to the updater, so its own
//! settings come from environment variables only. They are still declared with
//! `clap` and parsed from the program name alone.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

#[cfg(windows)]
const DEFAULT_UPDATER_ENTRY: &str = "Update.exe";
#[cfg(not(windows))]
const DEFAULT_UPDATER_ENTRY: &str = "Update";

/// Log file the updater writes, as shown to the user on failure.
#[cfg(windows)]
fn default_updater_log() -> String {
    r"%localappdata%\Update.log".to_string()
}

#[cfg(not(windows))]
fn default_updater_log() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("Update.log").display().to_string())
        .unwrap_or_else(|| "Update.log".to_string())
}

/// Self-extracting installer bootstrap.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "SETUP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Directory receiving the extracted updater
    #[arg(long, env = "SETUP_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Name of the updater entry inside the embedded package
    #[arg(long, env = "SETUP_UPDATER_ENTRY", default_value = DEFAULT_UPDATER_ENTRY)]
    pub updater_entry: String,

    /// Log file named to the user when the updater fails
    #[arg(long, env = "SETUP_UPDATER_LOG", default_value_t = default_updater_log())]
    pub updater_log: String,
}

impl Config {
    /// Reads the configuration from the environment, ignoring the process
    /// arguments.
    pub fn from_env() -> Result<Self, clap::Error> {
        let program = std::env::args_os()
            .next()
            .unwrap_or_else(|| OsString::from("setup"));
        Self::try_parse_from([program])
    }

    /// Directory receiving the extracted updater.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            temp_dir: None,
            updater_entry: DEFAULT_UPDATER_ENTRY.to_string(),
            updater_log: default_updater_log(),
        }
    }
}
