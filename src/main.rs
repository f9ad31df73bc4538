//! Entry point for the setup bootstrap.
//!
//! This file handles high-level application flow:
//! 1. Restrict the DLL search path before anything else loads.
//! 2. Read configuration from the environment and set up logging.
//! 3. Run the bootstrap against this executable.
//!
//! The process always exits with status 0; failures are shown to the user in a
//! dialog instead.

#![cfg_attr(windows, windows_subsystem = "windows")]

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use setup_bootstrap::config::Config;
use setup_bootstrap::platform::{self, ForwardedArgs};
use setup_bootstrap::report::{self, DialogReporter};
use setup_bootstrap::{Bootstrap, SetupError};

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(anyhow::Error::msg)
        .context("failed to install log subscriber")
}

fn main() {
    platform::harden_process();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            Config::default()
        }
    };
    if let Err(err) = init_logging(&config.log_level) {
        eprintln!("{err:#}");
    }

    let self_path = match platform::current_exe() {
        Ok(path) => path,
        Err(source) => {
            let err = SetupError::ImageMap {
                path: PathBuf::from("<current executable>"),
                source,
            };
            report::present(&DialogReporter, &PathBuf::new(), &err);
            return;
        }
    };

    tracing::info!(exe = %self_path.display(), "starting setup");
    let bootstrap = Bootstrap::new(&config, self_path, ForwardedArgs::from_env());
    // Already presented to the user.
    let _ = bootstrap.run();
}
