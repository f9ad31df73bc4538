//! Updater launch.
//!
//! Starts the extracted updater, pointing it back at this executable and the
//! payload offset, and waits for it to finish.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, SetupError};
use crate::platform::ForwardedArgs;

/// Reported when the updater's exit code cannot be retrieved.
pub const EXIT_CODE_UNAVAILABLE: i32 = -9;

/// Everything needed to start the updater.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub updater: PathBuf,
    pub self_path: PathBuf,
    pub payload_offset: u64,
    pub forwarded: ForwardedArgs,
}

/// How the updater run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchResult {
    Exited(i32),
    /// The process ended without an exit code we could read.
    Unavailable,
}

impl LaunchResult {
    pub fn code(&self) -> i32 {
        match self {
            LaunchResult::Exited(code) => *code,
            LaunchResult::Unavailable => EXIT_CODE_UNAVAILABLE,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code() == 0
    }
}

impl LaunchRequest {
    /// Renders the invocation as a single command line:
    /// `"<updater>" --setup "<self>" --setupOffset <offset> <args>`.
    pub fn command_line(&self) -> String {
        let mut line = format!(
            "\"{}\" --setup \"{}\" --setupOffset {}",
            self.updater.display(),
            self.self_path.display(),
            self.payload_offset
        );
        if !self.forwarded.is_empty() {
            line.push(' ');
            line.push_str(&self.forwarded.display());
        }
        line
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.updater);
        command
            .arg("--setup")
            .arg(&self.self_path)
            .arg("--setupOffset")
            .arg(self.payload_offset.to_string());
        match &self.forwarded {
            #[cfg(windows)]
            ForwardedArgs::Raw(raw) => {
                use std::os::windows::process::CommandExt;
                if !raw.is_empty() {
                    command.raw_arg(raw);
                }
            }
            ForwardedArgs::List(args) => {
                command.args(args);
            }
        }
        command
    }
}

/// Runs the updater and blocks until it exits.
///
/// There is no timeout: a hung updater hangs the caller.
pub fn run(request: &LaunchRequest) -> Result<LaunchResult> {
    tracing::info!(command = %request.command_line(), "starting updater");
    let mut child = request
        .command()
        .spawn()
        .map_err(|source| SetupError::ProcessStart {
            path: request.updater.clone(),
            source,
        })?;

    let result = match child.wait() {
        Ok(status) => status
            .code()
            .map_or(LaunchResult::Unavailable, LaunchResult::Exited),
        Err(err) => {
            tracing::warn!("unable to wait for updater: {err}");
            LaunchResult::Unavailable
        }
    };
    tracing::info!(code = result.code(), "updater exited");
    Ok(result)
}

/// Runs the updater and turns any nonzero exit into [`SetupError::LaunchFailed`].
pub fn launch(request: &LaunchRequest, log_hint: &str) -> Result<()> {
    let result = run(request)?;
    if !result.is_success() {
        return Err(SetupError::LaunchFailed {
            code: result.code(),
            log_hint: log_hint.to_string(),
        });
    }
    Ok(())
}

/// Builds a [`LaunchRequest`] from borrowed paths.
pub fn request(
    updater: &Path,
    self_path: &Path,
    payload_offset: u64,
    forwarded: ForwardedArgs,
) -> LaunchRequest {
    LaunchRequest {
        updater: updater.to_path_buf(),
        self_path: self_path.to_path_buf(),
        payload_offset,
        forwarded,
    }
}
