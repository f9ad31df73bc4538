//! Error taxonomy for the bootstrap.
//!
//! Every stage returns a [`SetupError`]; the orchestrator funnels all of them into
//! a single user-facing message (see [`crate::report`]).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::utils::pretty_bytes;

pub type Result<T, E = SetupError> = std::result::Result<T, E>;

/// Failures raised by a [`crate::extractor::PayloadExtractor`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The payload is not a readable archive.
    #[error("the embedded package is not a valid archive: {0}")]
    Format(String),

    /// The archive does not contain the updater.
    #[error("the embedded package does not contain '{0}'")]
    EntryMissing(String),

    /// Writing the extracted updater failed.
    #[error("unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        ExtractError::Format(err.to_string())
    }
}

/// Any failure of a bootstrap run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("unable to memory-map the running executable {path}: {source}")]
    ImageMap {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no embedded package marker")]
    PayloadNotFound,

    #[error("embedded package at offset {offset} with length {length} lies outside the payload area of a {image_len} byte image")]
    PayloadOutOfBounds {
        offset: u64,
        length: u64,
        image_len: u64,
    },

    #[error("insufficient disk space: {required} bytes required, {available} bytes available")]
    InsufficientSpace { required: u64, available: u64 },

    /// The free space of the install volume could not be determined.
    #[error("unable to query free space of {path}: {source}")]
    SpaceQuery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to create a temporary file in {dir}: {source}")]
    TempFile {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("unable to start {path}: {source}")]
    ProcessStart {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("updater exited with code {code}")]
    LaunchFailed { code: i32, log_hint: String },

    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl SetupError {
    /// The human-readable description shown to the user, without the common
    /// prefix added by [`crate::report`].
    pub fn user_message(&self) -> String {
        match self {
            SetupError::ImageMap { source, .. } => with_os_detail(
                "Unable to memmap current executable. Is there enough available system memory?",
                source,
            ),
            SetupError::PayloadNotFound | SetupError::PayloadOutOfBounds { .. } => {
                "The embedded package containing the application to install was not found. \
                 Please contact the application author."
                    .to_string()
            }
            SetupError::InsufficientSpace { required, available } => format!(
                "Insufficient disk space. This application requires at least {} free space to be installed ({} available).",
                pretty_bytes(*required),
                pretty_bytes(*available)
            ),
            SetupError::SpaceQuery { source, .. } => with_os_detail(
                "Unable to verify sufficient available free space on disk.",
                source,
            ),
            SetupError::TempFile { source, .. } => {
                with_os_detail("Unable to create a temporary file.", source)
            }
            SetupError::Extraction(err) => {
                format!("Unable to extract the installer from the embedded package: {err}.")
            }
            SetupError::ProcessStart { source, .. } => {
                with_os_detail("Unable to start install process.", source)
            }
            SetupError::LaunchFailed { code, log_hint } => format!(
                "Process exited with error code: {code}. There may be more information in '{log_hint}'."
            ),
            SetupError::Unknown(_) => {
                "Please contact the application author.".to_string()
            }
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SetupError::Unknown(_))
    }
}

fn with_os_detail(description: &str, source: &io::Error) -> String {
    format!("{description} \n{source}")
}
