//! Self-extracting installer bootstrap.
//!
//! This library provides the pieces of the `setup` binary, which finds the
//! package appended to its own executable, extracts the updater from it and runs
//! the updater against that package.
//! It is organized into several modules:
//! - `config`: environment-backed configuration.
//! - `marker`: the embedded payload marker.
//! - `image`: mapping the running executable and locating the payload.
//! - `preflight`: free-space estimation and checking.
//! - `extractor`: the extraction boundary and its zip backend.
//! - `launch`: running the updater and reading its exit code.
//! - `report`: turning failures into the user-facing message.
//! - `bootstrap`: the stage sequence with guaranteed cleanup.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractor;
pub mod image;
pub mod launch;
pub mod marker;
pub mod platform;
pub mod preflight;
pub mod report;
pub mod utils;

pub use bootstrap::Bootstrap;
pub use error::{ExtractError, SetupError};
