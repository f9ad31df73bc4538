//! Core bootstrap logic.
//!
//! This module contains the `Bootstrap` struct which drives a single run:
//! 1. Locating: maps the executable and finds the embedded payload.
//! 2. Preflighting: checks the install volume has room for it.
//! 3. Extracting: writes the updater to a fresh temp file.
//! 4. Launching: runs the updater and waits for it.
//!
//! Any failure skips the remaining stages. Cleanup always follows: a failure is
//! presented to the user, then the temp file is deleted and the image unmapped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::config::Config;
use crate::error::{Result, SetupError};
use crate::extractor::zip::ZipExtractor;
use crate::extractor::PayloadExtractor;
use crate::image::SelfImage;
use crate::launch;
use crate::platform::{ForwardedArgs, EXE_EXTENSION};
use crate::preflight::{self, LocalAppDataProbe, SpaceProbe};
use crate::report::{self, DialogReporter, Reporter};

const TEMP_PREFIX: &str = "setup";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Locating,
    Preflighting,
    Extracting,
    Launching,
}

/// Resources owned by one run.
struct Session {
    stage: Stage,
    image: Option<SelfImage>,
    updater: Option<TempPath>,
}

impl Session {
    fn new() -> Self {
        Self {
            stage: Stage::Start,
            image: None,
            updater: None,
        }
    }

    fn cleanup(self) {
        if let Some(updater) = self.updater {
            let path = updater.to_path_buf();
            match updater.close() {
                Ok(()) => tracing::debug!(path = %path.display(), "removed extracted updater"),
                Err(err) => {
                    tracing::warn!(path = %path.display(), "unable to remove extracted updater: {err}")
                }
            }
        }
        drop(self.image);
    }
}

pub struct Bootstrap {
    self_path: PathBuf,
    temp_dir: PathBuf,
    log_hint: String,
    forwarded: ForwardedArgs,
    extractor: Box<dyn PayloadExtractor>,
    probe: Box<dyn SpaceProbe>,
    reporter: Box<dyn Reporter>,
}

impl Bootstrap {
    /// A bootstrap for the executable at `self_path` with the default zip
    /// extractor, local app-data space probe and dialog reporter.
    pub fn new(config: &Config, self_path: PathBuf, forwarded: ForwardedArgs) -> Self {
        Self {
            self_path,
            temp_dir: config.temp_dir(),
            log_hint: config.updater_log.clone(),
            forwarded,
            extractor: Box::new(ZipExtractor::new(config.updater_entry.clone())),
            probe: Box::new(LocalAppDataProbe),
            reporter: Box::new(DialogReporter),
        }
    }

    pub fn with_extractor(mut self, extractor: impl PayloadExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_probe(mut self, probe: impl SpaceProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn self_path(&self) -> &Path {
        &self.self_path
    }

    /// Runs every stage once. A failure has already been presented to the user
    /// when this returns.
    pub fn run(&self) -> Result<()> {
        let mut session = Session::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.execute(&mut session)))
            .unwrap_or_else(|payload| Err(SetupError::Unknown(panic_message(&*payload))));

        match &result {
            Ok(()) => tracing::info!("setup completed"),
            Err(err) => {
                tracing::error!(stage = ?session.stage, "setup aborted");
                report::present(self.reporter.as_ref(), &self.self_path, err);
            }
        }
        session.cleanup();
        result
    }

    fn execute(&self, session: &mut Session) -> Result<()> {
        enter(&mut session.stage, Stage::Locating);
        let image = &*session.image.insert(SelfImage::map(&self.self_path)?);
        let region = image.locate()?;
        tracing::info!(offset = region.offset, length = region.len(), "located payload");

        enter(&mut session.stage, Stage::Preflighting);
        preflight::check_space(self.probe.as_ref(), region.len())?;

        enter(&mut session.stage, Stage::Extracting);
        let updater = &*session.updater.insert(self.reserve_temp_file()?);
        self.extractor.extract(region.bytes, updater)?;

        enter(&mut session.stage, Stage::Launching);
        let request = launch::request(
            updater,
            &self.self_path,
            region.offset,
            self.forwarded.clone(),
        );
        launch::launch(&request, &self.log_hint)
    }

    /// Creates an empty, uniquely named file for the updater.
    fn reserve_temp_file(&self) -> Result<TempPath> {
        let suffix = if EXE_EXTENSION.is_empty() {
            String::new()
        } else {
            format!(".{EXE_EXTENSION}")
        };
        let file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.temp_dir)
            .map_err(|source| SetupError::TempFile {
                dir: self.temp_dir.clone(),
                source,
            })?;
        Ok(file.into_temp_path())
    }
}

fn enter(current: &mut Stage, next: Stage) {
    tracing::debug!(from = ?current, to = ?next, "stage transition");
    *current = next;
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}
