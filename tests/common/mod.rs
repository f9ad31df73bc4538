//! Shared fixtures for the bootstrap integration tests.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use setup_bootstrap::config::Config;
use setup_bootstrap::error::Result;
use setup_bootstrap::extractor::PayloadExtractor;
use setup_bootstrap::marker::PayloadMarker;
use setup_bootstrap::platform::ForwardedArgs;
use setup_bootstrap::preflight::SpaceProbe;
use setup_bootstrap::report::Reporter;
use setup_bootstrap::{Bootstrap, ExtractError};
use tempfile::TempDir;

pub const PAYLOAD_OFFSET: u64 = 4096;

/// Writes a fake executable: some code bytes, the marker, padding up to
/// [`PAYLOAD_OFFSET`] and then `payload`.
pub fn write_image(dir: &Path, marker: PayloadMarker, payload: &[u8]) -> PathBuf {
    let path = dir.join("MyAppSetup.exe");
    let mut bytes = vec![0xCC; 128];
    bytes.extend_from_slice(&marker.encode());
    bytes.resize(PAYLOAD_OFFSET as usize, 0);
    bytes.extend_from_slice(payload);
    fs::write(&path, bytes).unwrap();
    path
}

/// Like [`write_image`] but with a sparse payload of `length` zero bytes.
pub fn write_sparse_image(dir: &Path, length: u64) -> PathBuf {
    let path = dir.join("BigSetup.exe");
    let mut file = File::create(&path).unwrap();
    let mut head = vec![0xCC; 128];
    head.extend_from_slice(&PayloadMarker::new(PAYLOAD_OFFSET, length).encode());
    file.write_all(&head).unwrap();
    file.set_len(PAYLOAD_OFFSET + length).unwrap();
    path
}

pub struct FixedProbe {
    pub root: PathBuf,
    pub available: u64,
}

impl SpaceProbe for FixedProbe {
    fn install_root(&self) -> Result<PathBuf> {
        Ok(self.root.clone())
    }

    fn available_space(&self, _path: &Path) -> std::io::Result<u64> {
        Ok(self.available)
    }
}

/// A probe whose volume cannot be queried.
pub struct BrokenProbe;

impl SpaceProbe for BrokenProbe {
    fn install_root(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/unreachable"))
    }

    fn available_space(&self, _path: &Path) -> std::io::Result<u64> {
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "statvfs denied",
        ))
    }
}

#[derive(Clone, Default)]
pub struct Recorder(pub Arc<Mutex<Vec<(String, String)>>>);

impl Recorder {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.0.lock().unwrap().clone()
    }
}

impl Reporter for Recorder {
    fn show_error(&self, title: &str, message: &str) {
        self.0
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

/// What the fake extractor does with the destination.
#[derive(Clone)]
pub enum Behavior {
    /// Writes an updater script with this body.
    Script(String),
    /// Writes a file without execute permission.
    NotExecutable,
    Fail,
    Panic,
}

#[derive(Clone)]
pub struct FakeExtractor {
    pub behavior: Behavior,
    pub calls: Arc<AtomicUsize>,
}

impl FakeExtractor {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PayloadExtractor for FakeExtractor {
    fn extract(&self, _payload: &[u8], dest: &Path) -> std::result::Result<(), ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Script(body) => {
                write_script(dest, body);
                Ok(())
            }
            Behavior::NotExecutable => {
                fs::write(dest, b"not a program").unwrap();
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    fs::set_permissions(dest, fs::Permissions::from_mode(0o644)).unwrap();
                }
                Ok(())
            }
            Behavior::Fail => Err(ExtractError::EntryMissing("Update".to_string())),
            Behavior::Panic => panic!("extractor blew up"),
        }
    }
}

pub fn write_script(dest: &Path, body: &str) {
    fs::write(dest, format!("#!/bin/sh\n{body}\n")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dest, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// A scratch area with separate image, temp and install directories.
pub struct Sandbox {
    pub root: TempDir,
    pub temp: PathBuf,
    pub install: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let temp = root.path().join("temp");
        let install = root.path().join("install");
        fs::create_dir_all(&temp).unwrap();
        fs::create_dir_all(&install).unwrap();
        Self {
            root,
            temp,
            install,
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn config(&self) -> Config {
        Config {
            temp_dir: Some(self.temp.clone()),
            updater_log: "Update.log".to_string(),
            ..Config::default()
        }
    }

    pub fn bootstrap(
        &self,
        image: PathBuf,
        args: &[&str],
        extractor: FakeExtractor,
        available: u64,
        recorder: &Recorder,
    ) -> Bootstrap {
        let forwarded = ForwardedArgs::List(args.iter().map(Into::into).collect());
        Bootstrap::new(&self.config(), image, forwarded)
            .with_extractor(extractor)
            .with_probe(FixedProbe {
                root: self.install.clone(),
                available,
            })
            .with_reporter(recorder.clone())
    }

    /// Like [`Sandbox::bootstrap`] but extracting into `temp_dir`.
    pub fn bootstrap_in(
        &self,
        temp_dir: PathBuf,
        image: PathBuf,
        extractor: FakeExtractor,
        recorder: &Recorder,
    ) -> Bootstrap {
        let config = Config {
            temp_dir: Some(temp_dir),
            ..self.config()
        };
        Bootstrap::new(&config, image, ForwardedArgs::List(Vec::new()))
            .with_extractor(extractor)
            .with_probe(FixedProbe {
                root: self.install.clone(),
                available: u64::MAX,
            })
            .with_reporter(recorder.clone())
    }

    pub fn temp_entries(&self) -> usize {
        fs::read_dir(&self.temp).unwrap().count()
    }
}
