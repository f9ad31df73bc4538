//! Disk-space preflight.
//!
//! Estimates how much space extracting and installing the payload needs and
//! compares it against the free space of the volume the install will land on.

use std::path::{Path, PathBuf};

use crate::error::{Result, SetupError};

/// Fixed working space for temp files and the bootstrap itself.
pub const OVERHEAD_BYTES: u64 = 50 * 1000 * 1000;

/// Conservative compression ratio of the payload archive.
pub const COMPRESSION_RATIO: f64 = 0.38;

/// Space required to install a payload of `payload_len` bytes.
///
/// Covers the compressed payload and its expanded form held at the same time,
/// plus [`OVERHEAD_BYTES`].
pub fn required_space(payload_len: u64) -> u64 {
    let expanded = (payload_len as f64 / COMPRESSION_RATIO) as u64;
    OVERHEAD_BYTES
        .saturating_add(payload_len.saturating_mul(2))
        .saturating_add(expanded)
}

/// Reports free space of the install volume.
pub trait SpaceProbe {
    /// Directory whose volume receives the installation.
    fn install_root(&self) -> Result<PathBuf>;

    /// Free bytes available to the current user on the volume holding `path`.
    fn available_space(&self, path: &Path) -> std::io::Result<u64>;
}

/// Probes the volume of the user's local application-data directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalAppDataProbe;

impl SpaceProbe for LocalAppDataProbe {
    fn install_root(&self) -> Result<PathBuf> {
        dirs::data_local_dir().ok_or_else(|| SetupError::SpaceQuery {
            path: PathBuf::from("<local app data>"),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "unable to locate the local application data directory",
            ),
        })
    }

    fn available_space(&self, path: &Path) -> std::io::Result<u64> {
        crate::platform::available_space(path)
    }
}

/// Fails with [`SetupError::InsufficientSpace`] unless the install volume has
/// strictly more free space than [`required_space`] for `payload_len`.
pub fn check_space(probe: &dyn SpaceProbe, payload_len: u64) -> Result<()> {
    let required = required_space(payload_len);
    let root = probe.install_root()?;
    let available = probe
        .available_space(&root)
        .map_err(|source| SetupError::SpaceQuery {
            path: root.clone(),
            source,
        })?;

    tracing::info!(
        volume = %root.display(),
        required,
        available,
        "checked free space"
    );
    if available <= required {
        return Err(SetupError::InsufficientSpace {
            required,
            available,
        });
    }
    Ok(())
}
