//! Zip payload backend.
//!
//! Implements the `PayloadExtractor` trait for packages stored as zip archives
//! (nupkg and friends). The updater is streamed into a staging file next to the
//! destination and renamed into place once complete.

use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use ::zip::ZipArchive;
use tempfile::NamedTempFile;

use super::PayloadExtractor;
use crate::error::ExtractError;

/// Extracts one named entry from a zip payload.
#[derive(Debug, Clone)]
pub struct ZipExtractor {
    entry_name: String,
}

impl ZipExtractor {
    /// `entry_name` is matched against the final path component of each entry,
    /// ignoring ASCII case.
    pub fn new(entry_name: impl Into<String>) -> Self {
        Self {
            entry_name: entry_name.into(),
        }
    }

    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    fn find_entry(&self, archive: &ZipArchive<Cursor<&[u8]>>) -> Option<usize> {
        (0..archive.len()).find(|&index| {
            archive
                .name_for_index(index)
                .and_then(|name| name.rsplit(['/', '\\']).next())
                .is_some_and(|file_name| file_name.eq_ignore_ascii_case(&self.entry_name))
        })
    }
}

impl PayloadExtractor for ZipExtractor {
    fn extract(&self, payload: &[u8], dest: &Path) -> Result<(), ExtractError> {
        let mut archive = ZipArchive::new(Cursor::new(payload))?;
        let index = self
            .find_entry(&archive)
            .ok_or_else(|| ExtractError::EntryMissing(self.entry_name.clone()))?;
        let mut entry = archive.by_index(index)?;
        tracing::debug!(entry = entry.name(), size = entry.size(), "extracting updater");

        let write_err = |source| ExtractError::Write {
            path: dest.to_path_buf(),
            source,
        };
        let dir = dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut staging = NamedTempFile::new_in(&dir).map_err(write_err)?;

        // A corrupt entry fails here; the staging file is removed on drop.
        io::copy(&mut entry, &mut staging).map_err(|err| match err.kind() {
            io::ErrorKind::InvalidData => ExtractError::Format(err.to_string()),
            _ => write_err(err),
        })?;
        staging.flush().map_err(write_err)?;
        staging.as_file().sync_all().map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = staging.as_file().metadata().map_err(write_err)?.permissions();
            perms.set_mode(0o755);
            staging.as_file().set_permissions(perms).map_err(write_err)?;
        }

        staging.persist(dest).map_err(|err| write_err(err.error))?;
        tracing::info!(dest = %dest.display(), "extracted updater");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::zip::write::SimpleFileOptions;
    use ::zip::{CompressionMethod, ZipWriter};

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_matching_entry_from_nested_path() {
        let payload = archive(&[
            ("app.nuspec", &b"<package/>"[..]),
            ("lib/app/Update.exe", &b"updater binary"[..]),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("setup-updater");

        ZipExtractor::new("update.exe").extract(&payload, &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"updater binary");
    }

    #[cfg(unix)]
    #[test]
    fn extracted_updater_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let payload = archive(&[("Update", &b"#!/bin/sh\n"[..])]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("updater");

        ZipExtractor::new("Update").extract(&payload, &dest).unwrap();
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn missing_entry_leaves_destination_untouched() {
        let payload = archive(&[("lib/app/App.exe", &b"app"[..])]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("updater");
        std::fs::write(&dest, b"").unwrap();

        let err = ZipExtractor::new("Update.exe").extract(&payload, &dest).unwrap_err();
        assert!(matches!(err, ExtractError::EntryMissing(name) if name == "Update.exe"));
        assert!(std::fs::read(&dest).unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn garbage_payload_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("updater");

        let err = ZipExtractor::new("Update.exe")
            .extract(b"definitely not a zip archive", &dest)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Format(_)));
        assert!(!dest.exists());
    }
}
