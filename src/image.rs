//! Self-image mapping.
//!
//! Maps the running executable read-only and locates the payload appended to it
//! using the embedded [`PayloadMarker`].

use memmap2::Mmap;
use object::read::{Object, ObjectSection};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SetupError};
use crate::marker::PayloadMarker;

static LIVE_MAPPINGS: AtomicUsize = AtomicUsize::new(0);

/// A read-only mapping of an executable file.
///
/// The mapping is released when the value is dropped.
pub struct SelfImage {
    path: PathBuf,
    mmap: Mmap,
}

/// The payload slice within a [`SelfImage`].
#[derive(Debug, Clone, Copy)]
pub struct PayloadRegion<'a> {
    pub offset: u64,
    pub bytes: &'a [u8],
}

impl PayloadRegion<'_> {
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl SelfImage {
    /// Maps the file at `path`.
    ///
    /// The file is opened read-only; other processes may read or map it at the
    /// same time. The handle is closed once the mapping exists.
    pub fn map(path: &Path) -> Result<Self> {
        let map_err = |source| SetupError::ImageMap {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(map_err)?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(map_err)?;
        drop(file);

        let live = LIVE_MAPPINGS.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(path = %path.display(), len = mmap.len(), live, "mapped image");
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Number of images currently mapped by this process.
    pub fn live_mappings() -> usize {
        LIVE_MAPPINGS.load(Ordering::SeqCst)
    }

    /// Reads the marker and returns the payload region it describes.
    pub fn locate(&self) -> Result<PayloadRegion<'_>> {
        let (position, marker) =
            PayloadMarker::find_in(&self.mmap).ok_or(SetupError::PayloadNotFound)?;
        tracing::debug!(position, offset = marker.offset, length = marker.length, "found marker");
        if !marker.is_present() {
            return Err(SetupError::PayloadNotFound);
        }

        let out_of_bounds = || SetupError::PayloadOutOfBounds {
            offset: marker.offset,
            length: marker.length,
            image_len: self.len(),
        };

        let end = marker
            .offset
            .checked_add(marker.length)
            .filter(|end| *end <= self.len())
            .ok_or_else(out_of_bounds)?;

        if let Some(image_end) = self.linked_image_end() {
            if marker.offset < image_end {
                return Err(out_of_bounds());
            }
        }

        let bytes = &self.mmap[marker.offset as usize..end as usize];
        Ok(PayloadRegion {
            offset: marker.offset,
            bytes,
        })
    }

    /// End of the last section of the linked executable, if the image parses as
    /// an object file. The payload has to start at or after this point.
    fn linked_image_end(&self) -> Option<u64> {
        let file = match object::File::parse(&*self.mmap) {
            Ok(file) => file,
            Err(err) => {
                tracing::debug!("image is not an object file, skipping layout check: {err}");
                return None;
            }
        };
        file.sections()
            .filter_map(|section| section.file_range())
            .map(|(offset, size)| offset + size)
            .max()
    }
}

impl Drop for SelfImage {
    fn drop(&mut self) {
        let live = LIVE_MAPPINGS.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(path = %self.path.display(), live, "unmapped image");
    }
}
