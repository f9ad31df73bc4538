//! Payload extraction.
//!
//! This module defines the `PayloadExtractor` trait, the boundary between the
//! bootstrap and the archive format of the embedded package. The bootstrap only
//! hands over a read-only view of the payload and one destination path.

use std::path::Path;

use crate::error::ExtractError;

pub mod zip;

/// Produces the updater executable from the payload.
pub trait PayloadExtractor {
    /// Writes the updater contained in `payload` to `dest`.
    ///
    /// On error `dest` must not hold a file that could pass for a complete
    /// updater.
    fn extract(&self, payload: &[u8], dest: &Path) -> Result<(), ExtractError>;
}

impl<T: PayloadExtractor + ?Sized> PayloadExtractor for &T {
    fn extract(&self, payload: &[u8], dest: &Path) -> Result<(), ExtractError> {
        (**self).extract(payload, dest)
    }
}
