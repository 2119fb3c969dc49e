//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the thumbnail stage
//! needs: identify and resize. Both take the encoded bytes, because a source
//! may be a local file or a download.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared by every thumbnail task on the rayon
/// pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions from encoded bytes.
    fn identify(&self, source: &str, data: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, resize to exactly `width`x`height`, encode and write.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
