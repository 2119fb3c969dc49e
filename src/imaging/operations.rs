//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::params::{Quality, ResizeParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

/// Fit an encoded image inside the thumbnail box and write it to `output`.
///
/// Returns the written dimensions. The output directory is created if
/// needed.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &str,
    data: &[u8],
    output: &Path,
    config: &ThumbnailConfig,
) -> Result<(u32, u32)> {
    let dims = backend.identify(source, data)?;
    let (width, height) = fit_within(
        (dims.width, dims.height),
        (config.max_width, config.max_height),
    );
    if width == 0 || height == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "{source} has zero-sized dimensions"
        )));
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    backend.resize(&ResizeParams {
        source,
        data,
        output: output.to_path_buf(),
        width,
        height,
        quality: config.quality,
    })?;

    Ok((width, height))
}
