//! Image handling: reference normalization and thumbnailing.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Normalize reference** | [`paths::normalize`] (SHA-1 names for URLs) |
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Thumbnail** | fit inside a box, Lanczos3 `resize_exact` |
//!
//! The module is split into:
//! - **Paths**: Pure mapping from a reference to source and thumbnail paths
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod paths;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::fit_within;
pub use operations::{ThumbnailConfig, create_thumbnail};
pub use params::Quality;
pub use rust_backend::RustBackend;
