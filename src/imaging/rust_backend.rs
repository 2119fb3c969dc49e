//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff format | `image::guess_format` |
//! | Identify | decoder header, axes swapped for EXIF rotations |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image` crate decoders |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode | format from the output extension, else the source format |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn sniff_format(source: &str, data: &[u8]) -> Result<ImageFormat, BackendError> {
    image::guess_format(data).map_err(|e| {
        BackendError::ProcessingFailed(format!("Unrecognised image format in {source}: {e}"))
    })
}

fn decode_error(source: &str, e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to decode {source}: {e}"))
}

/// Camera photos store their rotation in EXIF; a missing or unreadable tag
/// means upright.
fn read_orientation(decoder: &mut impl ImageDecoder) -> Orientation {
    decoder.orientation().unwrap_or(Orientation::NoTransforms)
}

/// Whether displaying with `orientation` swaps width and height.
fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Decode bytes upright, returning the image and the format it was stored in.
fn load_image(source: &str, data: &[u8]) -> Result<(DynamicImage, ImageFormat), BackendError> {
    let format = sniff_format(source, data)?;
    let mut decoder = ImageReader::with_format(Cursor::new(data), format)
        .into_decoder()
        .map_err(|e| decode_error(source, e))?;
    let orientation = read_orientation(&mut decoder);
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(source, e))?;
    img.apply_orientation(orientation);
    Ok((img, format))
}

/// Output format: the one named by the extension when we can encode it,
/// otherwise the source's own format (remote URLs often end in `.com`).
fn output_format(path: &Path, source_format: ImageFormat) -> ImageFormat {
    ImageFormat::from_path(path)
        .ok()
        .filter(|f| f.writing_enabled())
        .unwrap_or(source_format)
}

/// Encode and write `img` to `path`.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    quality: u32,
) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let mut writer = std::io::BufWriter::new(file);
    let result = match format {
        // JPEG has no alpha channel and takes an explicit quality.
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality as u8);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        other => img.write_to(&mut writer, other),
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to encode {}: {e}", path.display()))
    })
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &str, data: &[u8]) -> Result<Dimensions, BackendError> {
        let format = sniff_format(source, data)?;
        let mut decoder = ImageReader::with_format(Cursor::new(data), format)
            .into_decoder()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to read dimensions of {source}: {e}"
                ))
            })?;
        let (width, height) = decoder.dimensions();
        if swaps_axes(read_orientation(&mut decoder)) {
            Ok(Dimensions {
                width: height,
                height: width,
            })
        } else {
            Ok(Dimensions { width, height })
        }
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let (img, source_format) = load_image(params.source, params.data)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        let format = output_format(&params.output, source_format);
        save_image(&resized, &params.output, format, params.quality.value())
    }
}
