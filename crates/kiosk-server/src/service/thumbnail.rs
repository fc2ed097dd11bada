//! Image thumbnails.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat};

/// JPEG quality used for scaled images.
const JPEG_QUALITY: u8 = 100;

/// Errors from [`scale`].
#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("width and height cannot both be zero")]
    EmptySize,

    #[error("failed to decode image: {0}")]
    Decode(#[source] ImageError),

    #[error("cannot encode {0:?} images")]
    UnsupportedFormat(ImageFormat),

    #[error("failed to encode image: {0}")]
    Encode(#[source] ImageError),
}

/// Returns the key of the `width`x`height` thumbnail of `key`.
///
/// The size is inserted as a directory in front of the file name:
/// `app/img/logo.png` becomes `app/img/64x0/logo.png`.
pub fn thumbnail_path(key: &str, width: u32, height: u32) -> String {
    match key.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/{width}x{height}/{file}"),
        None => format!("{width}x{height}/{key}"),
    }
}

/// Scales an encoded image to `width` x `height` with a Lanczos filter and
/// encodes it again in its original format.
///
/// A zero dimension is derived from the other one, keeping the aspect ratio.
pub fn scale(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ThumbnailError> {
    if width == 0 && height == 0 {
        return Err(ThumbnailError::EmptySize);
    }

    let format = image::guess_format(data).map_err(ThumbnailError::Decode)?;
    let source =
        image::load_from_memory_with_format(data, format).map_err(ThumbnailError::Decode)?;

    let (width, height) = target_size(source.width(), source.height(), width, height);
    let scaled = source.resize_exact(width, height, FilterType::Lanczos3);

    let mut output = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);
            DynamicImage::ImageRgb8(scaled.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(ThumbnailError::Encode)?;
        }
        ImageFormat::Png | ImageFormat::Gif | ImageFormat::Bmp | ImageFormat::Tiff => {
            scaled
                .write_to(&mut output, format)
                .map_err(ThumbnailError::Encode)?;
        }
        other => return Err(ThumbnailError::UnsupportedFormat(other)),
    }

    Ok(output.into_inner())
}

fn target_size(source_width: u32, source_height: u32, width: u32, height: u32) -> (u32, u32) {
    let derive = |target: u32, numerator: u32, denominator: u32| {
        let derived = f64::from(target) * f64::from(numerator) / f64::from(denominator.max(1));
        (derived.round() as u32).max(1)
    };

    match (width, height) {
        (0, height) => (derive(height, source_width, source_height), height),
        (width, 0) => (width, derive(width, source_height, source_width)),
        size => size,
    }
}
