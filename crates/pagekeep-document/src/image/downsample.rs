// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded-resolution preview decoding.
//
// JPEG files are decoded with DCT-domain scaling so a 12-megapixel scan is
// never materialised at full size just to show a thumbnail. Other formats
// fall back to a normal decode followed by a thumbnail resize.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, RgbImage};
use jpeg_decoder::{Decoder, PixelFormat};
use tracing::{debug, instrument, warn};

use super::orientation::Orientation;

/// Decode `path` so that neither edge exceeds `max_dimension`.
///
/// The preview is upright (EXIF orientation applied) and never larger than
/// the stored image. Returns `None` if the file cannot be read or decoded.
#[instrument(fields(path = %path.display()))]
pub fn downsample(path: &Path, max_dimension: u32) -> Option<DynamicImage> {
    let max_dimension = max_dimension.max(1);

    let decoded = match read_format(path) {
        Some(ImageFormat::Jpeg) => decode_jpeg_scaled(path, max_dimension)
            .or_else(|| decode_full(path)),
        _ => decode_full(path),
    }?;

    let bounded = if decoded.width() > max_dimension || decoded.height() > max_dimension {
        decoded.thumbnail(max_dimension, max_dimension)
    } else {
        decoded
    };

    let orientation = File::open(path)
        .map(|file| Orientation::read(&mut BufReader::new(file)))
        .unwrap_or_default();

    let preview = orientation.apply(&bounded);
    debug!(
        width = preview.width(),
        height = preview.height(),
        ?orientation,
        "Preview decoded"
    );
    Some(preview)
}

fn read_format(path: &Path) -> Option<ImageFormat> {
    ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .format()
}

fn decode_full(path: &Path) -> Option<DynamicImage> {
    let reader = match ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
        Ok(reader) => reader,
        Err(err) => {
            warn!(error = %err, "Failed to open image for preview");
            return None;
        }
    };
    match reader.decode() {
        Ok(image) => Some(image),
        Err(err) => {
            warn!(error = %err, "Failed to decode image for preview");
            None
        }
    }
}

/// Scaled JPEG decode. `None` means "use the regular decoder instead".
fn decode_jpeg_scaled(path: &Path, max_dimension: u32) -> Option<DynamicImage> {
    let file = File::open(path).ok()?;
    let mut decoder = Decoder::new(BufReader::new(file));
    decoder.read_info().ok()?;
    let info = decoder.info()?;

    let (width, height) = (u32::from(info.width), u32::from(info.height));
    let longest = width.max(height);
    if longest > max_dimension {
        let ratio = f64::from(max_dimension) / f64::from(longest);
        let requested_w = (f64::from(width) * ratio).ceil().max(1.0) as u16;
        let requested_h = (f64::from(height) * ratio).ceil().max(1.0) as u16;
        decoder.scale(requested_w, requested_h).ok()?;
    }

    let pixels = decoder.decode().ok()?;
    let info = decoder.info()?;
    let (width, height) = (u32::from(info.width), u32::from(info.height));

    match info.pixel_format {
        PixelFormat::RGB24 => {
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        }
        PixelFormat::L8 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        // CMYK and 16-bit grey go through the regular decoder.
        _ => None,
    }
}
