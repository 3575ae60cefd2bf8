// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adjustment pipeline — orientation normalisation, quarter-turn rotation, and
// brightness/contrast colour controls.
//
// This is the single rendering path for page images: on-screen previews,
// every export format, and OCR input all go through `render_page`, so the
// pixels a user sees are the pixels that get exported.

use std::path::Path;

use image::{DynamicImage, ImageResult, Rgba};
use imageproc::map::map_colors;
use pagekeep_core::{Adjustments, Rotation};
use tracing::{debug, instrument};

use super::orientation::Orientation;

/// A decoded source image together with its stored orientation.
///
/// The pixels are owned exclusively and never modified; every render
/// produces a new image.
#[derive(Clone)]
pub struct SourceImage {
    pixels: DynamicImage,
    orientation: Orientation,
}

impl SourceImage {
    /// Decode encoded bytes (JPEG, PNG, ...) and read their EXIF orientation.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn decode(data: &[u8]) -> ImageResult<Self> {
        let pixels = image::load_from_memory(data)?;
        let orientation = Orientation::read_from_bytes(data);
        debug!(
            width = pixels.width(),
            height = pixels.height(),
            ?orientation,
            "Source image decoded"
        );
        Ok(Self {
            pixels,
            orientation,
        })
    }

    /// Read and decode an image file.
    pub fn open(path: impl AsRef<Path>) -> ImageResult<Self> {
        let data = std::fs::read(path.as_ref()).map_err(image::ImageError::IoError)?;
        Self::decode(&data)
    }

    /// Wrap pixels that are already upright (e.g. a downsampled preview).
    pub fn from_dynamic(pixels: DynamicImage) -> Self {
        Self::with_orientation(pixels, Orientation::Up)
    }

    pub fn with_orientation(pixels: DynamicImage, orientation: Orientation) -> Self {
        Self {
            pixels,
            orientation,
        }
    }

    /// The stored (not yet normalised) pixels.
    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Upright copy of the source.
    pub fn normalized(&self) -> DynamicImage {
        self.orientation.apply(&self.pixels)
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .field("orientation", &self.orientation)
            .finish()
    }
}

/// Render `image` with the given brightness, contrast, and clockwise rotation.
///
/// Order is fixed: normalise orientation, rotate by the requested quarter
/// turns, then apply colour controls. Colour controls are skipped entirely
/// when brightness is 0 and contrast is 1. Out-of-domain values are clamped
/// and rotation is snapped to a quarter turn.
pub fn adjust(
    image: &SourceImage,
    brightness: f64,
    contrast: f64,
    rotation_degrees: i32,
) -> DynamicImage {
    let adjustments = Adjustments::new(
        Rotation::from_degrees(rotation_degrees),
        brightness,
        contrast,
    );
    render_page(image, &adjustments)
}

/// Render a page source with its stored adjustments.
#[instrument(skip_all, fields(
    rotation = adjustments.rotation.degrees(),
    brightness = adjustments.brightness,
    contrast = adjustments.contrast,
))]
pub fn render_page(image: &SourceImage, adjustments: &Adjustments) -> DynamicImage {
    let upright = image.normalized();
    let rotated = rotate_quarter_turns(upright, adjustments.rotation);

    if adjustments.is_color_neutral() {
        return rotated;
    }

    apply_color_controls(&rotated, adjustments.brightness, adjustments.contrast)
}

fn rotate_quarter_turns(image: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation.degrees() {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image,
    }
}

/// Per-channel colour controls on normalised values `v` in [0, 1]:
/// `v' = ((v + brightness) - 0.5) * contrast + 0.5`, clamped. Alpha is kept.
fn apply_color_controls(image: &DynamicImage, brightness: f64, contrast: f64) -> DynamicImage {
    let table = color_table(brightness, contrast);
    let rgba = image.to_rgba8();
    let adjusted = map_colors(&rgba, |pixel: Rgba<u8>| {
        let Rgba([r, g, b, a]) = pixel;
        Rgba([
            table[r as usize],
            table[g as usize],
            table[b as usize],
            a,
        ])
    });
    DynamicImage::ImageRgba8(adjusted)
}

fn color_table(brightness: f64, contrast: f64) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (value, entry) in table.iter_mut().enumerate() {
        let v = value as f64 / 255.0;
        let out = ((v + brightness) - 0.5) * contrast + 0.5;
        *entry = (out.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    table
}
