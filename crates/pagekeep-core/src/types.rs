// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagekeep document library.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stored document.
///
/// The hyphenated form names the document's storage directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the hyphenated string form (as used in directory names).
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a page within a document or session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// File name of this page's persisted image (`<pageId>.jpg`).
    pub fn image_file_name(&self) -> String {
        format!("{}.jpg", self.0)
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clockwise page rotation, always one of 0, 90, 180, or 270 degrees.
///
/// Any integer converts into a `Rotation`: the value is reduced modulo 360
/// and snapped to the nearest quarter turn, so hand-edited metadata can
/// never produce an off-axis page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Self = Self(0);
    pub const QUARTER: Self = Self(90);
    pub const HALF: Self = Self(180);
    pub const THREE_QUARTERS: Self = Self(270);

    /// Normalise an arbitrary degree value.
    pub fn from_degrees(degrees: i32) -> Self {
        let reduced = degrees.rem_euclid(360);
        let quarters = ((reduced + 45) / 90) % 4;
        Self((quarters * 90) as u16)
    }

    pub fn degrees(&self) -> u16 {
        self.0
    }

    /// The rotation after one more clockwise quarter turn.
    pub fn rotated_clockwise(self) -> Self {
        Self((self.0 + 90) % 360)
    }

    /// Whether this rotation swaps width and height.
    pub fn swaps_dimensions(&self) -> bool {
        self.0 == 90 || self.0 == 270
    }
}

impl From<i32> for Rotation {
    fn from(degrees: i32) -> Self {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.0 as i32
    }
}

/// Non-destructive visual adjustments applied to a page at render time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    pub rotation: Rotation,
    /// Additive brightness in [-1, 1]; 0 is neutral.
    pub brightness: f64,
    /// Contrast multiplier in [0.5, 2]; 1 is neutral.
    pub contrast: f64,
}

impl Adjustments {
    pub const BRIGHTNESS_RANGE: (f64, f64) = (-1.0, 1.0);
    pub const CONTRAST_RANGE: (f64, f64) = (0.5, 2.0);

    /// Build adjustments, clamping brightness and contrast into their domains.
    /// Non-finite values fall back to neutral.
    pub fn new(rotation: Rotation, brightness: f64, contrast: f64) -> Self {
        let brightness = if brightness.is_finite() {
            brightness.clamp(Self::BRIGHTNESS_RANGE.0, Self::BRIGHTNESS_RANGE.1)
        } else {
            0.0
        };
        let contrast = if contrast.is_finite() {
            contrast.clamp(Self::CONTRAST_RANGE.0, Self::CONTRAST_RANGE.1)
        } else {
            1.0
        };
        Self {
            rotation,
            brightness,
            contrast,
        }
    }

    /// True when the colour transform would be a no-op.
    pub fn is_color_neutral(&self) -> bool {
        self.brightness == 0.0 && self.contrast == 1.0
    }
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            rotation: Rotation::NONE,
            brightness: 0.0,
            contrast: 1.0,
        }
    }
}

/// Standard paper sizes used as the PDF export canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// Artifact kinds the export renderer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Jpg,
    Text,
}

impl ExportFormat {
    /// File extension (without the dot) of produced files.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Jpg => "jpg",
            Self::Text => "txt",
        }
    }
}
