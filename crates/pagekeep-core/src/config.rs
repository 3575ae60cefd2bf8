// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{ExportFormat, PaperSize};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Override for the document storage root (default `<data>/documents`).
    pub storage_dir: Option<PathBuf>,
    /// Override for the export destination (default `<data>/exports`).
    pub export_dir: Option<PathBuf>,
    /// Longest edge, in pixels, of previews decoded for display.
    pub preview_max_dimension: u32,
    /// JPEG quality (1-100) for encoded page images and image exports.
    pub jpeg_quality: u8,
    /// Canvas for PDF export.
    pub paper_size: PaperSize,
    /// Format used when the caller does not pick one.
    pub default_export_format: ExportFormat,
    /// Name new sessions after the capture time.
    pub auto_naming: bool,
    /// Directory holding the OCR model files.
    pub ocr_model_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            export_dir: None,
            preview_max_dimension: 2000,
            jpeg_quality: 90,
            paper_size: PaperSize::A4,
            default_export_format: ExportFormat::Pdf,
            auto_naming: true,
            ocr_model_dir: None,
        }
    }
}
