// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagekeep-document — Page rendering and export for Pagekeep.
//
// Provides the deterministic adjustment pipeline (orientation, rotation,
// brightness/contrast), bounded preview decoding, the runtime page and
// document model, page-list editing, PDF / image-set / text export, and the
// text-recognition contract.

pub mod export;
pub mod image;
pub mod model;
pub mod pages;
pub mod scan;

pub use export::{ExportArtifact, ExportOptions, export, render_text};
pub use self::image::{SourceImage, adjust, downsample, render_page};
pub use model::{PagePreview, ScanDocument, ScanPage};
pub use scan::{TextRecognizer, recognize_page};

#[cfg(feature = "ocr")]
pub use scan::ocr::{OcrConfig, OcrEngine};
