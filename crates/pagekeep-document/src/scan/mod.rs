// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optical character recognition — the recogniser contract and, behind the
// `ocr` feature, an `ocrs`-backed engine.

pub mod recognizer;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use recognizer::{TextRecognizer, recognize_page};

#[cfg(feature = "ocr")]
pub use ocr::{OcrConfig, OcrEngine};
