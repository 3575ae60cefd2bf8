// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-device OCR engine backed by `ocrs` (neural models executed via `rten`).
//
// Only compiled with the `ocr` feature. Two model files are required in the
// model directory:
//
// - `text-detection.rten`: locates text regions.
// - `text-recognition.rten`: decodes characters in each region.
//
// Running `ocrs-cli` once downloads both into `$XDG_CACHE_HOME/ocrs`.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use pagekeep_core::error::OcrError;
use rten::Model;
use tracing::{debug, info, instrument};

use super::recognizer::TextRecognizer;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Use the configured directory, or the default cache when unset.
    pub fn from_optional_dir(dir: Option<&Path>) -> Self {
        dir.map(Self::from_dir).unwrap_or_default()
    }

    pub fn models_present(&self) -> bool {
        self.detection_model_path.exists() && self.recognition_model_path.exists()
    }

    fn validate(&self) -> Result<(), OcrError> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(OcrError::RecognitionFailed(format!(
                    "model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

fn load_model(path: &Path) -> Result<Model, OcrError> {
    Model::load_file(path).map_err(|err| {
        OcrError::RecognitionFailed(format!("failed to load model from {}: {err}", path.display()))
    })
}

/// Loaded OCR models, reusable across pages.
///
/// `ocrs` and `rten` must be built in release mode; debug builds are
/// an order of magnitude slower.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        config.validate()?;

        info!("Loading OCR models");
        let detection_model = load_model(&config.detection_model_path)?;
        let recognition_model = load_model(&config.recognition_model_path)?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            OcrError::RecognitionFailed(format!("failed to initialise OCR engine: {err}"))
        })?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self, OcrError> {
        Self::new(&OcrConfig::from_dir(dir))
    }
}

impl TextRecognizer for OcrEngine {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            OcrError::RecognitionFailed(format!("invalid image ({width}x{height}): {err}"))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| OcrError::RecognitionFailed(format!("preprocessing failed: {err}")))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| OcrError::RecognitionFailed(err.to_string()))?;

        if text.trim().is_empty() {
            return Err(OcrError::NoTextFound);
        }
        debug!(lines = text.lines().count(), chars = text.len(), "OCR complete");
        Ok(text)
    }
}
