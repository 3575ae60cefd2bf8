// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-recognition contract.
//
// Recognition engines are collaborators: they receive the fully adjusted
// page image and return text. Attaching the result to a page is the
// caller's decision.

use image::DynamicImage;
use pagekeep_core::Adjustments;
use pagekeep_core::error::OcrError;
use tracing::{debug, instrument};

use crate::image::{SourceImage, render_page};

/// Anything that can turn a rendered page image into text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Render `source` with `adjustments` and run it through `recognizer`.
///
/// Returns the trimmed text; blank output is `NoTextFound`.
#[instrument(skip_all)]
pub fn recognize_page<R>(
    recognizer: &R,
    source: Option<&SourceImage>,
    adjustments: &Adjustments,
) -> Result<String, OcrError>
where
    R: TextRecognizer + ?Sized,
{
    let source = source.ok_or(OcrError::NoImage)?;
    let rendered = render_page(source, adjustments);
    let text = recognizer.recognize(&rendered)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(OcrError::NoTextFound);
    }
    debug!(chars = text.len(), lines = text.lines().count(), "Page recognised");
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use pagekeep_core::Rotation;
    use std::sync::Mutex;

    /// Reports the dimensions it was handed.
    struct SizeReporter {
        seen: Mutex<Vec<(u32, u32)>>,
    }

    impl TextRecognizer for SizeReporter {
        fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
            let dims = (image.width(), image.height());
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(dims);
            }
            Ok(format!("  {}x{}\n", dims.0, dims.1))
        }
    }

    struct Silent;

    impl TextRecognizer for Silent {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            Ok("   ".into())
        }
    }

    fn source() -> SourceImage {
        SourceImage::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(10, 20)))
    }

    #[test]
    fn recognizer_sees_adjusted_image() {
        let recognizer = SizeReporter {
            seen: Mutex::new(Vec::new()),
        };
        let adjustments = Adjustments::new(Rotation::QUARTER, 0.0, 1.0);
        let text = recognize_page(&recognizer, Some(&source()), &adjustments).unwrap();
        assert_eq!(text, "20x10");
        assert_eq!(recognizer.seen.lock().unwrap().as_slice(), &[(20, 10)]);
    }

    #[test]
    fn missing_source_is_no_image() {
        let result = recognize_page(&Silent, None, &Adjustments::default());
        assert_eq!(result, Err(OcrError::NoImage));
    }

    #[test]
    fn blank_output_is_no_text_found() {
        let result = recognize_page(&Silent, Some(&source()), &Adjustments::default());
        assert_eq!(result, Err(OcrError::NoTextFound));
    }

    #[test]
    fn works_through_trait_objects() {
        let boxed: Box<dyn TextRecognizer> = Box::new(Silent);
        assert!(recognize_page(boxed.as_ref(), Some(&source()), &Adjustments::default()).is_err());
    }
}
