// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encode boundaries for rendered images.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageResult};

/// Encode `image` as JPEG at `quality` (1-100, clamped).
///
/// JPEG has no alpha channel, so the image is flattened to RGB8 first.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.to_rgb8();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;
    Ok(buffer)
}

/// Encode `image` as lossless PNG.
pub fn encode_png(image: &DynamicImage) -> ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, ImageFormat::Png)?;
    Ok(buffer)
}

/// Guess the container format from the leading magic bytes.
pub fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    image::guess_format(data).ok()
}

/// File extension used for a scratch copy of `data`, which was detected as
/// `format`.
///
/// The PNM family shares one `ImageFormat`; its magic number picks the
/// variant.
pub fn extension_for(format: ImageFormat, data: &[u8]) -> &'static str {
    if format == ImageFormat::Pnm {
        return match data.get(..2) {
            Some(b"P1" | b"P4") => "pbm",
            Some(b"P2" | b"P5") => "pgm",
            Some(b"P3" | b"P6") => "ppm",
            Some(b"P7") => "pam",
            _ => "pnm",
        };
    }
    format.extensions_str().first().copied().unwrap_or("img")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn translucent() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([200, 100, 50, 128])))
    }

    #[test]
    fn jpeg_output_is_detected_as_jpeg() {
        let bytes = encode_jpeg(&translucent(), 90).unwrap();
        assert_eq!(detect_format(&bytes), Some(ImageFormat::Jpeg));
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn png_keeps_alpha() {
        let bytes = encode_png(&translucent()).unwrap();
        assert_eq!(detect_format(&bytes), Some(ImageFormat::Png));
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0)[3], 128);
    }

    #[test]
    fn unknown_bytes_have_no_format() {
        assert_eq!(detect_format(b"plain text"), None);
    }

    #[test]
    fn extensions_follow_format() {
        let png = encode_png(&translucent()).unwrap();
        assert_eq!(extension_for(ImageFormat::Jpeg, &[0xFF, 0xD8]), "jpg");
        assert_eq!(extension_for(ImageFormat::Png, &png), "png");
    }

    #[test]
    fn pnm_extension_follows_magic_number() {
        let ppm = b"P6\n2 1\n255\n\x00\x00\x00\xff\xff\xff";
        assert_eq!(detect_format(ppm), Some(ImageFormat::Pnm));
        assert_eq!(extension_for(ImageFormat::Pnm, ppm), "ppm");
        assert_eq!(extension_for(ImageFormat::Pnm, b"P5\n1 1\n255\n\x00"), "pgm");
        assert_eq!(extension_for(ImageFormat::Pnm, b"P4\n8 1\n\x00"), "pbm");
    }
}
