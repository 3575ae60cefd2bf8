// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EXIF orientation — reading tag 0x0112 and turning stored pixels upright.

use std::io::{BufRead, Seek};

use image::DynamicImage;

/// How the stored pixels must be transformed to appear upright.
///
/// Discriminants are the EXIF orientation values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Up = 1,
    UpMirrored = 2,
    Down = 3,
    DownMirrored = 4,
    LeftMirrored = 5,
    Right = 6,
    RightMirrored = 7,
    Left = 8,
}

impl Orientation {
    /// Map an EXIF orientation value. Unknown values are treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::UpMirrored,
            3 => Self::Down,
            4 => Self::DownMirrored,
            5 => Self::LeftMirrored,
            6 => Self::Right,
            7 => Self::RightMirrored,
            8 => Self::Left,
            _ => Self::Up,
        }
    }

    /// Read the orientation from an encoded image container.
    ///
    /// Missing or unreadable EXIF data means upright.
    pub fn read<R: BufRead + Seek>(reader: &mut R) -> Self {
        let data = match exif::Reader::new().read_from_container(reader) {
            Ok(data) => data,
            Err(_) => return Self::Up,
        };
        data.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Self::from_exif)
            .unwrap_or_default()
    }

    /// Read the orientation from in-memory encoded bytes.
    pub fn read_from_bytes(bytes: &[u8]) -> Self {
        Self::read(&mut std::io::Cursor::new(bytes))
    }

    /// Return an upright copy of `image`.
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Self::Up => image.clone(),
            Self::UpMirrored => image.fliph(),
            Self::Down => image.rotate180(),
            Self::DownMirrored => image.flipv(),
            Self::LeftMirrored => image.rotate90().fliph(),
            Self::Right => image.rotate90(),
            Self::RightMirrored => image.rotate270().fliph(),
            Self::Left => image.rotate270(),
        }
    }
}

/// Copy of `jpeg` with an EXIF APP1 segment carrying orientation `value`
/// inserted after the SOI marker.
#[cfg(test)]
pub(crate) fn with_exif_orientation(jpeg: &[u8], value: u16) -> Vec<u8> {
    // Big-endian TIFF header, IFD0 at offset 8 with a single SHORT entry.
    let mut tiff = vec![b'M', b'M', 0x00, 0x2A, 0, 0, 0, 8];
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0, 0, 0, 1]);
    tiff.extend_from_slice(&value.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&[0, 0, 0, 0]);

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let segment_len = (payload.len() + 2) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}
