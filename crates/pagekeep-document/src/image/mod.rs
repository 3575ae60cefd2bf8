// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — orientation normalisation, the rotate/brightness/contrast
// adjustment pipeline, bounded-resolution preview decoding, and codecs.

pub mod adjust;
pub mod codec;
pub mod downsample;
pub mod orientation;

pub use adjust::{SourceImage, adjust, render_page};
pub use codec::{detect_format, encode_jpeg, encode_png};
pub use downsample::downsample;
pub use orientation::Orientation;
