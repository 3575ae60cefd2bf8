// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-list editing shared by scan sessions and stored documents.
//
// Edits only touch the in-memory sequence, never image files. Indices are
// checked, never clamped.

use std::ops::Range;

use pagekeep_core::Adjustments;
use pagekeep_core::error::PageEditError;

use crate::model::ScanPage;

fn check_index(pages: &[ScanPage], index: usize) -> Result<(), PageEditError> {
    if index < pages.len() {
        Ok(())
    } else {
        Err(PageEditError::IndexOutOfRange {
            index,
            len: pages.len(),
        })
    }
}

/// Remove and return the page at `index`.
pub fn remove_page(pages: &mut Vec<ScanPage>, index: usize) -> Result<ScanPage, PageEditError> {
    check_index(pages, index)?;
    Ok(pages.remove(index))
}

/// Turn the page at `index` a further 90 degrees clockwise.
pub fn rotate_page(pages: &mut [ScanPage], index: usize) -> Result<(), PageEditError> {
    check_index(pages, index)?;
    let adjustments = &mut pages[index].adjustments;
    adjustments.rotation = adjustments.rotation.rotated_clockwise();
    Ok(())
}

/// Overwrite the page's adjustments. Values are clamped into their domains.
pub fn set_adjustments(
    pages: &mut [ScanPage],
    index: usize,
    adjustments: Adjustments,
) -> Result<(), PageEditError> {
    check_index(pages, index)?;
    pages[index].adjustments = Adjustments::new(
        adjustments.rotation,
        adjustments.brightness,
        adjustments.contrast,
    );
    Ok(())
}

pub fn attach_text(
    pages: &mut [ScanPage],
    index: usize,
    text: impl Into<String>,
) -> Result<(), PageEditError> {
    check_index(pages, index)?;
    pages[index].ocr_text = Some(text.into());
    Ok(())
}

/// Move the contiguous `range` so it lands before the element that was at
/// offset `to` before the move (`to` may equal the length to move to the end).
///
/// A destination inside the range leaves the order unchanged.
pub fn move_pages<T>(
    items: &mut Vec<T>,
    range: Range<usize>,
    to: usize,
) -> Result<(), PageEditError> {
    let len = items.len();
    let Range { start, end } = range;
    if start >= end || end > len || to > len {
        return Err(PageEditError::InvalidRange { start, end, len });
    }
    if (start..=end).contains(&to) {
        return Ok(());
    }

    let moved: Vec<T> = items.drain(start..end).collect();
    let insert_at = if to > end { to - moved.len() } else { to };
    items.splice(insert_at..insert_at, moved);
    Ok(())
}
