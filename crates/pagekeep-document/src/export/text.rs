// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text export of recognised page text.

use crate::model::ScanPage;

/// Written when no page has any recognised text.
pub const NO_TEXT_PLACEHOLDER: &str = "No text recognized in this document.";

/// Concatenate recognised text in page order.
///
/// Pages without text contribute nothing. Every contribution after the first
/// is preceded by a banner with its 1-based position in `pages`.
pub fn render_text(pages: &[ScanPage]) -> String {
    let mut output = String::new();
    for (index, page) in pages.iter().enumerate() {
        let Some(text) = page.text() else {
            continue;
        };
        if !output.is_empty() {
            output.push_str(&format!("\n\n--- Page {} ---\n\n", index + 1));
        }
        output.push_str(text);
    }

    if output.is_empty() {
        NO_TEXT_PLACEHOLDER.to_string()
    } else {
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekeep_core::{PageId, PageRecord, Rotation};

    fn page(text: Option<&str>) -> ScanPage {
        ScanPage::from_record(PageRecord {
            id: PageId::new(),
            image_path: None,
            rotation: Rotation::NONE,
            brightness: 0.0,
            contrast: 1.0,
            ocr_text: text.map(str::to_owned),
        })
    }

    #[test]
    fn single_contribution_has_no_banner() {
        let pages = vec![page(Some("Total: $42")), page(None)];
        assert_eq!(render_text(&pages), "Total: $42");
    }

    #[test]
    fn banners_name_original_page_positions() {
        let pages = vec![page(None), page(Some("first")), page(Some("")), page(Some("last"))];
        assert_eq!(render_text(&pages), "first\n\n--- Page 4 ---\n\nlast");
    }

    #[test]
    fn no_text_gives_placeholder() {
        assert_eq!(render_text(&[page(None), page(Some(""))]), NO_TEXT_PLACEHOLDER);
        assert_eq!(render_text(&[]), NO_TEXT_PLACEHOLDER);
    }

    #[test]
    fn whitespace_text_still_contributes() {
        let pages = vec![page(Some("first")), page(Some("  "))];
        assert_eq!(render_text(&pages), "first\n\n--- Page 2 ---\n\n  ");
    }
}
