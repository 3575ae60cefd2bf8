// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export renderer — PDF, image set, and plain text artifacts from a page list.
//
// Pages are rendered through the same adjustment pipeline as previews. The
// caller supplies a resolver mapping a page to its best full-resolution
// source, so session pages and stored pages export the same way.

pub mod images;
pub mod pdf;
pub mod text;

use std::path::{Path, PathBuf};

use pagekeep_core::error::ExportError;
use pagekeep_core::{AppConfig, ExportFormat, PaperSize};
use tracing::{info, instrument, warn};

use crate::image::{SourceImage, render_page};
use crate::model::ScanPage;

pub use images::export_images;
pub use pdf::{PdfWriter, Placement, fit_centered};
pub use text::{NO_TEXT_PLACEHOLDER, render_text};

/// Rendering parameters shared by all formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub paper_size: PaperSize,
    pub jpeg_quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            jpeg_quality: 90,
        }
    }
}

impl From<&AppConfig> for ExportOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            paper_size: config.paper_size,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

/// Files produced by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub files: Vec<PathBuf>,
}

/// Make a document title safe to use as a file name stem.
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        "Untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<title>.<ext>`, or `<title>_<n>.<ext>` when a page number is given.
pub fn artifact_file_name(title: &str, page_number: Option<usize>, extension: &str) -> String {
    let stem = sanitize_title(title);
    match page_number {
        Some(n) => format!("{stem}_{n}.{extension}"),
        None => format!("{stem}.{extension}"),
    }
}

fn ensure_dir(dest_dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(dest_dir).map_err(|err| {
        ExportError::WriteFailed(format!("cannot create {}: {err}", dest_dir.display()))
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes)
        .map_err(|err| ExportError::WriteFailed(format!("{}: {err}", path.display())))
}

/// Render every resolvable page onto its own canvas page and write
/// `<title>.pdf`.
#[instrument(skip(pages, options, resolve), fields(page_count = pages.len()))]
pub fn export_pdf<R>(
    pages: &[ScanPage],
    title: &str,
    dest_dir: &Path,
    options: &ExportOptions,
    resolve: R,
) -> Result<PathBuf, ExportError>
where
    R: Fn(&ScanPage) -> Option<SourceImage>,
{
    let rendered = pages.iter().enumerate().filter_map(|(index, page)| {
        let source = resolve(page);
        if source.is_none() {
            warn!(page = index + 1, page_id = %page.id, "No image for page, skipping");
        }
        source.map(|source| render_page(&source, &page.adjustments))
    });

    let writer = PdfWriter::new(options.paper_size, title);
    let bytes = writer.render(rendered).ok_or(ExportError::NoRenderableContent)?;

    ensure_dir(dest_dir)?;
    let path = dest_dir.join(artifact_file_name(title, None, ExportFormat::Pdf.extension()));
    write_file(&path, &bytes)?;
    info!(path = %path.display(), "PDF exported");
    Ok(path)
}

/// Write the concatenated page text to `<title>.txt`.
#[instrument(skip(pages), fields(page_count = pages.len()))]
pub fn export_text(
    pages: &[ScanPage],
    title: &str,
    dest_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let text = render_text(pages);
    ensure_dir(dest_dir)?;
    let path = dest_dir.join(artifact_file_name(title, None, ExportFormat::Text.extension()));
    write_file(&path, text.as_bytes())?;
    info!(path = %path.display(), chars = text.len(), "Text exported");
    Ok(path)
}

/// Export `pages` in `format`.
pub fn export<R>(
    format: ExportFormat,
    pages: &[ScanPage],
    title: &str,
    dest_dir: &Path,
    options: &ExportOptions,
    resolve: R,
) -> Result<ExportArtifact, ExportError>
where
    R: Fn(&ScanPage) -> Option<SourceImage>,
{
    let files = match format {
        ExportFormat::Pdf => vec![export_pdf(pages, title, dest_dir, options, resolve)?],
        ExportFormat::Jpg => export_images(pages, title, dest_dir, options, resolve)?,
        ExportFormat::Text => vec![export_text(pages, title, dest_dir)?],
    };
    Ok(ExportArtifact { format, files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use pagekeep_core::{PageId, PageRecord, Rotation};

    use crate::model::PagePreview;

    fn page(with_image: bool, text: Option<&str>) -> ScanPage {
        let mut page = ScanPage::from_record(PageRecord {
            id: PageId::new(),
            image_path: None,
            rotation: Rotation::NONE,
            brightness: 0.0,
            contrast: 1.0,
            ocr_text: text.map(str::to_owned),
        });
        if with_image {
            let img = RgbImage::from_pixel(30, 40, Rgb([120, 60, 200]));
            page.preview = Some(PagePreview::new(DynamicImage::ImageRgb8(img)));
        }
        page
    }

    fn from_preview(page: &ScanPage) -> Option<SourceImage> {
        page.preview_source()
    }

    #[test]
    fn sanitizes_titles_for_file_names() {
        assert_eq!(sanitize_title("  Tax/2025\\Q1  "), "Tax_2025_Q1");
        assert_eq!(sanitize_title("a\nb"), "a_b");
        assert_eq!(sanitize_title("   "), "Untitled");
        assert_eq!(artifact_file_name("Scan", Some(3), "jpg"), "Scan_3.jpg");
        assert_eq!(artifact_file_name("Scan", None, "pdf"), "Scan.pdf");
    }

    #[test]
    fn pdf_skips_pages_without_images() {
        let dir = tempfile::tempdir().unwrap();
        let pages = vec![page(true, None), page(false, None), page(true, None)];

        let path = export_pdf(&pages, "Report", dir.path(), &ExportOptions::default(), from_preview)
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "Report.pdf");

        let parsed = lopdf::Document::load(&path).unwrap();
        assert_eq!(parsed.get_pages().len(), 2);
    }

    #[test]
    fn empty_page_list_is_not_exportable() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions::default();
        assert_eq!(
            export(ExportFormat::Pdf, &[], "Nothing", dir.path(), &options, from_preview),
            Err(ExportError::NoRenderableContent)
        );
        assert_eq!(
            export(ExportFormat::Jpg, &[], "Nothing", dir.path(), &options, from_preview),
            Err(ExportError::NoRenderableContent)
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn image_set_numbers_files_only_for_multiple_pages() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions::default();

        let single = export_images(&[page(true, None)], "One", dir.path(), &options, from_preview)
            .unwrap();
        assert_eq!(single, vec![dir.path().join("One.jpg")]);

        let pages = vec![page(true, None), page(false, None), page(true, None)];
        let many = export_images(&pages, "Many", dir.path(), &options, from_preview).unwrap();
        assert_eq!(
            many,
            vec![dir.path().join("Many_1.jpg"), dir.path().join("Many_3.jpg")]
        );
        let decoded = image::open(&many[0]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (30, 40));
    }

    #[test]
    fn image_set_applies_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut rotated = page(true, None);
        rotated.adjustments.rotation = Rotation::QUARTER;

        let options = ExportOptions::default();
        let files =
            export_images(&[rotated], "Turned", dir.path(), &options, from_preview).unwrap();
        let decoded = image::open(&files[0]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn text_export_writes_placeholder_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = export(
            ExportFormat::Text,
            &[page(true, None)],
            "Blank",
            dir.path(),
            &ExportOptions::default(),
            from_preview,
        )
        .unwrap();
        assert_eq!(artifact.files, vec![dir.path().join("Blank.txt")]);
        let written = std::fs::read_to_string(&artifact.files[0]).unwrap();
        assert_eq!(written, NO_TEXT_PLACEHOLDER);
    }

    #[test]
    fn text_export_into_missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let path = export_text(&[page(false, Some("Total: $42"))], "Receipt", &nested).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Total: $42");
    }
}
