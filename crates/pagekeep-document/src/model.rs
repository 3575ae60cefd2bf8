// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runtime page and document model.
//
// These carry everything in the transfer records plus transient handles
// (decoded preview, temporary source file) that are never serialised.
// Conversion to and from `pagekeep_core::record` is explicit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use pagekeep_core::{Adjustments, DocumentId, DocumentRecord, PageId, PageRecord};

use crate::image::{SourceImage, render_page};

/// A bounded-resolution, upright, unadjusted copy of a page image.
///
/// Shared by reference; cloning a page never copies pixels.
#[derive(Clone)]
pub struct PagePreview(Arc<DynamicImage>);

impl PagePreview {
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn image(&self) -> &DynamicImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.0.width(), self.0.height())
    }
}

impl std::fmt::Debug for PagePreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.dimensions();
        write!(f, "PagePreview({width}x{height})")
    }
}

/// A single page, either held by a scan session or belonging to a stored
/// document.
#[derive(Debug, Clone)]
pub struct ScanPage {
    pub id: PageId,
    /// Relative path of the persisted image. Write-once.
    image_path: Option<String>,
    pub adjustments: Adjustments,
    pub ocr_text: Option<String>,
    pub preview: Option<PagePreview>,
    /// Temporary full-resolution file for pages not yet persisted.
    pub source_path: Option<PathBuf>,
}

impl ScanPage {
    /// A freshly captured page backed by a temporary file.
    pub fn captured(id: PageId, source_path: PathBuf, preview: Option<PagePreview>) -> Self {
        Self {
            id,
            image_path: None,
            adjustments: Adjustments::default(),
            ocr_text: None,
            preview,
            source_path: Some(source_path),
        }
    }

    pub fn from_record(record: PageRecord) -> Self {
        Self {
            id: record.id,
            adjustments: record.adjustments(),
            image_path: record.image_path,
            ocr_text: record.ocr_text,
            preview: None,
            source_path: None,
        }
    }

    pub fn to_record(&self) -> PageRecord {
        PageRecord {
            id: self.id,
            image_path: self.image_path.clone(),
            rotation: self.adjustments.rotation,
            brightness: self.adjustments.brightness,
            contrast: self.adjustments.contrast,
            ocr_text: self.ocr_text.clone(),
        }
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    /// Record the persisted image location. Returns `false` (and changes
    /// nothing) if the page already has one.
    pub fn assign_image_path(&mut self, path: impl Into<String>) -> bool {
        if self.image_path.is_some() {
            return false;
        }
        self.image_path = Some(path.into());
        true
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Recognised text, if non-empty text is attached.
    pub fn text(&self) -> Option<&str> {
        self.ocr_text.as_deref().filter(|text| !text.is_empty())
    }

    /// The preview as a pipeline source.
    pub fn preview_source(&self) -> Option<SourceImage> {
        self.preview
            .as_ref()
            .map(|preview| SourceImage::from_dynamic(preview.image().clone()))
    }

    /// The preview rendered with this page's adjustments, for display.
    pub fn rendered_preview(&self) -> Option<DynamicImage> {
        self.preview_source()
            .map(|source| render_page(&source, &self.adjustments))
    }
}

/// A stored (or about-to-be-stored) multi-page document.
#[derive(Debug, Clone)]
pub struct ScanDocument {
    pub id: DocumentId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub pages: Vec<ScanPage>,
}

impl ScanDocument {
    /// A new document with a fresh id; both timestamps are now.
    pub fn new(title: impl Into<String>, tags: Vec<String>, pages: Vec<ScanPage>) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            tags,
            pages,
        }
    }

    pub fn from_record(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            created_at: record.created_at,
            updated_at: record.updated_at,
            tags: record.tags,
            pages: record.pages.into_iter().map(ScanPage::from_record).collect(),
        }
    }

    pub fn to_record(&self) -> DocumentRecord {
        DocumentRecord {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            tags: self.tags.clone(),
            pages: self.pages.iter().map(ScanPage::to_record).collect(),
        }
    }

    /// Non-empty page texts joined by a blank line.
    pub fn aggregated_text(&self) -> String {
        self.pages
            .iter()
            .filter_map(ScanPage::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Case-insensitive substring match on title, any tag, or the
    /// aggregated text. An empty query matches everything; whitespace is
    /// matched literally.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
            || self.aggregated_text().to_lowercase().contains(&needle)
    }
}
