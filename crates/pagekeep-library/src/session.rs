// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session buffer — the uncommitted draft document.
//
// Captured or imported pages are copied into a per-buffer scratch directory
// at full resolution and decoded once into a bounded preview. Nothing here
// touches the document store; `to_document` produces a `ScanDocument` the
// store can persist, after which the caller clears the session.

use std::fs;
use std::ops::Range;
use std::path::Path;

use chrono::Local;
use pagekeep_core::error::SessionError;
use pagekeep_core::{Adjustments, PageId};
use pagekeep_document::image::codec::extension_for;
use pagekeep_document::image::{SourceImage, detect_format, downsample};
use pagekeep_document::{PagePreview, ScanDocument, ScanPage, pages};
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

const SCRATCH_PREFIX: &str = "session-";

/// Title used when auto-naming is off.
pub const UNTITLED_SESSION: &str = "Untitled Scan";

/// Title for a session started now.
pub fn default_title(auto_naming: bool) -> String {
    if auto_naming {
        Local::now().format("Scan %Y-%m-%d %H%M").to_string()
    } else {
        UNTITLED_SESSION.to_string()
    }
}

/// The draft: same shape as a document, never carrying stored image paths.
#[derive(Debug, Clone)]
pub struct ScanSession {
    pub title: String,
    pub tags: Vec<String>,
    pub pages: Vec<ScanPage>,
}

/// Owns the active session and its scratch files.
///
/// Scratch files are removed with their page, on `clear`, and when the
/// buffer is dropped.
pub struct SessionBuffer {
    scratch: TempDir,
    preview_max_dimension: u32,
    auto_naming: bool,
    session: Option<ScanSession>,
}

impl SessionBuffer {
    /// Create a buffer whose scratch directory lives under `scratch_root`.
    ///
    /// Scratch directories left by earlier buffers that never dropped are
    /// removed first.
    pub fn new(
        scratch_root: &Path,
        preview_max_dimension: u32,
        auto_naming: bool,
    ) -> std::io::Result<Self> {
        fs::create_dir_all(scratch_root)?;
        sweep_stale_scratch(scratch_root);
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(scratch_root)?;
        debug!(path = %scratch.path().display(), "Session scratch directory created");
        Ok(Self {
            scratch,
            preview_max_dimension,
            auto_naming,
            session: None,
        })
    }

    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Begin a new, empty session, discarding any current one.
    pub fn start(&mut self, title: Option<String>, tags: Vec<String>) {
        self.clear();
        let title = title.unwrap_or_else(|| default_title(self.auto_naming));
        info!(%title, "Scan session started");
        self.session = Some(ScanSession {
            title,
            tags,
            pages: Vec::new(),
        });
    }

    fn active_mut(&mut self) -> Result<&mut ScanSession, SessionError> {
        self.session.as_mut().ok_or(SessionError::NoActiveSession)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), SessionError> {
        self.active_mut()?.title = title.into();
        Ok(())
    }

    pub fn set_tags(&mut self, tags: Vec<String>) -> Result<(), SessionError> {
        self.active_mut()?.tags = tags;
        Ok(())
    }

    /// Append a page from encoded image bytes, starting a session if none is
    /// active. Undecodable input leaves the session unchanged.
    #[instrument(skip(self, data), fields(data_len = data.len()))]
    pub fn append_page(&mut self, data: &[u8]) -> Result<PageId, SessionError> {
        let format = detect_format(data)
            .ok_or_else(|| SessionError::ImageImportFailed("unrecognised image format".into()))?;

        let id = PageId::new();
        let path = self.scratch.path().join(format!("{id}.{}", extension_for(format, data)));
        fs::write(&path, data)
            .map_err(|err| SessionError::ImageImportFailed(format!("cannot store page: {err}")))?;

        let Some(preview) = downsample(&path, self.preview_max_dimension) else {
            remove_scratch_file(&path);
            return Err(SessionError::ImageImportFailed("image could not be decoded".into()));
        };

        if self.session.is_none() {
            self.start(None, Vec::new());
        }
        let session = self.active_mut()?;
        session
            .pages
            .push(ScanPage::captured(id, path, Some(PagePreview::new(preview))));
        info!(page_id = %id, pages = session.pages.len(), "Page added to session");
        Ok(id)
    }

    /// Append a page from an image file on disk.
    pub fn append_file(&mut self, path: &Path) -> Result<PageId, SessionError> {
        let data = fs::read(path).map_err(|err| {
            SessionError::ImageImportFailed(format!("{}: {err}", path.display()))
        })?;
        self.append_page(&data)
    }

    pub fn remove_page(&mut self, index: usize) -> Result<(), SessionError> {
        let removed = pages::remove_page(&mut self.active_mut()?.pages, index)?;
        if let Some(path) = removed.source_path() {
            remove_scratch_file(path);
        }
        Ok(())
    }

    pub fn rotate_page(&mut self, index: usize) -> Result<(), SessionError> {
        pages::rotate_page(&mut self.active_mut()?.pages, index)?;
        Ok(())
    }

    pub fn move_pages(&mut self, range: Range<usize>, to: usize) -> Result<(), SessionError> {
        pages::move_pages(&mut self.active_mut()?.pages, range, to)?;
        Ok(())
    }

    pub fn set_adjustments(
        &mut self,
        index: usize,
        adjustments: Adjustments,
    ) -> Result<(), SessionError> {
        pages::set_adjustments(&mut self.active_mut()?.pages, index, adjustments)?;
        Ok(())
    }

    pub fn attach_text(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        pages::attach_text(&mut self.active_mut()?.pages, index, text)?;
        Ok(())
    }

    /// Drop the session and its scratch files.
    pub fn clear(&mut self) {
        if let Some(session) = self.session.take() {
            for page in &session.pages {
                if let Some(path) = page.source_path() {
                    remove_scratch_file(path);
                }
            }
            debug!(pages = session.pages.len(), "Scan session cleared");
        }
    }

    /// Snapshot the session as a new document with a fresh id.
    pub fn to_document(&self) -> Result<ScanDocument, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoActiveSession)?;
        if session.pages.is_empty() {
            return Err(SessionError::EmptySession);
        }
        Ok(ScanDocument::new(
            session.title.clone(),
            session.tags.clone(),
            session.pages.clone(),
        ))
    }

    /// Best source for a session page: the full-resolution scratch file,
    /// falling back to the preview.
    pub fn resolve_source(page: &ScanPage) -> Option<SourceImage> {
        page.source_path()
            .and_then(|path| SourceImage::open(path).ok())
            .or_else(|| page.preview_source())
    }
}

fn sweep_stale_scratch(scratch_root: &Path) {
    let entries = match fs::read_dir(scratch_root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %scratch_root.display(), error = %err, "Cannot list scratch root");
            return;
        }
    };
    for entry in entries.flatten() {
        let stale = entry.file_name().to_string_lossy().starts_with(SCRATCH_PREFIX)
            && entry.file_type().is_ok_and(|kind| kind.is_dir());
        if !stale {
            continue;
        }
        let path = entry.path();
        match fs::remove_dir_all(&path) {
            Ok(()) => info!(path = %path.display(), "Removed stale session scratch"),
            Err(err) => warn!(path = %path.display(), error = %err, "Stale scratch not removed"),
        }
    }
}

fn remove_scratch_file(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %err, "Failed to remove scratch file");
    }
}
