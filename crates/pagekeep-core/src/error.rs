// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagekeep.

use thiserror::Error;

/// Failures of the document asset store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The storage root could not be created. The store is unusable.
    #[error("failed to create storage directory: {0}")]
    DirectoryCreationFailed(String),

    #[error("failed to save image: {0}")]
    ImageWriteFailed(String),

    #[error("failed to save metadata: {0}")]
    MetadataWriteFailed(String),

    #[error("failed to read metadata: {0}")]
    MetadataReadFailed(String),

    #[error("document not found")]
    NotFound,

    #[error("storage I/O error: {0}")]
    Io(String),
}

/// Failures of the export renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// None of the pages produced any output.
    #[error("nothing to export: no page has a renderable image")]
    NoRenderableContent,

    #[error("failed to write export: {0}")]
    WriteFailed(String),
}

/// Failures reported by a text-recognition collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OcrError {
    #[error("no image provided for text recognition")]
    NoImage,

    #[error("no text was found in the image")]
    NoTextFound,

    #[error("text recognition failed: {0}")]
    RecognitionFailed(String),
}

/// Index errors for page-list edits. Indices are never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageEditError {
    #[error("page index {index} out of range for {len} pages")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid page range {start}..{end} for {len} pages")]
    InvalidRange { start: usize, end: usize, len: usize },
}

/// Failures of the scan session buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no active scan session")]
    NoActiveSession,

    #[error("scan session has no pages")]
    EmptySession,

    #[error("failed to import page image: {0}")]
    ImageImportFailed(String),

    #[error(transparent)]
    Edit(#[from] PageEditError),
}

/// Top-level error type for all Pagekeep operations.
#[derive(Debug, Error)]
pub enum PagekeepError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    PageEdit(#[from] PageEditError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("background task failed: {0}")]
    Worker(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagekeepError>;
