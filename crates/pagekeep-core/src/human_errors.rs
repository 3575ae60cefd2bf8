// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the presentation layer.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Nothing here retries automatically; `retriable` only tells the UI whether
// offering a "Try again" button makes sense.

use crate::error::{ExportError, OcrError, PagekeepError, SessionError, StorageError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Temporary condition; trying again may work.
    Transient,
    /// User must do something (free space, pick another file, add text).
    ActionRequired,
    /// Cannot be fixed by retrying. The app or its data is unusable as-is.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether offering a retry makes sense.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `PagekeepError` into a `HumanError`.
pub fn humanize_error(err: &PagekeepError) -> HumanError {
    match err {
        PagekeepError::Storage(storage) => humanize_storage_error(storage),
        PagekeepError::Export(export) => humanize_export_error(export),
        PagekeepError::Ocr(ocr) => humanize_ocr_error(ocr),
        PagekeepError::Session(session) => humanize_session_error(session),

        PagekeepError::PageEdit(_) => HumanError {
            message: "That page doesn't exist any more.".into(),
            suggestion: "The document may have changed. Refresh the page list and try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PagekeepError::Config(detail) => HumanError {
            message: "The app's settings couldn't be used.".into(),
            suggestion: format!("Check the settings file, or delete it to restore defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PagekeepError::Worker(_) => HumanError {
            message: "A background task stopped unexpectedly.".into(),
            suggestion: "Try again. If this keeps happening, restart the app.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PagekeepError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PagekeepError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_storage_error(err: &StorageError) -> HumanError {
    match err {
        StorageError::DirectoryCreationFailed(_) => HumanError {
            message: "Your document library couldn't be opened.".into(),
            suggestion: "The app needs a place to keep your scans. Free up some storage space and restart the app.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        StorageError::ImageWriteFailed(_) => HumanError {
            message: "A page image couldn't be saved.".into(),
            suggestion: "Your device's storage may be full. Free up some space and save again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },
        StorageError::MetadataWriteFailed(_) => HumanError {
            message: "The document details couldn't be saved.".into(),
            suggestion: "Your previous version is still safe. Try saving again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        StorageError::MetadataReadFailed(_) => HumanError {
            message: "A saved document couldn't be read.".into(),
            suggestion: "The document's details file may be damaged. Other documents are not affected.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        StorageError::NotFound => HumanError {
            message: "That document couldn't be found.".into(),
            suggestion: "It may already have been deleted. Refresh your library.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        StorageError::Io(_) => HumanError {
            message: "Your document library had a storage problem.".into(),
            suggestion: "Try again. If this keeps happening, restart the app.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_export_error(err: &ExportError) -> HumanError {
    match err {
        ExportError::NoRenderableContent => HumanError {
            message: "There's nothing to export.".into(),
            suggestion: "This document has no page images. Add or rescan a page, then export again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        ExportError::WriteFailed(_) => HumanError {
            message: "The export file couldn't be created.".into(),
            suggestion: "Your device's storage may be full. Free up some space and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_ocr_error(err: &OcrError) -> HumanError {
    match err {
        OcrError::NoImage => HumanError {
            message: "This page has no image to read.".into(),
            suggestion: "Rescan the page, then try text recognition again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        OcrError::NoTextFound => HumanError {
            message: "No text was found on this page.".into(),
            suggestion: "Try increasing the contrast, or rescan with better lighting.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        OcrError::RecognitionFailed(_) => HumanError {
            message: "Text recognition didn't work on this scan.".into(),
            suggestion: "Try again. Make sure the text is clear and in focus.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_session_error(err: &SessionError) -> HumanError {
    match err {
        SessionError::NoActiveSession | SessionError::EmptySession => HumanError {
            message: "There are no scanned pages yet.".into(),
            suggestion: "Scan or import at least one page before saving.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        SessionError::ImageImportFailed(_) => HumanError {
            message: "That picture couldn't be added.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try a JPEG or PNG.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        SessionError::Edit(_) => HumanError {
            message: "That page doesn't exist any more.".into(),
            suggestion: "Refresh the page list and try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
