// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-set export — one JPEG per rendered page.

use std::path::{Path, PathBuf};

use pagekeep_core::error::ExportError;
use tracing::{info, instrument, warn};

use crate::image::{SourceImage, encode_jpeg, render_page};
use crate::model::ScanPage;

use super::{ExportOptions, artifact_file_name, ensure_dir};

/// Render and encode every resolvable page into `dest_dir`.
///
/// Per-page write failures are logged and skipped. Fails only when nothing
/// was produced.
#[instrument(skip(pages, options, resolve), fields(page_count = pages.len()))]
pub fn export_images<R>(
    pages: &[ScanPage],
    title: &str,
    dest_dir: &Path,
    options: &ExportOptions,
    resolve: R,
) -> Result<Vec<PathBuf>, ExportError>
where
    R: Fn(&ScanPage) -> Option<SourceImage>,
{
    ensure_dir(dest_dir)?;
    let numbered = pages.len() > 1;
    let mut files = Vec::new();
    let mut last_failure: Option<String> = None;

    for (index, page) in pages.iter().enumerate() {
        let Some(source) = resolve(page) else {
            warn!(page = index + 1, page_id = %page.id, "No image for page, skipping");
            continue;
        };

        let rendered = render_page(&source, &page.adjustments);
        let page_number = numbered.then_some(index + 1);
        let path = dest_dir.join(artifact_file_name(title, page_number, "jpg"));

        let written = encode_jpeg(&rendered, options.jpeg_quality)
            .map_err(|err| err.to_string())
            .and_then(|bytes| std::fs::write(&path, bytes).map_err(|err| err.to_string()));
        match written {
            Ok(()) => files.push(path),
            Err(reason) => {
                warn!(
                    page = index + 1,
                    path = %path.display(),
                    %reason,
                    "Failed to write page image"
                );
                last_failure = Some(reason);
            }
        }
    }

    if files.is_empty() {
        return Err(match last_failure {
            Some(reason) => ExportError::WriteFailed(reason),
            None => ExportError::NoRenderableContent,
        });
    }

    info!(files = files.len(), "Image set exported");
    Ok(files)
}
