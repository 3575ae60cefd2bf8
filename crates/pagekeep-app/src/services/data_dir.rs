// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

/// Environment override for the data directory.
pub const DATA_DIR_ENV: &str = "PAGEKEEP_DATA_DIR";

/// Return the application data directory, creating it if needed.
///
/// `$PAGEKEEP_DATA_DIR`, else `$XDG_DATA_HOME/pagekeep`, else
/// `~/.local/share/pagekeep`, else `/tmp/pagekeep`.
pub fn data_dir() -> PathBuf {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => dirs_fallback().join("pagekeep"),
    };
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Return a subdirectory inside `base` (e.g. "documents", "exports"),
/// creating it if needed.
pub fn data_subdir(base: &Path, name: &str) -> PathBuf {
    let dir = base.join(name);
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn dirs_fallback() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    PathBuf::from("/tmp")
}
