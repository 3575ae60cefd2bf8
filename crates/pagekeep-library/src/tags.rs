// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tag registry — the persisted set of known tags.
//
// Stored as `{ "initialized": bool, "tags": [..] }`. The first load seeds the
// default tags; after that the user owns the list.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use pagekeep_core::error::StorageError;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const TAGS_FILE: &str = "tags.json";

pub const DEFAULT_TAGS: [&str; 14] = [
    "Receipt",
    "Invoice",
    "Contract",
    "Letter",
    "Form",
    "Personal",
    "Business",
    "Tax",
    "Medical",
    "Legal",
    "Education",
    "Travel",
    "Insurance",
    "Important",
];

#[derive(Debug, Default, Serialize, Deserialize)]
struct TagFile {
    #[serde(default)]
    initialized: bool,
    #[serde(default)]
    tags: Vec<String>,
}

/// Sorted, case-insensitively unique tag names.
#[derive(Debug)]
pub struct TagRegistry {
    path: PathBuf,
    tags: Vec<String>,
}

impl TagRegistry {
    /// Load `tags.json` from `dir`, seeding the defaults on first use.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join(TAGS_FILE);
        let file = match fs::read(&path) {
            Ok(data) => serde_json::from_slice::<TagFile>(&data).map_err(|err| {
                StorageError::MetadataReadFailed(format!("{}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => TagFile::default(),
            Err(err) => return Err(StorageError::Io(format!("{}: {err}", path.display()))),
        };

        let mut registry = Self {
            path,
            tags: Vec::new(),
        };
        if file.initialized {
            for tag in file.tags {
                registry.insert(&tag);
            }
        } else {
            for tag in DEFAULT_TAGS {
                registry.insert(tag);
            }
            registry.persist()?;
            info!(count = registry.tags.len(), "Tag registry seeded");
        }
        Ok(registry)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Tags containing `query`, case-insensitively. Empty returns all.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let needle = query.to_lowercase();
        self.tags
            .iter()
            .filter(|tag| needle.is_empty() || tag.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    fn contains_ignore_case(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == needle)
    }

    fn insert(&mut self, raw: &str) -> bool {
        let tag = raw.trim();
        if tag.is_empty() || self.contains_ignore_case(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        self.tags.sort_by_key(|t| t.to_lowercase());
        true
    }

    /// Add a tag. Returns whether the registry changed.
    pub fn add(&mut self, tag: &str) -> Result<bool, StorageError> {
        let changed = self.insert(tag);
        if changed {
            self.persist()?;
            debug!(tag = tag.trim(), "Tag added");
        }
        Ok(changed)
    }

    /// Remove an exactly matching tag. Returns whether the registry changed.
    pub fn remove(&mut self, tag: &str) -> Result<bool, StorageError> {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        let changed = self.tags.len() != before;
        if changed {
            self.persist()?;
            debug!(tag, "Tag removed");
        }
        Ok(changed)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let file = TagFile {
            initialized: true,
            tags: self.tags.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|err| StorageError::MetadataWriteFailed(err.to_string()))?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|err| StorageError::MetadataWriteFailed(err.to_string()))?;
        let mut temp = NamedTempFile::new_in(dir)
            .map_err(|err| StorageError::MetadataWriteFailed(err.to_string()))?;
        temp.write_all(&json)
            .map_err(|err| StorageError::MetadataWriteFailed(err.to_string()))?;
        temp.persist(&self.path)
            .map_err(|err| StorageError::MetadataWriteFailed(err.error.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_open_seeds_sorted_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TagRegistry::open(dir.path()).unwrap();
        assert_eq!(registry.tags().len(), DEFAULT_TAGS.len());
        assert_eq!(registry.tags().first().map(String::as_str), Some("Business"));
        assert_eq!(registry.tags().last().map(String::as_str), Some("Travel"));
        assert!(dir.path().join(TAGS_FILE).exists());
    }

    #[test]
    fn removed_defaults_stay_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = TagRegistry::open(dir.path()).unwrap();
        assert!(registry.remove("Tax").unwrap());
        assert!(!registry.remove("Tax").unwrap());
        assert!(!registry.remove("receipt").unwrap());

        let reopened = TagRegistry::open(dir.path()).unwrap();
        assert!(!reopened.tags().iter().any(|t| t == "Tax"));
        assert_eq!(reopened.tags().len(), DEFAULT_TAGS.len() - 1);
    }

    #[test]
    fn add_trims_and_ignores_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = TagRegistry::open(dir.path()).unwrap();
        assert!(registry.add("  Warranty ").unwrap());
        assert!(!registry.add("warranty").unwrap());
        assert!(!registry.add("INVOICE").unwrap());
        assert!(!registry.add("   ").unwrap());

        let reopened = TagRegistry::open(dir.path()).unwrap();
        assert!(reopened.tags().iter().any(|t| t == "Warranty"));
        assert_eq!(reopened.tags().len(), DEFAULT_TAGS.len() + 1);
    }

    #[test]
    fn search_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TagRegistry::open(dir.path()).unwrap();
        assert_eq!(registry.search("AL"), vec!["Legal", "Medical", "Personal"]);
        assert_eq!(registry.search("").len(), DEFAULT_TAGS.len());
        assert!(registry.search(" ").is_empty());
        assert!(registry.search("Tax ").is_empty());
    }

    #[test]
    fn uninitialized_file_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let stale = br#"{"initialized": false, "tags": ["Old"]}"#;
        fs::write(dir.path().join(TAGS_FILE), stale).unwrap();
        let registry = TagRegistry::open(dir.path()).unwrap();
        assert_eq!(registry.tags().len(), DEFAULT_TAGS.len());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TAGS_FILE), b"{{{").unwrap();
        assert!(matches!(
            TagRegistry::open(dir.path()),
            Err(StorageError::MetadataReadFailed(_))
        ));
    }
}
