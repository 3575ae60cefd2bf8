// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document asset store — one directory per document on the local filesystem.
//
// Layout:
//   <base>/<documentId>/metadata.json
//   <base>/<documentId>/<pageId>.jpg
//
// Page images are write-once: a page that already has an image path is never
// rewritten. New page files of a save are staged in `<base>/.staging-*` and
// only renamed into the document directory once every page has been written.
// Metadata is replaced atomically (temp file in the same directory, then
// rename), so a reader sees either the previous or the new version.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use pagekeep_core::error::StorageError;
use pagekeep_core::{DocumentId, DocumentRecord, PageId};
use pagekeep_document::image::{SourceImage, detect_format, downsample, encode_jpeg};
use pagekeep_document::{PagePreview, ScanDocument, ScanPage};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

/// Name of the per-document metadata file.
pub const METADATA_FILE: &str = "metadata.json";

const STAGING_PREFIX: &str = ".staging-";

/// Filesystem-backed store for documents and their page images.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    base: PathBuf,
    preview_max_dimension: u32,
    jpeg_quality: u8,
}

impl DocumentStore {
    /// Open (creating if needed) the store rooted at `base`.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::with_settings(base, 2000, 90)
    }

    /// Open with explicit preview bound and JPEG quality for transcoded pages.
    #[instrument(skip_all)]
    pub fn with_settings(
        base: impl Into<PathBuf>,
        preview_max_dimension: u32,
        jpeg_quality: u8,
    ) -> Result<Self, StorageError> {
        let base = base.into();
        fs::create_dir_all(&base).map_err(|err| {
            StorageError::DirectoryCreationFailed(format!("{}: {err}", base.display()))
        })?;
        info!(path = %base.display(), "Document store opened");
        Ok(Self {
            base,
            preview_max_dimension,
            jpeg_quality,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    fn document_dir(&self, id: DocumentId) -> PathBuf {
        self.base.join(id.to_string())
    }

    /// Absolute location of a page image. No I/O.
    pub fn resolve_image_file(&self, id: DocumentId, image_path: &str) -> PathBuf {
        self.document_dir(id).join(image_path)
    }

    /// Best full-resolution source for a stored page: its image file, or the
    /// preview if the file cannot be decoded.
    pub fn resolve_source(&self, id: DocumentId, page: &ScanPage) -> Option<SourceImage> {
        let from_file = page.image_path().and_then(|relative| {
            let path = self.resolve_image_file(id, relative);
            match SourceImage::open(&path) {
                Ok(source) => Some(source),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Page image unreadable");
                    None
                }
            }
        });
        from_file.or_else(|| page.preview_source())
    }

    /// Persist `document`: write images for pages that have none, then
    /// replace the metadata file. Returns the document with its image paths.
    #[instrument(skip(self, document), fields(id = %document.id, pages = document.pages.len()))]
    pub fn save(&self, document: &ScanDocument) -> Result<ScanDocument, StorageError> {
        let mut saved = document.clone();
        let dir = self.document_dir(saved.id);
        fs::create_dir_all(&dir).map_err(|err| {
            StorageError::ImageWriteFailed(format!("cannot create {}: {err}", dir.display()))
        })?;

        let assigned = self.write_new_pages(&dir, &saved.pages)?;
        for (index, file_name) in assigned {
            saved.pages[index].assign_image_path(file_name);
        }

        self.write_metadata(&dir, &saved.to_record())?;
        info!("Document saved");
        Ok(saved)
    }

    /// `save` with the updated timestamp refreshed to now.
    pub fn update(&self, document: &ScanDocument) -> Result<ScanDocument, StorageError> {
        let mut touched = document.clone();
        touched.touch();
        self.save(&touched)
    }

    /// Write image files for every page without an image path.
    ///
    /// Returns `(page index, file name)` for each page. Either every new file
    /// reaches `dir` or none does.
    fn write_new_pages(
        &self,
        dir: &Path,
        pages: &[ScanPage],
    ) -> Result<Vec<(usize, String)>, StorageError> {
        let pending: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.image_path().is_none())
            .map(|(index, _)| index)
            .collect();
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.base)
            .map_err(|err| {
                StorageError::ImageWriteFailed(format!("cannot create staging dir: {err}"))
            })?;

        let mut assigned = Vec::with_capacity(pending.len());
        let mut staged = Vec::new();
        for index in pending {
            let page = &pages[index];
            let file_name = page.id.image_file_name();
            if dir.join(&file_name).exists() {
                debug!(page_id = %page.id, "Reusing existing page image");
            } else {
                let bytes = self.page_bytes(page)?;
                fs::write(staging.path().join(&file_name), &bytes).map_err(|err| {
                    StorageError::ImageWriteFailed(format!("page {}: {err}", page.id))
                })?;
                debug!(page_id = %page.id, bytes = bytes.len(), "Page image staged");
                staged.push(file_name.clone());
            }
            assigned.push((index, file_name));
        }

        let mut moved: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for file_name in &staged {
            let target = dir.join(file_name);
            if let Err(err) = fs::rename(staging.path().join(file_name), &target) {
                for path in &moved {
                    let _ = fs::remove_file(path);
                }
                return Err(StorageError::ImageWriteFailed(format!(
                    "cannot move {file_name} into place: {err}"
                )));
            }
            moved.push(target);
        }

        info!(written = staged.len(), "Page images written");
        Ok(assigned)
    }

    /// Encoded JPEG bytes for a page that has not been persisted yet.
    fn page_bytes(&self, page: &ScanPage) -> Result<Vec<u8>, StorageError> {
        if let Some(source_path) = page.source_path() {
            let data = fs::read(source_path).map_err(|err| {
                StorageError::ImageWriteFailed(format!("page {}: {err}", page.id))
            })?;
            if detect_format(&data) == Some(ImageFormat::Jpeg) {
                return Ok(data);
            }
            let source = SourceImage::decode(&data).map_err(|err| {
                StorageError::ImageWriteFailed(format!("page {}: {err}", page.id))
            })?;
            return self.encode(page.id, &source);
        }

        if let Some(source) = page.preview_source() {
            return self.encode(page.id, &source);
        }

        Err(StorageError::ImageWriteFailed(format!(
            "page {} has no image source",
            page.id
        )))
    }

    fn encode(&self, id: PageId, source: &SourceImage) -> Result<Vec<u8>, StorageError> {
        encode_jpeg(&source.normalized(), self.jpeg_quality)
            .map_err(|err| StorageError::ImageWriteFailed(format!("page {id}: {err}")))
    }

    fn write_metadata(&self, dir: &Path, record: &DocumentRecord) -> Result<(), StorageError> {
        let json = record
            .to_json()
            .map_err(|err| StorageError::MetadataWriteFailed(err.to_string()))?;

        let mut temp = NamedTempFile::new_in(dir)
            .map_err(|err| StorageError::MetadataWriteFailed(err.to_string()))?;
        temp.write_all(&json)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| StorageError::MetadataWriteFailed(err.to_string()))?;
        temp.persist(dir.join(METADATA_FILE))
            .map_err(|err| StorageError::MetadataWriteFailed(err.error.to_string()))?;
        Ok(())
    }

    /// Load a single document with page previews.
    #[instrument(skip(self))]
    pub fn load(&self, id: DocumentId) -> Result<ScanDocument, StorageError> {
        let path = self.document_dir(id).join(METADATA_FILE);
        if !path.is_file() {
            return Err(StorageError::NotFound);
        }
        self.read_document(&path)
    }

    /// Load every document, most recently updated first.
    ///
    /// Directories without metadata are skipped silently; unreadable
    /// metadata is logged and skipped.
    #[instrument(skip(self))]
    pub fn load_all(&self) -> Result<Vec<ScanDocument>, StorageError> {
        let entries = fs::read_dir(&self.base).map_err(|err| {
            StorageError::Io(format!("cannot list {}: {err}", self.base.display()))
        })?;

        let mut documents = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            let metadata_path = entry.path().join(METADATA_FILE);
            if !metadata_path.is_file() {
                continue;
            }
            match self.read_document(&metadata_path) {
                Ok(document) => documents.push(document),
                Err(err) => {
                    warn!(path = %metadata_path.display(), error = %err, "Skipping document")
                }
            }
        }

        documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        info!(count = documents.len(), "Documents loaded");
        Ok(documents)
    }

    fn read_document(&self, metadata_path: &Path) -> Result<ScanDocument, StorageError> {
        let data = fs::read(metadata_path)
            .map_err(|err| StorageError::MetadataReadFailed(err.to_string()))?;
        let record = DocumentRecord::from_json(&data)
            .map_err(|err| StorageError::MetadataReadFailed(err.to_string()))?;

        let mut document = ScanDocument::from_record(record);
        for page in &mut document.pages {
            if let Some(relative) = page.image_path() {
                let file = self.resolve_image_file(document.id, relative);
                page.preview = downsample(&file, self.preview_max_dimension).map(PagePreview::new);
            }
        }
        Ok(document)
    }

    /// Remove a document directory and everything in it.
    #[instrument(skip(self))]
    pub fn delete(&self, id: DocumentId) -> Result<(), StorageError> {
        let dir = self.document_dir(id);
        if !dir.is_dir() {
            return Err(StorageError::NotFound);
        }
        fs::remove_dir_all(&dir)
            .map_err(|err| StorageError::Io(format!("cannot remove {}: {err}", dir.display())))?;
        info!("Document deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use pagekeep_core::{Adjustments, Rotation};
    use pagekeep_document::image::encode_png;

    fn sample_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7) as u8, (y * 5) as u8, 80])
        }))
    }

    fn captured_page(dir: &Path, bytes: &[u8], ext: &str) -> ScanPage {
        let id = PageId::new();
        let path = dir.join(format!("{id}.{ext}"));
        fs::write(&path, bytes).unwrap();
        ScanPage::captured(id, path, None)
    }

    fn open_store() -> (tempfile::TempDir, tempfile::TempDir, DocumentStore) {
        let root = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(root.path().join("documents")).unwrap();
        (root, scratch, store)
    }

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn save_then_load_all_round_trips() {
        let (_root, scratch, store) = open_store();
        let jpeg = encode_jpeg(&sample_image(64, 48), 90).unwrap();
        let mut first = captured_page(scratch.path(), &jpeg, "jpg");
        first.adjustments = Adjustments::new(Rotation::QUARTER, 0.2, 1.5);
        first.ocr_text = Some("Total: $42".into());
        let second = captured_page(scratch.path(), &jpeg, "jpg");

        let document = ScanDocument::new("Invoice", vec!["Tax".into()], vec![first, second]);
        let saved = store.save(&document).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        let back = &loaded[0];
        assert_eq!(back.id, document.id);
        assert_eq!(back.title, "Invoice");
        assert_eq!(back.tags, vec!["Tax".to_string()]);
        assert_eq!(back.pages.len(), 2);
        for (original, restored) in document.pages.iter().zip(&back.pages) {
            assert_eq!(original.id, restored.id);
            assert_eq!(original.adjustments, restored.adjustments);
            assert!(restored.preview.is_some());
        }
        assert_eq!(back.pages[0].ocr_text.as_deref(), Some("Total: $42"));

        // Stored bytes are the captured JPEG, independently decodable.
        let relative = saved.pages[0].image_path().unwrap();
        let file = store.resolve_image_file(saved.id, relative);
        assert_eq!(fs::read(&file).unwrap(), jpeg);
        assert!(image::open(&file).is_ok());
    }

    #[test]
    fn non_jpeg_sources_are_transcoded() {
        let (_root, scratch, store) = open_store();
        let png = encode_png(&sample_image(20, 10)).unwrap();
        let page = captured_page(scratch.path(), &png, "png");

        let saved = store.save(&ScanDocument::new("Png", Vec::new(), vec![page])).unwrap();
        let file = store.resolve_image_file(saved.id, saved.pages[0].image_path().unwrap());
        let bytes = fs::read(file).unwrap();
        assert_eq!(detect_format(&bytes), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn existing_image_files_are_never_rewritten() {
        let (_root, scratch, store) = open_store();
        let jpeg = encode_jpeg(&sample_image(16, 16), 90).unwrap();
        let page = captured_page(scratch.path(), &jpeg, "jpg");
        let saved = store.save(&ScanDocument::new("Once", Vec::new(), vec![page])).unwrap();
        let file = store.resolve_image_file(saved.id, saved.pages[0].image_path().unwrap());
        let before = fs::read(&file).unwrap();

        let mut edited = saved.clone();
        edited.pages[0].adjustments.rotation = Rotation::HALF;
        edited.pages[0].source_path = None;
        let updated = store.update(&edited).unwrap();

        assert_eq!(fs::read(&file).unwrap(), before);
        assert!(updated.updated_at >= saved.updated_at);
        let reloaded = store.load(saved.id).unwrap();
        assert_eq!(reloaded.pages[0].adjustments.rotation, Rotation::HALF);
    }

    #[test]
    fn failed_page_write_leaves_no_new_files() {
        let (_root, scratch, store) = open_store();
        let jpeg = encode_jpeg(&sample_image(8, 8), 90).unwrap();
        let good = captured_page(scratch.path(), &jpeg, "jpg");
        let mut missing = captured_page(scratch.path(), &jpeg, "jpg");
        missing.source_path = Some(scratch.path().join("vanished.jpg"));
        let sourceless = ScanPage::captured(PageId::new(), scratch.path().join("gone.jpg"), None);

        let document = ScanDocument::new("Broken", Vec::new(), vec![good, missing, sourceless]);
        let err = store.save(&document).unwrap_err();
        assert!(matches!(err, StorageError::ImageWriteFailed(_)));

        let dir = store.base_path().join(document.id.to_string());
        assert!(names_in(&dir).is_empty());
        // No staging directories left behind either.
        assert_eq!(names_in(store.base_path()), vec![document.id.to_string()]);
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn page_without_any_source_is_reported() {
        let (_root, _scratch, store) = open_store();
        let mut page = ScanPage::captured(PageId::new(), PathBuf::from("unused"), None);
        page.source_path = None;
        let err = store
            .save(&ScanDocument::new("Empty", Vec::new(), vec![page.clone()]))
            .unwrap_err();
        assert_eq!(
            err,
            StorageError::ImageWriteFailed(format!("page {} has no image source", page.id))
        );
    }

    #[test]
    fn preview_is_used_when_no_source_file() {
        let (_root, _scratch, store) = open_store();
        let mut page = ScanPage::captured(PageId::new(), PathBuf::from("unused"), None);
        page.source_path = None;
        page.preview = Some(PagePreview::new(sample_image(12, 9)));

        let saved = store.save(&ScanDocument::new("Preview", Vec::new(), vec![page])).unwrap();
        let file = store.resolve_image_file(saved.id, saved.pages[0].image_path().unwrap());
        let decoded = image::open(file).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 9));
    }

    #[test]
    fn load_all_sorts_newest_first_and_skips_junk() {
        let (_root, scratch, store) = open_store();
        let jpeg = encode_jpeg(&sample_image(8, 8), 90).unwrap();

        let older_page = captured_page(scratch.path(), &jpeg, "jpg");
        let older = store
            .save(&ScanDocument::new("Older", Vec::new(), vec![older_page]))
            .unwrap();
        let newer_page = captured_page(scratch.path(), &jpeg, "jpg");
        let mut newer = ScanDocument::new("Newer", Vec::new(), vec![newer_page]);
        newer.updated_at = older.updated_at + chrono::TimeDelta::seconds(10);
        store.save(&newer).unwrap();

        fs::create_dir_all(store.base_path().join("no-metadata")).unwrap();
        let corrupt = store.base_path().join(DocumentId::new().to_string());
        fs::create_dir_all(&corrupt).unwrap();
        fs::write(corrupt.join(METADATA_FILE), b"{ not json").unwrap();

        let titles: Vec<String> = store.load_all().unwrap().into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["Newer".to_string(), "Older".to_string()]);
    }

    #[test]
    fn load_reports_missing_and_corrupt_metadata() {
        let (_root, _scratch, store) = open_store();
        assert!(matches!(store.load(DocumentId::new()), Err(StorageError::NotFound)));

        let id = DocumentId::new();
        let dir = store.base_path().join(id.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(METADATA_FILE), b"[]").unwrap();
        assert!(matches!(store.load(id), Err(StorageError::MetadataReadFailed(_))));
    }

    #[test]
    fn delete_removes_document_and_rejects_unknown_ids() {
        let (_root, scratch, store) = open_store();
        let jpeg = encode_jpeg(&sample_image(8, 8), 90).unwrap();
        let page = captured_page(scratch.path(), &jpeg, "jpg");
        let saved = store
            .save(&ScanDocument::new("Doomed", Vec::new(), vec![page]))
            .unwrap();

        store.delete(saved.id).unwrap();
        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.delete(saved.id), Err(StorageError::NotFound));
    }

    #[test]
    fn resolve_image_file_is_a_pure_join() {
        let store = DocumentStore {
            base: PathBuf::from("/nowhere"),
            preview_max_dimension: 10,
            jpeg_quality: 90,
        };
        let id = DocumentId::new();
        assert_eq!(
            store.resolve_image_file(id, "p.jpg"),
            PathBuf::from(format!("/nowhere/{id}/p.jpg"))
        );
    }

    #[test]
    fn unusable_root_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let err = DocumentStore::open(blocker.join("documents")).unwrap_err();
        assert!(matches!(err, StorageError::DirectoryCreationFailed(_)));
    }
}
