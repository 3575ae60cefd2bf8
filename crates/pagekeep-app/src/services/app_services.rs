// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — initialises the backend subsystems and provides
// async methods for the front end to call.
//
// The library, the scan session, and the tag registry each have a single
// owner behind a `tokio::sync::Mutex`. Every operation takes the owned guard
// onto a blocking worker thread, so mutations are serialised and file I/O
// or decoding never runs on the async executor.

use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use pagekeep_core::error::{PageEditError, PagekeepError, Result, SessionError, StorageError};
use pagekeep_core::{Adjustments, AppConfig, DocumentId, ExportFormat, PageId};
use pagekeep_document::export::{ExportArtifact, ExportOptions, export};
use pagekeep_document::{ScanDocument, ScanPage, TextRecognizer, recognize_page};
use pagekeep_library::{
    DocumentStore, Library, LibraryEvent, ScanSession, SessionBuffer, TagRegistry,
};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tracing::{info, instrument};

use super::data_dir::data_subdir;

const CONFIG_FILE: &str = "config.json";

/// Shared application services.
///
/// All fields are cheaply cloneable (Arc-wrapped) so the struct can be moved
/// into tasks freely.
#[derive(Clone)]
pub struct AppServices {
    library: Arc<AsyncMutex<Library>>,
    session: Arc<AsyncMutex<SessionBuffer>>,
    tags: Arc<AsyncMutex<Option<TagRegistry>>>,
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

/// Run `work` on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PagekeepError::Worker(err.to_string()))?
}

fn page_at(document: &ScanDocument, index: usize) -> std::result::Result<ScanPage, PageEditError> {
    document
        .pages
        .get(index)
        .cloned()
        .ok_or(PageEditError::IndexOutOfRange {
            index,
            len: document.pages.len(),
        })
}

impl AppServices {
    /// Initialise all services rooted at `data_dir`. Call once at startup.
    ///
    /// Fails if the document store cannot be created; the caller should
    /// abort rather than run without storage.
    pub fn init(data_dir: PathBuf) -> Result<Self> {
        info!(path = %data_dir.display(), "initialising app services");

        // Load persisted config or use defaults
        let config = load_config(&data_dir).unwrap_or_default();

        let storage_dir = config
            .storage_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("documents"));
        let store = DocumentStore::with_settings(
            storage_dir,
            config.preview_max_dimension,
            config.jpeg_quality,
        )?;
        let library = Library::open(store)?;

        let session = SessionBuffer::new(
            &data_subdir(&data_dir, "scratch"),
            config.preview_max_dimension,
            config.auto_naming,
        )?;

        info!(documents = library.documents().len(), "app services initialised");

        Ok(Self {
            library: Arc::new(AsyncMutex::new(library)),
            session: Arc::new(AsyncMutex::new(session)),
            tags: Arc::new(AsyncMutex::new(None)),
            data_dir,
            config: Arc::new(Mutex::new(config)),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Where exports go when the caller names no destination.
    pub fn export_dir(&self) -> PathBuf {
        self.config()
            .export_dir
            .unwrap_or_else(|| self.data_dir.join("exports"))
    }

    async fn with_library<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut Library) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut guard = Arc::clone(&self.library).lock_owned().await;
        run_blocking(move || work(&mut guard)).await
    }

    async fn with_session<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut SessionBuffer) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut guard = Arc::clone(&self.session).lock_owned().await;
        run_blocking(move || work(&mut guard)).await
    }

    async fn with_tags<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut TagRegistry) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut guard = Arc::clone(&self.tags).lock_owned().await;
        let dir = self.data_dir.clone();
        run_blocking(move || {
            let mut registry = match guard.take() {
                Some(registry) => registry,
                None => TagRegistry::open(&dir)?,
            };
            let result = work(&mut registry);
            *guard = Some(registry);
            result
        })
        .await
    }

    // -- Library -------------------------------------------------------------

    /// Snapshot of every document, most recently updated first.
    pub async fn documents(&self) -> Vec<ScanDocument> {
        self.library.lock().await.documents().to_vec()
    }

    pub async fn search(&self, query: &str) -> Vec<ScanDocument> {
        let library = self.library.lock().await;
        library.search(query).into_iter().cloned().collect()
    }

    pub async fn document(&self, id: DocumentId) -> Result<ScanDocument> {
        let library = self.library.lock().await;
        library
            .get(id)
            .cloned()
            .ok_or(PagekeepError::Storage(StorageError::NotFound))
    }

    /// Receive a `LibraryEvent` after every change to the library.
    pub async fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.library.lock().await.subscribe()
    }

    pub async fn reload(&self) -> Result<usize> {
        self.with_library(|library| library.reload()).await
    }

    pub async fn update_metadata(
        &self,
        id: DocumentId,
        title: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<ScanDocument> {
        self.with_library(move |library| library.update_metadata(id, title, tags))
            .await
    }

    pub async fn set_page_adjustments(
        &self,
        id: DocumentId,
        index: usize,
        adjustments: Adjustments,
    ) -> Result<ScanDocument> {
        self.with_library(move |library| library.set_page_adjustments(id, index, adjustments))
            .await
    }

    pub async fn rotate_page(&self, id: DocumentId, index: usize) -> Result<ScanDocument> {
        self.with_library(move |library| library.rotate_page(id, index))
            .await
    }

    pub async fn remove_page(&self, id: DocumentId, index: usize) -> Result<ScanDocument> {
        self.with_library(move |library| library.remove_page(id, index))
            .await
    }

    pub async fn move_pages(
        &self,
        id: DocumentId,
        range: Range<usize>,
        to: usize,
    ) -> Result<ScanDocument> {
        self.with_library(move |library| library.move_pages(id, range, to))
            .await
    }

    pub async fn attach_page_text(
        &self,
        id: DocumentId,
        index: usize,
        text: String,
    ) -> Result<ScanDocument> {
        self.with_library(move |library| library.attach_page_text(id, index, text))
            .await
    }

    pub async fn delete_document(&self, id: DocumentId) -> Result<()> {
        self.with_library(move |library| library.delete(id)).await
    }

    // -- Scan session --------------------------------------------------------

    /// Start a fresh session, discarding any current draft.
    pub async fn start_session(&self, title: Option<String>, tags: Vec<String>) -> Result<()> {
        self.with_session(move |session| {
            session.start(title, tags);
            Ok(())
        })
        .await
    }

    pub async fn session(&self) -> Option<ScanSession> {
        self.session.lock().await.session().cloned()
    }

    /// Add a page from encoded image bytes to the current session.
    pub async fn import_page(&self, data: Vec<u8>) -> Result<PageId> {
        self.with_session(move |session| Ok(session.append_page(&data)?))
            .await
    }

    pub async fn import_file(&self, path: PathBuf) -> Result<PageId> {
        self.with_session(move |session| Ok(session.append_file(&path)?))
            .await
    }

    pub async fn set_session_title(&self, title: String) -> Result<()> {
        self.with_session(move |session| Ok(session.set_title(title)?))
            .await
    }

    pub async fn set_session_tags(&self, tags: Vec<String>) -> Result<()> {
        self.with_session(move |session| Ok(session.set_tags(tags)?))
            .await
    }

    pub async fn rotate_session_page(&self, index: usize) -> Result<()> {
        self.with_session(move |session| Ok(session.rotate_page(index)?))
            .await
    }

    pub async fn remove_session_page(&self, index: usize) -> Result<()> {
        self.with_session(move |session| Ok(session.remove_page(index)?))
            .await
    }

    pub async fn move_session_pages(&self, range: Range<usize>, to: usize) -> Result<()> {
        self.with_session(move |session| Ok(session.move_pages(range, to)?))
            .await
    }

    pub async fn set_session_adjustments(
        &self,
        index: usize,
        adjustments: Adjustments,
    ) -> Result<()> {
        self.with_session(move |session| Ok(session.set_adjustments(index, adjustments)?))
            .await
    }

    pub async fn attach_session_text(&self, index: usize, text: String) -> Result<()> {
        self.with_session(move |session| Ok(session.attach_text(index, text)?))
            .await
    }

    pub async fn clear_session(&self) -> Result<()> {
        self.with_session(|session| {
            session.clear();
            Ok(())
        })
        .await
    }

    /// Commit the session to the library. The session is cleared only if
    /// the save succeeded.
    #[instrument(skip(self))]
    pub async fn save_session(&self) -> Result<ScanDocument> {
        // Lock order: session, then library.
        let mut session = Arc::clone(&self.session).lock_owned().await;
        let mut library = Arc::clone(&self.library).lock_owned().await;
        run_blocking(move || {
            let document = session.to_document()?;
            let saved = library.save(&document)?;
            session.clear();
            info!(id = %saved.id, pages = saved.pages.len(), "Session saved");
            Ok(saved)
        })
        .await
    }

    // -- Export --------------------------------------------------------------

    fn export_settings(
        &self,
        format: Option<ExportFormat>,
        dest: Option<PathBuf>,
    ) -> (ExportFormat, PathBuf, ExportOptions) {
        let config = self.config();
        let format = format.unwrap_or(config.default_export_format);
        let dest = dest.unwrap_or_else(|| self.export_dir());
        (format, dest, ExportOptions::from(&config))
    }

    /// Export a stored document. Rendering runs on a worker thread against a
    /// snapshot; the library stays available meanwhile.
    #[instrument(skip(self, dest))]
    pub async fn export_document(
        &self,
        id: DocumentId,
        format: Option<ExportFormat>,
        dest: Option<PathBuf>,
    ) -> Result<ExportArtifact> {
        let (document, store) = {
            let library = self.library.lock().await;
            let document = library.get(id).cloned().ok_or(StorageError::NotFound)?;
            (document, library.store().clone())
        };
        let (format, dest, options) = self.export_settings(format, dest);

        run_blocking(move || {
            let resolve = |page: &ScanPage| store.resolve_source(document.id, page);
            let title = &document.title;
            Ok(export(format, &document.pages, title, &dest, &options, resolve)?)
        })
        .await
    }

    /// Export the in-progress session without saving it.
    pub async fn export_session(
        &self,
        format: Option<ExportFormat>,
        dest: Option<PathBuf>,
    ) -> Result<ExportArtifact> {
        let session = self
            .session()
            .await
            .ok_or(SessionError::NoActiveSession)?;
        let (format, dest, options) = self.export_settings(format, dest);

        run_blocking(move || {
            let artifact = export(
                format,
                &session.pages,
                &session.title,
                &dest,
                &options,
                SessionBuffer::resolve_source,
            )?;
            Ok(artifact)
        })
        .await
    }

    // -- Text recognition ----------------------------------------------------

    /// Recognise the text of a stored page. Nothing is persisted; pass the
    /// result to `attach_page_text` to keep it. Dropping the future abandons
    /// the result.
    pub async fn recognize_document_page(
        &self,
        recognizer: Arc<dyn TextRecognizer>,
        id: DocumentId,
        index: usize,
    ) -> Result<String> {
        let (page, store) = {
            let library = self.library.lock().await;
            let document = library.get(id).ok_or(StorageError::NotFound)?;
            (page_at(document, index)?, library.store().clone())
        };

        run_blocking(move || {
            let source = store.resolve_source(id, &page);
            Ok(recognize_page(recognizer.as_ref(), source.as_ref(), &page.adjustments)?)
        })
        .await
    }

    /// Recognise the text of a session page; see `recognize_document_page`.
    pub async fn recognize_session_page(
        &self,
        recognizer: Arc<dyn TextRecognizer>,
        index: usize,
    ) -> Result<String> {
        let page = {
            let session = self.session.lock().await;
            let draft = session
                .session()
                .ok_or(SessionError::NoActiveSession)?;
            draft.pages.get(index).cloned().ok_or(PageEditError::IndexOutOfRange {
                index,
                len: draft.pages.len(),
            })?
        };

        run_blocking(move || {
            let source = SessionBuffer::resolve_source(&page);
            Ok(recognize_page(recognizer.as_ref(), source.as_ref(), &page.adjustments)?)
        })
        .await
    }

    /// Load the OCR models named by the config (or the default model dir).
    #[cfg(feature = "ocr")]
    pub async fn load_ocr_engine(&self) -> Result<Arc<dyn TextRecognizer>> {
        use pagekeep_document::{OcrConfig, OcrEngine};

        let config = OcrConfig::from_optional_dir(self.config().ocr_model_dir.as_deref());
        run_blocking(move || {
            let engine: Arc<dyn TextRecognizer> = Arc::new(OcrEngine::new(&config)?);
            Ok(engine)
        })
        .await
    }

    // -- Tags ----------------------------------------------------------------

    pub async fn tags(&self) -> Result<Vec<String>> {
        self.with_tags(|registry| Ok(registry.tags().to_vec())).await
    }

    pub async fn search_tags(&self, query: String) -> Result<Vec<String>> {
        self.with_tags(move |registry| {
            Ok(registry.search(&query).into_iter().map(str::to_owned).collect())
        })
        .await
    }

    pub async fn add_tag(&self, tag: String) -> Result<bool> {
        self.with_tags(move |registry| Ok(registry.add(&tag)?)).await
    }

    pub async fn remove_tag(&self, tag: String) -> Result<bool> {
        self.with_tags(move |registry| Ok(registry.remove(&tag)?)).await
    }

    // -- Config Persistence --------------------------------------------------

    /// Get a clone of the current config.
    pub fn config(&self) -> AppConfig {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Update and persist the config. Storage and preview settings take
    /// effect on the next start.
    pub fn update_config(&self, config: AppConfig) -> Result<()> {
        persist_config(&self.data_dir, &config)?;
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }
}

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

/// Write `config.json` through a temp file so a crash never leaves it
/// half-written.
fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::create_dir_all(data_dir)?;
    let mut temp = NamedTempFile::new_in(data_dir)?;
    temp.write_all(json.as_bytes())?;
    temp.persist(data_dir.join(CONFIG_FILE))
        .map_err(|err| PagekeepError::Io(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use pagekeep_core::Rotation;
    use pagekeep_core::error::OcrError;
    use pagekeep_document::image::encode_jpeg;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 190, 180]));
        encode_jpeg(&DynamicImage::ImageRgb8(img), 90).unwrap()
    }

    fn services() -> (tempfile::TempDir, AppServices) {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::init(dir.path().to_path_buf()).unwrap();
        (dir, services)
    }

    /// Answers with the rendered image size, proving it saw the adjusted page.
    struct DimensionsRecognizer;

    impl TextRecognizer for DimensionsRecognizer {
        fn recognize(&self, image: &DynamicImage) -> std::result::Result<String, OcrError> {
            Ok(format!("{}x{}", image.width(), image.height()))
        }
    }

    #[tokio::test]
    async fn save_session_commits_and_clears() {
        let (_dir, services) = services();
        services
            .start_session(Some("Receipts".into()), vec!["Tax".into()])
            .await
            .unwrap();
        services.import_page(jpeg(40, 30)).await.unwrap();
        services.import_page(jpeg(40, 30)).await.unwrap();

        let saved = services.save_session().await.unwrap();
        assert_eq!(saved.pages.len(), 2);
        assert!(saved.pages.iter().all(|p| p.image_path().is_some()));
        assert!(services.session().await.is_none());

        let documents = services.documents().await;
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, "Receipts");
    }

    #[tokio::test]
    async fn saving_without_pages_keeps_nothing() {
        let (_dir, services) = services();
        assert!(matches!(
            services.save_session().await,
            Err(PagekeepError::Session(SessionError::NoActiveSession))
        ));
        services.start_session(None, Vec::new()).await.unwrap();
        assert!(matches!(
            services.save_session().await,
            Err(PagekeepError::Session(SessionError::EmptySession))
        ));
        assert!(services.session().await.is_some());
    }

    #[tokio::test]
    async fn bad_import_is_reported() {
        let (_dir, services) = services();
        let err = services.import_page(b"garbage".to_vec()).await.unwrap_err();
        assert!(matches!(
            err,
            PagekeepError::Session(SessionError::ImageImportFailed(_))
        ));
        assert!(services.session().await.is_none());
    }

    #[tokio::test]
    async fn library_events_reach_subscribers() {
        let (_dir, services) = services();
        let mut events = services.subscribe().await;
        services.import_page(jpeg(10, 10)).await.unwrap();
        let saved = services.save_session().await.unwrap();
        services.delete_document(saved.id).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), LibraryEvent::Saved(saved.id));
        assert_eq!(events.recv().await.unwrap(), LibraryEvent::Deleted(saved.id));
    }

    #[tokio::test]
    async fn export_uses_configured_defaults() {
        let (dir, services) = services();
        services
            .start_session(Some("Statement".into()), Vec::new())
            .await
            .unwrap();
        services.import_page(jpeg(60, 80)).await.unwrap();
        let saved = services.save_session().await.unwrap();

        let artifact = services.export_document(saved.id, None, None).await.unwrap();
        assert_eq!(artifact.format, ExportFormat::Pdf);
        assert_eq!(artifact.files, vec![dir.path().join("exports").join("Statement.pdf")]);
        assert!(artifact.files[0].exists());

        let text = services
            .export_document(saved.id, Some(ExportFormat::Text), Some(dir.path().join("out")))
            .await
            .unwrap();
        let body = std::fs::read_to_string(&text.files[0]).unwrap();
        assert_eq!(body, pagekeep_document::export::NO_TEXT_PLACEHOLDER);
    }

    #[tokio::test]
    async fn recognition_returns_text_without_persisting() {
        let (_dir, services) = services();
        services.import_page(jpeg(50, 20)).await.unwrap();
        services.rotate_session_page(0).await.unwrap();
        let recognizer: Arc<dyn TextRecognizer> = Arc::new(DimensionsRecognizer);

        let text = services
            .recognize_session_page(Arc::clone(&recognizer), 0)
            .await
            .unwrap();
        assert_eq!(text, "20x50");

        let saved = services.save_session().await.unwrap();
        assert!(saved.pages[0].ocr_text.is_none());
        assert_eq!(saved.pages[0].adjustments.rotation, Rotation::QUARTER);

        let text = services
            .recognize_document_page(Arc::clone(&recognizer), saved.id, 0)
            .await
            .unwrap();
        assert_eq!(text, "20x50");
        let updated = services.attach_page_text(saved.id, 0, text).await.unwrap();
        assert_eq!(updated.pages[0].ocr_text.as_deref(), Some("20x50"));

        assert!(matches!(
            services.recognize_document_page(recognizer, saved.id, 3).await,
            Err(PagekeepError::PageEdit(PageEditError::IndexOutOfRange { index: 3, len: 1 }))
        ));
    }

    #[tokio::test]
    async fn tags_are_seeded_and_persisted() {
        let (dir, services) = services();
        assert!(services.tags().await.unwrap().contains(&"Invoice".to_string()));
        assert!(services.add_tag("Warranty".into()).await.unwrap());
        assert!(services.remove_tag("Invoice".into()).await.unwrap());

        let reopened = TagRegistry::open(dir.path()).unwrap();
        assert!(reopened.tags().contains(&"Warranty".to_string()));
        assert!(!reopened.tags().contains(&"Invoice".to_string()));
    }

    #[tokio::test]
    async fn config_round_trips_through_disk() {
        let (dir, services) = services();
        let mut config = services.config();
        config.jpeg_quality = 70;
        config.default_export_format = ExportFormat::Jpg;
        services.update_config(config.clone()).unwrap();

        assert_eq!(load_config(dir.path()), Some(config));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
        let restarted = AppServices::init(dir.path().to_path_buf()).unwrap();
        assert_eq!(restarted.config().jpeg_quality, 70);
    }

    #[test]
    fn unusable_storage_root_fails_init() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let config = AppConfig {
            storage_dir: Some(blocker.join("documents")),
            ..AppConfig::default()
        };
        persist_config(dir.path(), &config).unwrap();

        assert!(matches!(
            AppServices::init(dir.path().to_path_buf()),
            Err(PagekeepError::Storage(StorageError::DirectoryCreationFailed(_)))
        ));
    }
}
