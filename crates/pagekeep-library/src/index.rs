// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Library index — in-memory cache over the document store.
//
// Every mutating call goes through the store and is followed by a full
// reload, then a `LibraryEvent` is broadcast to all subscribers.

use std::ops::Range;

use pagekeep_core::error::{PageEditError, Result, StorageError};
use pagekeep_core::{Adjustments, DocumentId};
use pagekeep_document::{ScanDocument, ScanPage, SourceImage, pages};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::store::DocumentStore;

const EVENT_CAPACITY: usize = 64;

/// Change notification published after the cache is refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    Reloaded { count: usize },
    Saved(DocumentId),
    Updated(DocumentId),
    Deleted(DocumentId),
}

/// Cached list of stored documents, most recently updated first.
pub struct Library {
    store: DocumentStore,
    documents: Vec<ScanDocument>,
    events: broadcast::Sender<LibraryEvent>,
}

impl Library {
    /// Wrap `store` and load its documents.
    pub fn open(store: DocumentStore) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut library = Self {
            store,
            documents: Vec::new(),
            events,
        };
        library.reload()?;
        Ok(library)
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: LibraryEvent) {
        debug!(?event, receivers = self.events.receiver_count(), "Library event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn refresh(&mut self) -> Result<usize> {
        self.documents = self.store.load_all()?;
        Ok(self.documents.len())
    }

    /// Refresh after a store change that has already been committed. A failed
    /// refresh leaves the cache stale until the next reload; the change
    /// itself stands.
    fn refresh_after(&mut self, event: LibraryEvent) {
        if let Err(err) = self.refresh() {
            warn!(error = %err, ?event, "Library refresh failed after a committed change");
        }
        self.publish(event);
    }

    /// Re-read every document from the store.
    pub fn reload(&mut self) -> Result<usize> {
        let count = self.refresh()?;
        self.publish(LibraryEvent::Reloaded { count });
        Ok(count)
    }

    pub fn documents(&self) -> &[ScanDocument] {
        &self.documents
    }

    pub fn get(&self, id: DocumentId) -> Option<&ScanDocument> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    /// Documents whose title, tags, or recognised text contain `query`
    /// (case-insensitive). A blank query returns everything.
    pub fn search(&self, query: &str) -> Vec<&ScanDocument> {
        self.documents.iter().filter(|doc| doc.matches(query)).collect()
    }

    /// Best full-resolution source for a page of a cached document.
    pub fn resolve_source(&self, id: DocumentId, page: &ScanPage) -> Option<SourceImage> {
        self.store.resolve_source(id, page)
    }

    #[instrument(skip(self, document), fields(id = %document.id))]
    pub fn save(&mut self, document: &ScanDocument) -> Result<ScanDocument> {
        let saved = self.store.save(document)?;
        self.refresh_after(LibraryEvent::Saved(saved.id));
        info!(title = %saved.title, "Document added to library");
        Ok(saved)
    }

    #[instrument(skip(self, document), fields(id = %document.id))]
    pub fn update(&mut self, document: &ScanDocument) -> Result<ScanDocument> {
        let updated = self.store.update(document)?;
        self.refresh_after(LibraryEvent::Updated(updated.id));
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, id: DocumentId) -> Result<()> {
        self.store.delete(id)?;
        self.refresh_after(LibraryEvent::Deleted(id));
        Ok(())
    }

    /// Apply `edit` to a copy of the cached document and persist it.
    fn edit<F>(&mut self, id: DocumentId, edit: F) -> Result<ScanDocument>
    where
        F: FnOnce(&mut ScanDocument) -> std::result::Result<(), PageEditError>,
    {
        let mut document = self.get(id).cloned().ok_or(StorageError::NotFound)?;
        edit(&mut document)?;
        self.update(&document)
    }

    /// Rename and/or retag a document. `None` leaves a field unchanged.
    pub fn update_metadata(
        &mut self,
        id: DocumentId,
        title: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<ScanDocument> {
        self.edit(id, |document| {
            if let Some(title) = title {
                document.title = title;
            }
            if let Some(tags) = tags {
                document.tags = tags;
            }
            Ok(())
        })
    }

    pub fn set_page_adjustments(
        &mut self,
        id: DocumentId,
        index: usize,
        adjustments: Adjustments,
    ) -> Result<ScanDocument> {
        self.edit(id, |document| pages::set_adjustments(&mut document.pages, index, adjustments))
    }

    pub fn rotate_page(&mut self, id: DocumentId, index: usize) -> Result<ScanDocument> {
        self.edit(id, |document| pages::rotate_page(&mut document.pages, index))
    }

    /// Drop a page from the document. Its image file stays on disk.
    pub fn remove_page(&mut self, id: DocumentId, index: usize) -> Result<ScanDocument> {
        self.edit(id, |document| pages::remove_page(&mut document.pages, index).map(|_| ()))
    }

    pub fn move_pages(
        &mut self,
        id: DocumentId,
        range: Range<usize>,
        to: usize,
    ) -> Result<ScanDocument> {
        self.edit(id, |document| pages::move_pages(&mut document.pages, range, to))
    }

    pub fn attach_page_text(
        &mut self,
        id: DocumentId,
        index: usize,
        text: String,
    ) -> Result<ScanDocument> {
        self.edit(id, |document| pages::attach_text(&mut document.pages, index, text))
    }
}
