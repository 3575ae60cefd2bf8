// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagekeep-library — Durable document storage for Pagekeep.
//
// The asset store writes one directory per document (`metadata.json` plus
// write-once `<pageId>.jpg` files). The library index caches the store in
// memory and broadcasts change events. The session buffer holds the
// uncommitted draft being scanned, and the tag registry persists the set of
// known tags.

pub mod index;
pub mod session;
pub mod store;
pub mod tags;

pub use index::{Library, LibraryEvent};
pub use session::{ScanSession, SessionBuffer};
pub use store::DocumentStore;
pub use tags::TagRegistry;
