//! Seams between the synchronization module and the backend that owns the data.

use crate::error::StoreError;
use crate::models::{Bookmark, ChangeEvent, NewBookmark};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Authenticated CRUD against one table of bookmarks plus a live change feed.
///
/// Every call is scoped by the owning user's id.
pub trait BookmarkStore {
    /// All bookmarks owned by `scope`, newest first
    fn fetch_all(&self, scope: &str) -> Result<Vec<Bookmark>, StoreError>;

    /// Insert a row; the store assigns `id` and `created_at`
    fn insert(&self, row: &NewBookmark) -> Result<Bookmark, StoreError>;

    /// Delete the record matching both `id` and owner `scope`
    fn delete(&self, id: &str, scope: &str) -> Result<(), StoreError>;

    /// Start delivering changes to rows owned by `scope` into `sink`
    fn subscribe_changes(
        &self,
        scope: &str,
        sink: ChangeSink,
    ) -> Result<Box<dyn Subscription>, StoreError>;
}

impl<T: BookmarkStore + ?Sized> BookmarkStore for Arc<T> {
    fn fetch_all(&self, scope: &str) -> Result<Vec<Bookmark>, StoreError> {
        (**self).fetch_all(scope)
    }

    fn insert(&self, row: &NewBookmark) -> Result<Bookmark, StoreError> {
        (**self).insert(row)
    }

    fn delete(&self, id: &str, scope: &str) -> Result<(), StoreError> {
        (**self).delete(id, scope)
    }

    fn subscribe_changes(
        &self,
        scope: &str,
        sink: ChangeSink,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        (**self).subscribe_changes(scope, sink)
    }
}

impl<T: BookmarkStore + ?Sized> BookmarkStore for Box<T> {
    fn fetch_all(&self, scope: &str) -> Result<Vec<Bookmark>, StoreError> {
        (**self).fetch_all(scope)
    }

    fn insert(&self, row: &NewBookmark) -> Result<Bookmark, StoreError> {
        (**self).insert(row)
    }

    fn delete(&self, id: &str, scope: &str) -> Result<(), StoreError> {
        (**self).delete(id, scope)
    }

    fn subscribe_changes(
        &self,
        scope: &str,
        sink: ChangeSink,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        (**self).subscribe_changes(scope, sink)
    }
}

/// Handle to an open change feed
pub trait Subscription: Send {
    fn scope(&self) -> &str;

    /// Stop delivery. Must be safe to call more than once.
    fn close(&mut self);
}

/// Owns a subscription and closes it when dropped
pub struct SubscriptionGuard {
    inner: Box<dyn Subscription>,
}

impl SubscriptionGuard {
    pub fn new(inner: Box<dyn Subscription>) -> Self {
        Self { inner }
    }

    pub fn scope(&self) -> &str {
        self.inner.scope()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// What a subscription delivers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Change(ChangeEvent),
    /// The feed stopped on its own; carries the reason
    Dropped(String),
}

/// A delivery stamped with where and when it was ingested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub scope: String,
    pub generation: u64,
    /// Ingestion order, shared by every sink created from the same counter
    pub seq: u64,
    pub delivery: Delivery,
}

/// The handler a store pushes changes into.
///
/// Cloneable and `Send` so stores may deliver from worker threads.
#[derive(Debug, Clone)]
pub struct ChangeSink {
    scope: String,
    generation: u64,
    seq: Arc<AtomicU64>,
    tx: Sender<Envelope>,
}

impl ChangeSink {
    pub fn new(
        scope: impl Into<String>,
        generation: u64,
        seq: Arc<AtomicU64>,
        tx: Sender<Envelope>,
    ) -> Self {
        Self {
            scope: scope.into(),
            generation,
            seq,
            tx,
        }
    }

    /// A standalone sink and the receiving end of its channel
    pub fn channel(scope: impl Into<String>) -> (Self, Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(scope, 0, Arc::new(AtomicU64::new(0)), tx), rx)
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Deliver a change. Returns false once the receiving side is gone.
    pub fn emit(&self, event: ChangeEvent) -> bool {
        self.send(Delivery::Change(event))
    }

    /// Report that the feed has stopped
    pub fn dropped(&self, reason: impl Into<String>) -> bool {
        self.send(Delivery::Dropped(reason.into()))
    }

    fn send(&self, delivery: Delivery) -> bool {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.tx
            .send(Envelope {
                scope: self.scope.clone(),
                generation: self.generation,
                seq,
                delivery,
            })
            .is_ok()
    }
}
