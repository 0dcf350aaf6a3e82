//! Client-side synchronization of one user's bookmarks.
//!
//! [`BookmarkSync`] mirrors the store for the active user by merging one bulk fetch
//! with the live change stream. Local mutations are only requests: the collection
//! changes when the store's confirming event is pumped, never before.

use crate::error::{Result, SyncError};
use crate::models::{Bookmark, BookmarkInput, ChangeEvent};
use crate::reconcile;
use crate::session::Session;
use crate::store::{BookmarkStore, ChangeSink, Delivery, Envelope, SubscriptionGuard};
use crate::validate::validate_input;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of the local collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    Loading,
    Ready,
    FetchFailed,
}

pub struct BookmarkSync<S: BookmarkStore> {
    store: S,
    user_id: Option<String>,
    bookmarks: Vec<Bookmark>,
    state: SyncState,
    last_error: Option<String>,
    subscription: Option<SubscriptionGuard>,
    /// Bumped for every subscription and on teardown
    generation: u64,
    seq: Arc<AtomicU64>,
    /// Sequence value taken just before the last successful fetch
    snapshot_mark: u64,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
    /// Set by an automatic resubscription, cleared by the next event
    resubscribed: bool,
    /// Failure held back so the events pumped before it could be returned
    deferred: Option<SyncError>,
}

impl<S: BookmarkStore> BookmarkSync<S> {
    pub fn new(store: S) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            store,
            user_id: None,
            bookmarks: Vec::new(),
            state: SyncState::Uninitialized,
            last_error: None,
            subscription: None,
            generation: 0,
            seq: Arc::new(AtomicU64::new(0)),
            snapshot_mark: 0,
            tx,
            rx,
            resubscribed: false,
            deferred: None,
        }
    }

    /// Replace the collection with a full scoped fetch for `user_id`.
    ///
    /// On failure the previous collection stays as it was and the state becomes
    /// [`SyncState::FetchFailed`].
    pub fn initialize(&mut self, user_id: &str) -> Result<()> {
        if user_id.is_empty() {
            return Err(SyncError::NoUser);
        }
        if self.user_id.as_deref().is_some_and(|active| active != user_id) {
            self.teardown();
        }
        self.user_id = Some(user_id.to_string());
        self.state = SyncState::Loading;

        let mark = self.seq.load(Ordering::SeqCst);
        match self.store.fetch_all(user_id) {
            Ok(rows) => {
                self.bookmarks = reconcile::from_snapshot(rows, user_id);
                self.snapshot_mark = mark;
                self.state = SyncState::Ready;
                self.last_error = None;
                info!("Loaded {} bookmark(s) for {}", self.bookmarks.len(), user_id);
                Ok(())
            }
            Err(e) => {
                warn!("Fetching bookmarks for {} failed: {}", user_id, e);
                self.state = SyncState::FetchFailed;
                self.last_error = Some(e.to_string());
                Err(SyncError::Fetch(e))
            }
        }
    }

    /// Open the live change subscription for `user_id`.
    /// A no-op when that user is already subscribed.
    pub fn subscribe(&mut self, user_id: &str) -> Result<()> {
        if user_id.is_empty() {
            return Err(SyncError::NoUser);
        }
        if let Some(subscription) = &self.subscription {
            if subscription.scope() == user_id {
                return Ok(());
            }
        }
        if self.user_id.as_deref().is_some_and(|active| active != user_id) {
            self.teardown();
        }
        self.user_id = Some(user_id.to_string());
        self.resubscribed = false;
        self.open_subscription(user_id)
    }

    fn open_subscription(&mut self, user_id: &str) -> Result<()> {
        // Close the old feed before the new one exists
        self.subscription = None;
        self.generation += 1;

        let sink = ChangeSink::new(user_id, self.generation, self.seq.clone(), self.tx.clone());
        match self.store.subscribe_changes(user_id, sink) {
            Ok(subscription) => {
                debug!("Subscribed {} (generation {})", user_id, self.generation);
                self.subscription = Some(SubscriptionGuard::new(subscription));
                Ok(())
            }
            Err(e) => {
                warn!("Subscribing to changes for {} failed: {}", user_id, e);
                self.last_error = Some(e.to_string());
                Err(SyncError::Subscription(e.to_string()))
            }
        }
    }

    /// Subscribe, then load the snapshot.
    ///
    /// The snapshot is loaded even when the subscription fails; that error is
    /// returned afterwards.
    pub fn start(&mut self, user_id: &str) -> Result<()> {
        let subscribed = self.subscribe(user_id);
        self.initialize(user_id)?;
        subscribed
    }

    /// Reload the active user's snapshot
    pub fn refresh(&mut self) -> Result<()> {
        let user_id = self.user_id.clone().ok_or(SyncError::NoUser)?;
        self.initialize(&user_id)
    }

    /// Apply every envelope delivered so far; returns the events that changed the view.
    ///
    /// When an envelope fails after others were applied, those events are returned and
    /// the failure is reported by the next call. The reload that follows an automatic
    /// resubscription replaces the collection without listing the difference.
    pub fn pump(&mut self) -> Result<Vec<ChangeEvent>> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }
        let mut applied = Vec::new();
        let outcome = self.drain(&mut applied);
        self.settle(applied, outcome)
    }

    /// Like [`pump`](Self::pump), but waits up to `timeout` for the first envelope
    pub fn pump_timeout(&mut self, timeout: Duration) -> Result<Vec<ChangeEvent>> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }
        let mut applied = Vec::new();
        let outcome = match self.rx.recv_timeout(timeout) {
            Ok(envelope) => match self.handle(envelope) {
                Ok(event) => {
                    applied.extend(event);
                    self.drain(&mut applied)
                }
                Err(e) => Err(e),
            },
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Ok(()),
        };
        self.settle(applied, outcome)
    }

    fn drain(&mut self, applied: &mut Vec<ChangeEvent>) -> Result<()> {
        while let Ok(envelope) = self.rx.try_recv() {
            if let Some(event) = self.handle(envelope)? {
                applied.push(event);
            }
        }
        Ok(())
    }

    fn settle(&mut self, applied: Vec<ChangeEvent>, outcome: Result<()>) -> Result<Vec<ChangeEvent>> {
        match outcome {
            Ok(()) => Ok(applied),
            Err(e) if applied.is_empty() => Err(e),
            Err(e) => {
                self.deferred = Some(e);
                Ok(applied)
            }
        }
    }

    fn handle(&mut self, envelope: Envelope) -> Result<Option<ChangeEvent>> {
        let current = envelope.generation == self.generation
            && self.user_id.as_deref() == Some(envelope.scope.as_str());
        if !current {
            debug!(
                "Discarding envelope {} from {} (generation {})",
                envelope.seq, envelope.scope, envelope.generation
            );
            return Ok(None);
        }

        let event = match envelope.delivery {
            Delivery::Dropped(reason) => {
                self.recover_subscription(reason)?;
                return Ok(None);
            }
            Delivery::Change(event) => event,
        };

        self.resubscribed = false;
        if envelope.seq < self.snapshot_mark {
            debug!("Event {} predates the snapshot", envelope.seq);
            return Ok(None);
        }
        if self.state != SyncState::Ready {
            // The next successful fetch covers it
            debug!("Skipping {} of {} while {:?}", event.kind(), event.id(), self.state);
            return Ok(None);
        }

        let collection = std::mem::take(&mut self.bookmarks);
        self.bookmarks = reconcile::apply(collection, &envelope.scope, &event);
        Ok(Some(event))
    }

    /// Resubscribe once after a drop and reload; a second drop in a row is an error
    fn recover_subscription(&mut self, reason: String) -> Result<()> {
        self.subscription = None;
        let Some(user_id) = self.user_id.clone() else {
            return Ok(());
        };

        if self.resubscribed {
            error!("Live updates for {} dropped again: {}", user_id, reason);
            self.last_error = Some(reason.clone());
            return Err(SyncError::Subscription(reason));
        }

        warn!("Live updates for {} dropped ({}), resubscribing", user_id, reason);
        self.resubscribed = true;
        self.open_subscription(&user_id)?;
        self.initialize(&user_id)
    }

    /// Create a bookmark for `user_id`.
    ///
    /// Input is validated locally first. The collection is untouched; the store's
    /// insert event adds the record.
    pub fn request_create(&self, input: &BookmarkInput, user_id: &str) -> Result<Bookmark> {
        if user_id.is_empty() {
            return Err(SyncError::NoUser);
        }
        let row = validate_input(input, user_id)?;
        let created = self.store.insert(&row).map_err(SyncError::Request)?;
        info!("Created bookmark {} for {}", created.id, user_id);
        Ok(created)
    }

    /// Delete the bookmark matching `id` and owner `user_id`.
    /// The collection is untouched; the store's delete event removes the record.
    pub fn request_delete(&self, id: &str, user_id: &str) -> Result<()> {
        if user_id.is_empty() {
            return Err(SyncError::NoUser);
        }
        self.store.delete(id, user_id).map_err(SyncError::Request)?;
        info!("Deleted bookmark {} for {}", id, user_id);
        Ok(())
    }

    /// React to a session transition
    pub fn apply_session(&mut self, session: Option<&Session>) -> Result<()> {
        match session {
            Some(s) if self.user_id.as_deref() == Some(s.user_id.as_str()) => Ok(()),
            Some(s) => self.start(&s.user_id),
            None => {
                self.teardown();
                Ok(())
            }
        }
    }

    /// Close the subscription and forget the active user
    pub fn teardown(&mut self) {
        self.subscription = None;
        self.generation += 1;
        let discarded = self.rx.try_iter().count();
        if let Some(user_id) = self.user_id.take() {
            info!("Tore down {} ({} pending envelope(s) discarded)", user_id, discarded);
        }
        self.bookmarks.clear();
        self.state = SyncState::Uninitialized;
        self.last_error = None;
        self.resubscribed = false;
        self.deferred = None;
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
