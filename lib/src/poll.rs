//! Change feed built from repeated snapshot fetches.
//!
//! A worker thread fetches the scoped snapshot on every tick and turns the difference
//! from the previous one into insert, update and delete events.

use crate::error::StoreError;
use crate::models::{Bookmark, ChangeEvent};
use crate::store::{ChangeSink, Subscription};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// Consecutive fetch failures before the feed reports itself dropped
    pub max_failures: u32,
}

/// Start polling `scope` with `fetch`, diffing against `baseline`
pub fn spawn<F>(
    scope: &str,
    sink: ChangeSink,
    settings: PollSettings,
    baseline: Vec<Bookmark>,
    fetch: F,
) -> PollSubscription
where
    F: FnMut(&str) -> Result<Vec<Bookmark>, StoreError> + Send + 'static,
{
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let worker = PollWorker {
        scope: scope.to_string(),
        sink,
        settings,
        fetch,
    };
    let handle = thread::spawn(move || worker.run(baseline, stop_rx));
    info!("Polling changes for {} every {:?}", scope, settings.interval);

    PollSubscription {
        scope: scope.to_string(),
        stop: Some(stop_tx),
        handle: Some(handle),
    }
}

struct PollWorker<F> {
    scope: String,
    sink: ChangeSink,
    settings: PollSettings,
    fetch: F,
}

impl<F> PollWorker<F>
where
    F: FnMut(&str) -> Result<Vec<Bookmark>, StoreError>,
{
    fn run(mut self, mut previous: Vec<Bookmark>, stop: mpsc::Receiver<()>) {
        let mut failures = 0;
        loop {
            match stop.recv_timeout(self.settings.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                // Stop requested or the subscription handle is gone
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            let next = match (self.fetch)(&self.scope) {
                Ok(next) => {
                    failures = 0;
                    next
                }
                Err(e) => {
                    failures += 1;
                    warn!("Poll {} for {} failed: {}", failures, self.scope, e);
                    if failures >= self.settings.max_failures {
                        self.sink
                            .dropped(format!("{} consecutive poll failures: {}", failures, e));
                        break;
                    }
                    continue;
                }
            };

            for event in diff_snapshots(&previous, &next) {
                if !self.sink.emit(event) {
                    debug!("Change receiver for {} is gone", self.scope);
                    return;
                }
            }
            previous = next;
        }
        debug!("Poll worker for {} stopped", self.scope);
    }
}

pub struct PollSubscription {
    scope: String,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Subscription for PollSubscription {
    fn scope(&self) -> &str {
        &self.scope
    }

    fn close(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        // The worker may be mid-fetch; it exits once that returns
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Poll worker for {} panicked", self.scope);
            }
        }
    }
}

/// Events that turn snapshot `previous` into snapshot `next`.
///
/// Deletes come first, then inserts oldest to newest so the newest lands at the head,
/// then updates.
pub fn diff_snapshots(previous: &[Bookmark], next: &[Bookmark]) -> Vec<ChangeEvent> {
    let old: HashMap<&str, &Bookmark> = previous.iter().map(|b| (b.id.as_str(), b)).collect();
    let new: HashMap<&str, &Bookmark> = next.iter().map(|b| (b.id.as_str(), b)).collect();

    let mut events: Vec<ChangeEvent> = previous
        .iter()
        .filter(|b| !new.contains_key(b.id.as_str()))
        .map(|b| ChangeEvent::Delete { id: b.id.clone() })
        .collect();

    let mut inserted: Vec<&Bookmark> = next
        .iter()
        .filter(|b| !old.contains_key(b.id.as_str()))
        .collect();
    inserted.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    events.extend(inserted.into_iter().cloned().map(ChangeEvent::Insert));

    events.extend(
        next.iter()
            .filter(|b| old.get(b.id.as_str()).is_some_and(|prev| *prev != *b))
            .cloned()
            .map(ChangeEvent::Update),
    );
    events
}
