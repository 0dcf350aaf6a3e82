//! SQLite-backed bookmark store with an in-process change feed.
//!
//! Every committed insert, update or delete is broadcast to the open subscriptions
//! whose scope owns the row, the way a hosted backend pushes row-level changes.
//! With polling enabled, subscriptions instead follow the database file, so writes
//! from other processes show up too.

use crate::error::StoreError;
use crate::models::{Bookmark, ChangeEvent, NewBookmark};
use crate::poll::{self, PollSettings};
use crate::store::{BookmarkStore, ChangeSink, Subscription};
use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Source of `created_at` values
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

struct Subscriber {
    scope: String,
    sink: ChangeSink,
    open: Arc<AtomicBool>,
}

type Feed = Arc<Mutex<Vec<Subscriber>>>;

fn lock(feed: &Feed) -> MutexGuard<'_, Vec<Subscriber>> {
    // A panicking subscriber cannot leave the list half-updated
    feed.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct LocalStore {
    conn: Connection,
    db_path: PathBuf,
    feed: Feed,
    clock: Clock,
    in_memory: bool,
    poll: Option<PollSettings>,
}

impl LocalStore {
    pub fn init_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, PathBuf::from(":memory:"), true)
    }

    pub fn init(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, db_path.to_path_buf(), false)
    }

    fn with_connection(conn: Connection, db_path: PathBuf, in_memory: bool) -> Result<Self, StoreError> {
        let store = Self {
            conn,
            db_path,
            feed: Arc::new(Mutex::new(Vec::new())),
            clock: Box::new(Utc::now),
            in_memory,
            poll: None,
        };
        store.setup_tables()?;
        Ok(store)
    }

    /// Replace the clock used to stamp new rows
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Follow the database file by polling instead of the in-process feed
    pub fn with_polling(mut self, settings: PollSettings) -> Self {
        self.poll = Some(settings);
        self
    }

    /// Get the database file path
    pub fn get_path(&self) -> &Path {
        &self.db_path
    }

    fn setup_tables(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE if not exists bookmarks (
                id text PRIMARY KEY,
                user_id text NOT NULL,
                url text NOT NULL,
                title text NOT NULL,
                created_at integer NOT NULL
            )",
            [],
        )?;

        // created_at is microseconds since the epoch
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_user_created ON bookmarks(user_id, created_at)",
            [],
        )?;
        Ok(())
    }

    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        let micros: i64 = row.get(4)?;
        let created_at = DateTime::from_timestamp_micros(micros)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, micros))?;
        Ok(Bookmark::new(
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            created_at,
        ))
    }

    fn get_rec(&self, id: &str, scope: &str) -> Result<Option<Bookmark>, StoreError> {
        let bookmark = self
            .conn
            .query_row(
                "SELECT id, user_id, url, title, created_at FROM bookmarks
                 WHERE id = ?1 AND user_id = ?2",
                (id, scope),
                Self::row_to_bookmark,
            )
            .optional()?;
        Ok(bookmark)
    }

    /// Change the url and/or title of an owned bookmark
    pub fn update(
        &self,
        id: &str,
        scope: &str,
        url: Option<&str>,
        title: Option<&str>,
    ) -> Result<Bookmark, StoreError> {
        let changed = self.conn.execute(
            "UPDATE bookmarks SET url = COALESCE(?1, url), title = COALESCE(?2, title)
             WHERE id = ?3 AND user_id = ?4",
            (url, title, id, scope),
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }

        let bookmark = self.get_rec(id, scope)?.ok_or(StoreError::NotFound)?;
        self.broadcast(scope, ChangeEvent::Update(bookmark.clone()));
        Ok(bookmark)
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        lock(&self.feed).iter().filter(|s| s.open.load(Ordering::SeqCst)).count()
    }

    fn broadcast(&self, scope: &str, event: ChangeEvent) {
        let mut feed = lock(&self.feed);
        feed.retain(|sub| {
            if !sub.open.load(Ordering::SeqCst) {
                return false;
            }
            if sub.scope != scope {
                return true;
            }
            // Drop subscribers whose receiver is gone
            sub.sink.emit(event.clone())
        });
        debug!("Broadcast {} of {} to {} subscriber(s)", event.kind(), event.id(), feed.len());
    }
}

impl BookmarkStore for LocalStore {
    fn fetch_all(&self, scope: &str) -> Result<Vec<Bookmark>, StoreError> {
        fetch_rows(&self.conn, scope)
    }

    fn insert(&self, row: &NewBookmark) -> Result<Bookmark, StoreError> {
        let bookmark = Bookmark::new(
            uuid::Uuid::new_v4().to_string(),
            row.user_id.as_str(),
            row.url.as_str(),
            row.title.as_str(),
            // Stored with microsecond precision
            (self.clock)().trunc_subsecs(6),
        );

        self.conn.execute(
            "INSERT INTO bookmarks (id, user_id, url, title, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &bookmark.id,
                &bookmark.user_id,
                &bookmark.url,
                &bookmark.title,
                bookmark.created_at.timestamp_micros(),
            ),
        )?;

        self.broadcast(&bookmark.user_id, ChangeEvent::Insert(bookmark.clone()));
        Ok(bookmark)
    }

    fn delete(&self, id: &str, scope: &str) -> Result<(), StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM bookmarks WHERE id = ?1 AND user_id = ?2",
            (id, scope),
        )?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }

        self.broadcast(scope, ChangeEvent::Delete { id: id.to_string() });
        Ok(())
    }

    fn subscribe_changes(
        &self,
        scope: &str,
        sink: ChangeSink,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        match self.poll {
            Some(settings) if !self.in_memory => {
                let conn = Connection::open(&self.db_path)?;
                let baseline = fetch_rows(&conn, scope)?;
                return Ok(Box::new(poll::spawn(scope, sink, settings, baseline, move |scope| {
                    fetch_rows(&conn, scope)
                })));
            }
            Some(_) => warn!("In-memory database cannot be polled, using the in-process feed"),
            None => {}
        }

        let open = Arc::new(AtomicBool::new(true));
        lock(&self.feed).push(Subscriber {
            scope: scope.to_string(),
            sink,
            open: open.clone(),
        });
        info!("Opened local change feed for {}", scope);

        Ok(Box::new(LocalSubscription {
            scope: scope.to_string(),
            open,
            feed: self.feed.clone(),
        }))
    }
}

fn fetch_rows(conn: &Connection, scope: &str) -> Result<Vec<Bookmark>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, url, title, created_at FROM bookmarks
         WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map([scope], LocalStore::row_to_bookmark)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

pub struct LocalSubscription {
    scope: String,
    open: Arc<AtomicBool>,
    feed: Feed,
}

impl Subscription for LocalSubscription {
    fn scope(&self) -> &str {
        &self.scope
    }

    fn close(&mut self) {
        if self.open.swap(false, Ordering::SeqCst) {
            lock(&self.feed).retain(|sub| sub.open.load(Ordering::SeqCst));
            info!("Closed local change feed for {}", self.scope);
        }
    }
}

/// Clock that advances by `step` on every call, starting at `start`
#[cfg(test)]
pub(crate) fn stepping_clock(start: DateTime<Utc>, step: chrono::Duration) -> Clock {
    let ticks = std::sync::atomic::AtomicI32::new(0);
    Box::new(move || start + step * ticks.fetch_add(1, Ordering::SeqCst))
}
