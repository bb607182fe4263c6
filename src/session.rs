use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{BookRecord, SavedBook};

/// Sessions idle longer than this are discarded on the next registry access.
const SESSION_IDLE_SECS: i64 = 2 * 60 * 60;

/// One-shot page notice, consumed by the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Warning(String),
    Success(String),
    Info(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Error(text)
            | Notice::Warning(text)
            | Notice::Success(text)
            | Notice::Info(text) => text,
        }
    }

    /// CSS class for the notice banner.
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::Error(_) => "error",
            Notice::Warning(_) => "warning",
            Notice::Success(_) => "success",
            Notice::Info(_) => "info",
        }
    }
}

/// The result set currently on screen. Save actions index into `results`, so
/// it must stay exactly what the last render showed.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<BookRecord>,
    /// False until the first search runs; distinguishes the initial blank
    /// page from a search that returned nothing.
    pub searched: bool,
}

/// A cover image uploaded on the scan page, held only for re-display.
#[derive(Debug, Clone)]
pub struct ScanUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Everything one visitor accumulates between their first request and session
/// expiry. Never shared across visitors.
#[derive(Debug, Default)]
pub struct Session {
    saved: Vec<SavedBook>,
    pub search: SearchState,
    pub scan: Option<ScanUpload>,
    notice: Option<Notice>,
}

impl Session {
    /// Appends to the end of the shelf. Duplicates are allowed, there is no
    /// identity key.
    pub fn save(&mut self, book: SavedBook) {
        self.saved.push(book);
    }

    /// Removes the book at `index`, shifting later entries left. Indices come
    /// from the positions of the last render; anything out of range is a
    /// stale click and is ignored.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.saved.len() {
            tracing::warn!(
                index,
                len = self.saved.len(),
                "remove index out of range, ignoring"
            );
            return false;
        }
        self.saved.remove(index);
        true
    }

    /// Snapshot of the shelf for one render pass.
    pub fn saved(&self) -> Vec<SavedBook> {
        self.saved.clone()
    }

    pub fn saved_len(&self) -> usize {
        self.saved.len()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

struct Entry {
    session: Arc<Mutex<Session>>,
    last_seen: DateTime<Utc>,
}

/// Owns every live session, keyed by the `sid` cookie value. Cloning the
/// registry shares the same underlying map.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<Uuid, Entry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `id`, creating it empty on first access.
    /// Piggybacks idle-session pruning on the lookup.
    pub fn get_or_create(&self, id: Uuid) -> Arc<Mutex<Session>> {
        let now = Utc::now();
        let mut entries = self.inner.lock().expect("session registry lock poisoned");
        prune_idle(&mut entries, now);

        let entry = entries.entry(id).or_insert_with(|| {
            tracing::debug!(%id, "creating session");
            Entry {
                session: Arc::new(Mutex::new(Session::default())),
                last_seen: now,
            }
        });
        entry.last_seen = now;
        Arc::clone(&entry.session)
    }
}

fn prune_idle(entries: &mut HashMap<Uuid, Entry>, now: DateTime<Utc>) {
    entries.retain(|id, entry| {
        let keep = (now - entry.last_seen).num_seconds() <= SESSION_IDLE_SECS;
        if !keep {
            tracing::debug!(%id, "discarding idle session");
        }
        keep
    });
}
