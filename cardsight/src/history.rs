//! Bounded, persisted history of finished sessions.
//!
//! Sessions are kept newest first. Every mutation writes the whole history
//! back to storage right away; the data is tiny, and losing a finished
//! session is worse than writing a few kilobytes more often.
//!
//! A failed write never undoes the in-memory change. The write is retried
//! once, and if that fails too the error is logged and handed back so the UI
//! can show a warning while the drill carries on.
//!
//! Loading is just as forgiving: records that no longer parse are skipped,
//! and a stored document that isn't a list at all leaves an empty history.
//! Either way the history keeps a warning for the UI to collect.

use thiserror::Error;

use crate::Session;
use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::storage::{SESSIONS_KEY, Storage, StorageError};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to save history: {0}")]
    Persist(StorageError),

    #[error("Failed to read history: {0}")]
    Load(StorageError),

    #[error("Stored history is unreadable, starting empty: {0}")]
    Corrupt(serde_json::Error),

    #[error("Skipped {skipped} unreadable sessions in the stored history")]
    Skipped { skipped: usize },

    #[error("Failed to encode history: {0}")]
    Encode(serde_json::Error),

    #[error("No session at position {index} (history holds {len})")]
    OutOfRange { index: usize, len: usize },
}

impl HistoryError {
    /// True if the in-memory history was changed and only saving failed
    pub const fn is_persist_failure(&self) -> bool {
        matches!(self, Self::Persist(_) | Self::Encode(_))
    }
}

/// Finished sessions, newest first
#[derive(Debug)]
pub struct History<S: Storage> {
    sessions: Vec<Session>,
    capacity: usize,
    storage: S,
    load_warning: Option<HistoryError>,
}

impl<S: Storage> History<S> {
    /// Loads the history stored in `storage`
    ///
    /// A missing key is an empty history. Anything beyond `capacity` is
    /// dropped, oldest first. Only a failing read is an error; unreadable
    /// content is reported through [`History::take_load_warning`].
    pub fn load(storage: S, capacity: usize) -> Result<Self, HistoryError> {
        let content = storage.read(SESSIONS_KEY).map_err(HistoryError::Load)?;
        let (mut sessions, load_warning) = match content {
            Some(content) => parse_sessions(&content),
            None => (Vec::new(), None),
        };

        let capacity = capacity.max(1);
        sessions.truncate(capacity);
        tracing::debug!(sessions = sessions.len(), capacity, "history loaded");

        Ok(Self {
            sessions,
            capacity,
            storage,
            load_warning,
        })
    }

    /// What went wrong reading the stored history, if anything
    ///
    /// Collecting it clears it.
    pub fn take_load_warning(&mut self) -> Option<HistoryError> {
        self.load_warning.take()
    }

    /// An empty history with the default capacity
    pub fn empty(storage: S) -> Self {
        Self {
            sessions: Vec::new(),
            capacity: DEFAULT_HISTORY_CAPACITY,
            storage,
            load_warning: None,
        }
    }

    /// Adds a session as the newest entry, evicting the oldest beyond capacity
    pub fn append(&mut self, session: Session) -> Result<(), HistoryError> {
        self.sessions.insert(0, session);

        if self.sessions.len() > self.capacity {
            let evicted = self.sessions.len() - self.capacity;
            self.sessions.truncate(self.capacity);
            tracing::debug!(evicted, "oldest sessions evicted");
        }

        self.persist()
    }

    /// Removes the session at `index` (0 is the newest)
    pub fn delete(&mut self, index: usize) -> Result<Session, HistoryError> {
        if index >= self.sessions.len() {
            return Err(HistoryError::OutOfRange {
                index,
                len: self.sessions.len(),
            });
        }

        let removed = self.sessions.remove(index);
        tracing::info!(id = %removed.id, "session deleted");
        self.persist()?;
        Ok(removed)
    }

    /// Removes every session, including the stored copy
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.sessions.clear();
        tracing::info!("history cleared");
        retry_once(|| self.storage.remove(SESSIONS_KEY)).map_err(|error| {
            tracing::warn!(%error, "failed to clear stored history");
            HistoryError::Persist(error)
        })
    }

    /// Every session, newest first
    pub fn all(&self) -> &[Session] {
        &self.sessions
    }

    /// The `count` newest sessions
    pub fn latest(&self, count: usize) -> &[Session] {
        &self.sessions[..count.min(self.sessions.len())]
    }

    pub fn get(&self, index: usize) -> Option<&Session> {
        self.sessions.get(index)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub const fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn persist(&mut self) -> Result<(), HistoryError> {
        let json = serde_json::to_string(&self.sessions).map_err(HistoryError::Encode)?;
        retry_once(|| self.storage.write(SESSIONS_KEY, &json)).map_err(|error| {
            tracing::warn!(%error, "failed to save history");
            HistoryError::Persist(error)
        })
    }
}

/// Parses stored sessions one record at a time, keeping every readable one
fn parse_sessions(content: &str) -> (Vec<Session>, Option<HistoryError>) {
    let records: Vec<serde_json::Value> = match serde_json::from_str(content) {
        Ok(records) => records,
        Err(error) => {
            tracing::warn!(%error, "stored history is unreadable");
            return (Vec::new(), Some(HistoryError::Corrupt(error)));
        }
    };

    let total = records.len();
    let sessions: Vec<Session> = records
        .into_iter()
        .filter_map(|record| {
            serde_json::from_value(record)
                .inspect_err(|error| tracing::warn!(%error, "skipping unreadable session"))
                .ok()
        })
        .collect();

    let skipped = total - sessions.len();
    let warning = (skipped > 0).then_some(HistoryError::Skipped { skipped });
    (sessions, warning)
}

fn retry_once(mut operation: impl FnMut() -> Result<(), StorageError>) -> Result<(), StorageError> {
    operation().or_else(|error| {
        tracing::debug!(%error, "storage operation failed, retrying");
        operation()
    })
}
