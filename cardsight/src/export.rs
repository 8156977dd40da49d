//! JSON export of sessions, for sharing or keeping outside the app.
//!
//! Three artifacts exist: a single session, the whole history, and the most
//! recent N sessions. File names carry the export time, e.g.
//! `card-recognition-all-sessions-2025-01-12T10-15-00.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::Session;

/// Prefix shared by every exported file name
pub const FILE_PREFIX: &str = "card-recognition";

const STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("There are no sessions to export")]
    NoSessions,

    #[error("Failed to encode export: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write export '{path}': {error}")]
    Write { path: PathBuf, error: std::io::Error },
}

#[derive(Debug, Clone, PartialEq)]
enum Content {
    Session(Box<Session>),
    All(Vec<Session>),
    Latest { requested: usize, sessions: Vec<Session> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllSessions<'a> {
    export_date: DateTime<Utc>,
    total_sessions: usize,
    sessions: &'a [Session],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LatestSessions<'a> {
    export_date: DateTime<Utc>,
    session_count: usize,
    requested_count: usize,
    sessions: &'a [Session],
}

/// An export artifact, ready to be encoded or written
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    exported_at: DateTime<Utc>,
    content: Content,
}

impl Export {
    /// A single session record
    pub fn session(session: &Session) -> Self {
        Self::now(Content::Session(Box::new(session.clone())))
    }

    /// Every session in `sessions`
    pub fn all(sessions: &[Session]) -> Result<Self, ExportError> {
        if sessions.is_empty() {
            return Err(ExportError::NoSessions);
        }
        Ok(Self::now(Content::All(sessions.to_vec())))
    }

    /// The `count` newest sessions (`sessions` is newest first)
    ///
    /// Asking for more than there are exports what there is; the requested
    /// count is kept in the artifact.
    pub fn latest(sessions: &[Session], count: usize) -> Result<Self, ExportError> {
        if sessions.is_empty() || count == 0 {
            return Err(ExportError::NoSessions);
        }
        Ok(Self::now(Content::Latest {
            requested: count,
            sessions: sessions[..count.min(sessions.len())].to_vec(),
        }))
    }

    fn now(content: Content) -> Self {
        Self {
            exported_at: Utc::now(),
            content,
        }
    }

    /// Overrides the export time
    pub const fn at(mut self, time: DateTime<Utc>) -> Self {
        self.exported_at = time;
        self
    }

    pub const fn exported_at(&self) -> DateTime<Utc> {
        self.exported_at
    }

    /// Amount of sessions in the artifact
    pub fn session_count(&self) -> usize {
        match &self.content {
            Content::Session(_) => 1,
            Content::All(sessions) | Content::Latest { sessions, .. } => sessions.len(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ExportError> {
        let export_date = self.exported_at;
        let json = match &self.content {
            Content::Session(session) => serde_json::to_string_pretty(session)?,
            Content::All(sessions) => serde_json::to_string_pretty(&AllSessions {
                export_date,
                total_sessions: sessions.len(),
                sessions,
            })?,
            Content::Latest {
                requested,
                sessions,
            } => serde_json::to_string_pretty(&LatestSessions {
                export_date,
                session_count: sessions.len(),
                requested_count: *requested,
                sessions,
            })?,
        };
        Ok(json)
    }

    /// File name for the artifact
    ///
    /// A single session is named after the day it was played, collections
    /// after the moment they were exported.
    pub fn file_name(&self) -> String {
        let stamp = self.exported_at.format(STAMP_FORMAT);
        match &self.content {
            Content::Session(session) => {
                let played = session.date.format(STAMP_FORMAT);
                format!("{FILE_PREFIX}-session-{played}.json")
            }
            Content::All(_) => format!("{FILE_PREFIX}-all-sessions-{stamp}.json"),
            Content::Latest { requested, .. } => {
                format!("{FILE_PREFIX}-last-{requested}-sessions-{stamp}.json")
            }
        }
    }

    /// Writes the artifact into `directory`, creating it if needed
    ///
    /// Returns the path of the written file.
    pub fn write_to(&self, directory: &Path) -> Result<PathBuf, ExportError> {
        let path = directory.join(self.file_name());
        let json = self.to_json()?;

        fs::create_dir_all(directory)
            .and_then(|()| fs::write(&path, json))
            .map_err(|error| ExportError::Write {
                path: path.clone(),
                error,
            })?;

        tracing::info!(path = %path.display(), sessions = self.session_count(), "exported");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Card, Rank, Suit};
    use chrono::TimeZone;

    fn sessions(count: usize) -> Vec<Session> {
        (0..count)
            .map(|i| {
                let mut session = Session::new(1);
                session.id = (100 - i).to_string();
                session.record(Card::new(Rank::Jack, Suit::Diamonds), 1.0 + i as f64);
                session
            })
            .collect()
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 12, 10, 15, 0).unwrap()
    }

    #[test]
    fn test_file_names() {
        let mut history = sessions(3);
        history[0].date = Utc.with_ymd_and_hms(2024, 12, 30, 21, 5, 9).unwrap();

        let single = Export::session(&history[0]).at(fixed_time());
        assert_eq!(
            single.file_name(),
            "card-recognition-session-2024-12-30T21-05-09.json"
        );

        let single = Export::session(&history[1]).at(fixed_time());
        assert_ne!(
            single.file_name(),
            "card-recognition-session-2025-01-12T10-15-00.json"
        );

        let all = Export::all(&history).unwrap().at(fixed_time());
        assert_eq!(
            all.file_name(),
            "card-recognition-all-sessions-2025-01-12T10-15-00.json"
        );

        let latest = Export::latest(&history, 10).unwrap().at(fixed_time());
        assert_eq!(
            latest.file_name(),
            "card-recognition-last-10-sessions-2025-01-12T10-15-00.json"
        );
    }

    #[test]
    fn test_all_sessions_document() {
        let history = sessions(3);
        let json = Export::all(&history).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["totalSessions"], 3);
        assert_eq!(value["sessions"].as_array().unwrap().len(), 3);
        assert!(value["exportDate"].is_string());
    }

    #[test]
    fn test_latest_sessions_document() {
        let history = sessions(4);
        let export = Export::latest(&history, 2).unwrap();
        assert_eq!(export.session_count(), 2);

        let value: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        assert_eq!(value["sessionCount"], 2);
        assert_eq!(value["requestedCount"], 2);
        assert_eq!(value["sessions"][0]["id"], "100");

        let export = Export::latest(&history, 9).unwrap();
        let value: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        assert_eq!(value["sessionCount"], 4);
        assert_eq!(value["requestedCount"], 9);
    }

    #[test]
    fn test_single_session_round_trips() {
        let history = sessions(1);
        let json = Export::session(&history[0]).to_json().unwrap();
        let parsed: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history[0]);
    }

    #[test]
    fn test_empty_history_is_rejected() {
        assert!(matches!(Export::all(&[]), Err(ExportError::NoSessions)));
        assert!(matches!(Export::latest(&[], 5), Err(ExportError::NoSessions)));
        assert!(matches!(
            Export::latest(&sessions(2), 0),
            Err(ExportError::NoSessions)
        ));
    }

    #[test]
    fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");
        let export = Export::all(&sessions(2)).unwrap().at(fixed_time());

        let path = export.write_to(&target).unwrap();
        assert_eq!(path, target.join(export.file_name()));
        assert_eq!(fs::read_to_string(&path).unwrap(), export.to_json().unwrap());
    }
}
