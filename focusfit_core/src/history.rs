//! Completed-session history log.
//!
//! Sessions are appended to a JSON Lines file with file locking so that
//! concurrent invocations never interleave partial lines.

use crate::{Result, SessionKind, SessionRecord};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Session sink trait for persisting completed sessions
pub trait SessionSink {
    fn append(&mut self, session: &SessionRecord) -> Result<()>;
}

/// JSONL-based session sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, session: &SessionRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(session)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended {} session {} to history", session.kind, session.id);
        Ok(())
    }
}

/// Read all sessions from a history file
///
/// Malformed lines are logged and skipped.
pub fn read_sessions(path: &Path) -> Result<Vec<SessionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SessionRecord>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from history", sessions.len());
    Ok(sessions)
}

/// Sessions of one kind completed at or after `since`, newest first
pub fn recent_sessions(
    path: &Path,
    kind: SessionKind,
    since: DateTime<Utc>,
) -> Result<Vec<SessionRecord>> {
    let mut sessions: Vec<_> = read_sessions(path)?
        .into_iter()
        .filter(|s| s.kind == kind && s.completed_at >= since)
        .collect();
    sessions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_session(kind: SessionKind, completed_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord::new(
            kind,
            completed_at - Duration::minutes(5),
            completed_at,
            300,
            vec!["Push-ups".into()],
        )
    }

    #[test]
    fn test_append_and_read_single_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.jsonl");

        let session = create_test_session(SessionKind::Workout, Utc::now());
        let session_id = session.id;

        let mut sink = JsonlSink::new(&path);
        sink.append(&session).unwrap();

        let sessions = read_sessions(&path).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, session_id);
        assert_eq!(sessions[0].exercises, vec!["Push-ups".to_string()]);
    }

    #[test]
    fn test_skips_malformed_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.jsonl");

        let mut sink = JsonlSink::new(&path);
        sink.append(&create_test_session(SessionKind::Focus, Utc::now()))
            .unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ not json").unwrap();
        sink.append(&create_test_session(SessionKind::Focus, Utc::now()))
            .unwrap();

        assert_eq!(read_sessions(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = read_sessions(&temp_dir.path().join("missing.jsonl")).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_recent_sessions_filters_and_sorts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.jsonl");
        let now = Utc::now();

        let mut sink = JsonlSink::new(&path);
        sink.append(&create_test_session(SessionKind::Workout, now - Duration::days(10)))
            .unwrap();
        sink.append(&create_test_session(SessionKind::Workout, now - Duration::days(2)))
            .unwrap();
        sink.append(&create_test_session(SessionKind::Focus, now)).unwrap();
        sink.append(&create_test_session(SessionKind::Workout, now - Duration::days(1)))
            .unwrap();

        let recent = recent_sessions(&path, SessionKind::Workout, now - Duration::days(7)).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].completed_at > recent[1].completed_at);
    }
}
