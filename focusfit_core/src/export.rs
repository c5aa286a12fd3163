//! CSV rollup of the session history.
//!
//! The history file is appended to a CSV (headers written once), the CSV is
//! synced to disk, and only then is the history file renamed to
//! `.processed`. Processed files are kept for manual recovery until
//! `cleanup_processed` removes them.

use crate::{Result, SessionRecord};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    kind: String,
    started_at: String,
    completed_at: String,
    duration_secs: u32,
    exercises: String,
}

impl From<&SessionRecord> for CsvRow {
    fn from(session: &SessionRecord) -> Self {
        CsvRow {
            id: session.id.to_string(),
            kind: session.kind.to_string(),
            started_at: session.started_at.to_rfc3339(),
            completed_at: session.completed_at.to_rfc3339(),
            duration_secs: session.duration_secs,
            exercises: session.exercises.join("; "),
        }
    }
}

/// Roll the history file up into CSV and archive it
///
/// Returns the number of sessions written.
pub fn rollup_to_csv(history_path: &Path, csv_path: &Path) -> Result<usize> {
    let sessions = crate::history::read_sessions(history_path)?;

    if sessions.is_empty() {
        tracing::info!("No sessions in history to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for session in &sessions {
        writer.serialize(CsvRow::from(session))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} sessions to CSV", sessions.len());

    let processed_path = processed_path_for(history_path);
    std::fs::rename(history_path, &processed_path)?;

    tracing::info!("Archived history to {:?}", processed_path);

    Ok(sessions.len())
}

fn processed_path_for(history_path: &Path) -> std::path::PathBuf {
    let mut name = history_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".processed");
    history_path.with_file_name(name)
}

/// Remove archived `.processed` history files in `dir`
pub fn cleanup_processed(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed history: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed history files", count);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{JsonlSink, SessionSink};
    use crate::SessionKind;
    use chrono::Utc;
    use std::fs::File;

    fn create_test_session(kind: SessionKind) -> SessionRecord {
        SessionRecord::new(kind, Utc::now(), Utc::now(), 90, vec!["Cat-Cow".into()])
    }

    #[test]
    fn test_rollup_creates_csv_and_archives() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history_path = temp_dir.path().join("history.jsonl");
        let csv_path = temp_dir.path().join("sessions.csv");

        let mut sink = JsonlSink::new(&history_path);
        for _ in 0..3 {
            sink.append(&create_test_session(SessionKind::Workout))
                .unwrap();
        }

        let count = rollup_to_csv(&history_path, &csv_path).unwrap();
        assert_eq!(count, 3);
        assert!(csv_path.exists());
        assert!(!history_path.exists());
        assert!(temp_dir.path().join("history.jsonl.processed").exists());

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert!(contents.starts_with("id,kind,started_at"));
        assert!(contents.contains("Cat-Cow"));
    }

    #[test]
    fn test_rollup_appends_without_repeating_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history_path = temp_dir.path().join("history.jsonl");
        let csv_path = temp_dir.path().join("sessions.csv");

        let mut sink = JsonlSink::new(&history_path);
        sink.append(&create_test_session(SessionKind::Focus)).unwrap();
        assert_eq!(rollup_to_csv(&history_path, &csv_path).unwrap(), 1);

        let mut sink = JsonlSink::new(&history_path);
        sink.append(&create_test_session(SessionKind::Workout))
            .unwrap();
        assert_eq!(rollup_to_csv(&history_path, &csv_path).unwrap(), 1);

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 2);
    }

    #[test]
    fn test_empty_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history_path = temp_dir.path().join("history.jsonl");
        File::create(&history_path).unwrap();

        let count = rollup_to_csv(&history_path, &temp_dir.path().join("s.csv")).unwrap();
        assert_eq!(count, 0);
        assert!(history_path.exists());
    }

    #[test]
    fn test_cleanup_processed() {
        let temp_dir = tempfile::tempdir().unwrap();
        File::create(temp_dir.path().join("a.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join("b.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join("history.jsonl")).unwrap();

        assert_eq!(cleanup_processed(temp_dir.path()).unwrap(), 2);
        assert!(temp_dir.path().join("history.jsonl").exists());
    }
}
