//! Backend sync with last-write-wins semantics.
//!
//! Settings and progress snapshots are queued locally (JSON Lines) whenever
//! they change and pushed to the backend on an explicit flush. A failed push
//! is logged and the record stays queued for the next flush; there is no
//! automatic retry or backoff.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Settings,
    Progress,
}

impl SyncKind {
    fn as_str(self) -> &'static str {
        match self {
            SyncKind::Settings => "settings",
            SyncKind::Progress => "progress",
        }
    }
}

/// A snapshot of one object for one user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub user_id: String,
    pub kind: SyncKind,
    pub updated_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl SyncRecord {
    pub fn new<T: Serialize>(
        user_id: impl Into<String>,
        kind: SyncKind,
        updated_at: DateTime<Utc>,
        value: &T,
    ) -> Result<Self> {
        Ok(Self {
            user_id: user_id.into(),
            kind,
            updated_at,
            payload: serde_json::to_value(value)?,
        })
    }

    /// Decode the payload back into its typed form
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Pick the newer of two snapshots; ties keep the local one
pub fn merge_last_write_wins(local: SyncRecord, remote: Option<SyncRecord>) -> SyncRecord {
    match remote {
        Some(remote) if remote.updated_at > local.updated_at => remote,
        _ => local,
    }
}

pub trait SyncBackend {
    fn push(&mut self, record: &SyncRecord) -> Result<()>;
    fn fetch(&self, user_id: &str, kind: SyncKind) -> Result<Option<SyncRecord>>;
}

/// Backend storing one JSON file per user and kind in a directory
///
/// A push never replaces a newer record already stored.
#[derive(Clone, Debug)]
pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, user_id: &str, kind: SyncKind) -> Result<PathBuf> {
        if user_id.is_empty()
            || !user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::Sync(format!("invalid user id '{}'", user_id)));
        }
        Ok(self
            .root
            .join(user_id)
            .join(format!("{}.json", kind.as_str())))
    }
}

impl SyncBackend for DirectoryBackend {
    fn push(&mut self, record: &SyncRecord) -> Result<()> {
        let path = self.path_for(&record.user_id, record.kind)?;
        let existing = self.fetch(&record.user_id, record.kind)?;
        let winner = merge_last_write_wins(record.clone(), existing);
        if &winner != record {
            tracing::info!(
                "Remote {} for {} is newer; keeping it",
                record.kind.as_str(),
                record.user_id
            );
            return Ok(());
        }

        let dir = path
            .parent()
            .ok_or_else(|| Error::Sync("sync path missing parent".into()))?;
        std::fs::create_dir_all(dir)?;
        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut temp, record)?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Pushed {} for {}", record.kind.as_str(), record.user_id);
        Ok(())
    }

    fn fetch(&self, user_id: &str, kind: SyncKind) -> Result<Option<SyncRecord>> {
        let path = self.path_for(user_id, kind)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&contents) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable remote record {:?}: {}", path, e);
                Ok(None)
            }
        }
    }
}

/// Outcome of flushing the queue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub pushed: usize,
    pub failed: usize,
    /// Older snapshots dropped because a newer one of the same kind was queued
    pub superseded: usize,
}

/// Locally queued records waiting to be pushed
pub struct SyncQueue {
    path: PathBuf,
}

impl SyncQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn enqueue(&self, record: &SyncRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(serde_json::to_string(record)?.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;
        tracing::debug!("Queued {} for sync", record.kind.as_str());
        Ok(())
    }

    pub fn pending(&self) -> Result<Vec<SyncRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut records = Vec::new();
        for (line_num, line) in BufReader::new(&file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SyncRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Dropping malformed sync entry at line {}: {}", line_num + 1, e)
                }
            }
        }

        file.unlock()?;
        Ok(records)
    }

    /// Push every pending record once
    ///
    /// Only the newest snapshot per user and kind is pushed. Records that
    /// fail stay queued.
    pub fn flush<B: SyncBackend + ?Sized>(&self, backend: &mut B) -> Result<FlushReport> {
        let pending = self.pending()?;
        let mut report = FlushReport::default();

        let mut latest: Vec<SyncRecord> = Vec::new();
        for record in pending {
            match latest
                .iter_mut()
                .find(|r| r.user_id == record.user_id && r.kind == record.kind)
            {
                Some(existing) => {
                    report.superseded += 1;
                    if record.updated_at >= existing.updated_at {
                        *existing = record;
                    }
                }
                None => latest.push(record),
            }
        }

        let mut remaining = Vec::new();
        for record in latest {
            match backend.push(&record) {
                Ok(()) => report.pushed += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to sync {} for {}: {}",
                        record.kind.as_str(),
                        record.user_id,
                        e
                    );
                    report.failed += 1;
                    remaining.push(record);
                }
            }
        }

        self.rewrite(&remaining)?;
        tracing::info!(
            "Sync flush: {} pushed, {} failed, {} superseded",
            report.pushed,
            report.failed,
            report.superseded
        );
        Ok(report)
    }

    fn rewrite(&self, records: &[SyncRecord]) -> Result<()> {
        if records.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::Sync("queue path missing parent".into()))?;
        let temp = NamedTempFile::new_in(dir)?;
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            for record in records {
                writer.write_all(serde_json::to_string(record)?.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}
