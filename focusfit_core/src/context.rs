//! Application context.
//!
//! Holds the configuration and the data-directory layout and ties together
//! what happens after a session completes. Front ends build one context at
//! startup and pass it by reference.

use crate::history::{JsonlSink, SessionSink};
use crate::store::LocalStore;
use crate::sync::{DirectoryBackend, FlushReport, SyncKind, SyncQueue, SyncRecord};
use crate::{Config, Result, SessionKind, SessionRecord, UserProgress, UserSettings};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub struct AppContext {
    pub config: Config,
    data_dir: PathBuf,
    store: LocalStore,
}

impl AppContext {
    pub fn new(config: Config, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let store = LocalStore::new(data_dir.join("state"));
        Self {
            config,
            data_dir,
            store,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join("history")
    }

    pub fn history_path(&self) -> PathBuf {
        self.history_dir().join("sessions.jsonl")
    }

    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join("sessions.csv")
    }

    pub fn sync_queue(&self) -> SyncQueue {
        SyncQueue::new(self.data_dir.join("sync").join("pending.jsonl"))
    }

    pub fn load_settings(&self) -> Result<UserSettings> {
        UserSettings::load_or_init(&self.store, &self.config)
    }

    /// Persist settings and queue them for sync
    pub fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        settings.save(&self.store)?;
        self.queue_for_sync(SyncKind::Settings, settings);
        Ok(())
    }

    pub fn load_progress(&self) -> Result<UserProgress> {
        UserProgress::load(&self.store)
    }

    /// Record a completed session
    ///
    /// Updates progress, appends to history and queues progress for sync.
    /// Returns the achievements unlocked by this session.
    pub fn record_completion(&self, record: &SessionRecord) -> Result<Vec<&'static str>> {
        let mut progress = self.load_progress()?;
        let unlocked = match record.kind {
            SessionKind::Workout => {
                progress.record_workout(record.duration_secs, record.completed_at)
            }
            SessionKind::Focus => {
                progress.record_focus_session(record.duration_secs, record.completed_at)
            }
        };
        progress.save(&self.store)?;

        let mut sink = JsonlSink::new(self.history_path());
        sink.append(record)?;

        self.queue_for_sync(SyncKind::Progress, &progress);
        Ok(unlocked)
    }

    /// Push queued records to the configured remote
    ///
    /// Returns `None` when sync is not configured.
    pub fn sync_now(&self) -> Result<Option<FlushReport>> {
        let Some(remote_dir) = self.config.sync.remote_dir.as_ref() else {
            tracing::info!("Sync is not configured; skipping");
            return Ok(None);
        };
        if self.config.sync.user_id.is_none() {
            tracing::info!("Sync has no user id; skipping");
            return Ok(None);
        }
        let mut backend = DirectoryBackend::new(remote_dir);
        self.sync_queue().flush(&mut backend).map(Some)
    }

    /// Queue a snapshot; sync problems never fail the caller
    fn queue_for_sync<T: Serialize>(&self, kind: SyncKind, value: &T) {
        let Some(user_id) = self.config.sync.user_id.as_deref() else {
            return;
        };
        let queued = SyncRecord::new(user_id, kind, Utc::now(), value)
            .and_then(|record| self.sync_queue().enqueue(&record));
        if let Err(e) = queued {
            tracing::warn!("Failed to queue {:?} for sync: {}", kind, e);
        }
    }
}
