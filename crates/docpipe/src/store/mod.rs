//! In-memory registry of file stages and job progress.
//!
//! One mutex guards both maps. Every read returns a clone, so callers never
//! hold references into the store.

pub mod events;
pub mod records;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::broadcast;

pub use events::{StoreEvent, StoreEventBroadcaster, EVENT_CHANNEL_CAPACITY};
pub use records::{FileRecord, FileStage, JobRecord, JobStatus, JobUpdate};

#[derive(Default)]
struct StoreInner {
    files: HashMap<String, FileRecord>,
    jobs: HashMap<String, JobRecord>,
}

#[derive(Default)]
pub struct StateStore {
    inner: Mutex<StoreInner>,
    events: StoreEventBroadcaster,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("State store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Live feed of every mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Upserts a file record. The error is kept only for `Failed`.
    pub fn set_file_stage(&self, name: &str, stage: FileStage, error: Option<String>) {
        let snapshot = {
            let mut inner = self.lock();
            let record = inner
                .files
                .entry(name.to_string())
                .or_insert_with(|| FileRecord::new(name, stage));

            record.stage = stage;
            record.error = if stage == FileStage::Failed { error } else { None };
            record.updated_at = Utc::now();
            record.clone()
        };

        self.events.send(StoreEvent::File(snapshot));
    }

    /// Merges the names currently present in storage into the registry.
    ///
    /// Unseen names are added as `raw`; known names absent from storage
    /// become `missing` unless already `deleted`. Nothing is removed.
    pub fn sync_from_storage(&self, known_names: &[String]) {
        let present: HashSet<&str> = known_names.iter().map(String::as_str).collect();
        let mut changed = Vec::new();

        {
            let mut inner = self.lock();

            for name in &present {
                if !inner.files.contains_key(*name) {
                    let record = FileRecord::new(name, FileStage::Raw);
                    changed.push(record.clone());
                    inner.files.insert(name.to_string(), record);
                }
            }

            for record in inner.files.values_mut() {
                if present.contains(record.name.as_str()) {
                    continue;
                }
                if matches!(record.stage, FileStage::Deleted | FileStage::Missing) {
                    continue;
                }
                record.stage = FileStage::Missing;
                record.error = None;
                record.updated_at = Utc::now();
                changed.push(record.clone());
            }
        }

        for record in changed {
            self.events.send(StoreEvent::File(record));
        }
    }

    /// Snapshot of every file record, sorted by name.
    pub fn list_files(&self) -> Vec<FileRecord> {
        let mut files: Vec<FileRecord> = self.lock().files.values().cloned().collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files
    }

    pub fn get_file(&self, name: &str) -> Option<FileRecord> {
        self.lock().files.get(name).cloned()
    }

    /// Marks a known file `deleted`. Returns false for unknown names.
    pub fn delete_file_record(&self, name: &str) -> bool {
        let snapshot = {
            let mut inner = self.lock();
            match inner.files.get_mut(name) {
                Some(record) => {
                    record.stage = FileStage::Deleted;
                    record.error = None;
                    record.updated_at = Utc::now();
                    record.clone()
                }
                None => return false,
            }
        };

        self.events.send(StoreEvent::File(snapshot));
        true
    }

    /// Allocates a `queued` job and returns its id.
    pub fn create_job(&self, total_count: usize) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let record = JobRecord::queued(&id, total_count);

        self.lock().jobs.insert(id.clone(), record.clone());
        self.events.send(StoreEvent::Job(record));
        id
    }

    pub fn get_job(&self, id: &str) -> Option<JobRecord> {
        self.lock().jobs.get(id).cloned()
    }

    /// Applies a partial update. An unknown id gets a synthesized record so
    /// an update racing job creation is never lost.
    pub fn update_job(&self, id: &str, update: JobUpdate) -> JobRecord {
        let snapshot = {
            let mut inner = self.lock();
            let record = inner.jobs.entry(id.to_string()).or_insert_with(|| {
                log::debug!("Synthesizing record for unknown job {}", id);
                JobRecord::queued(id, 0)
            });
            record.apply(&update);
            record.clone()
        };

        self.events.send(StoreEvent::Job(snapshot.clone()));
        snapshot
    }

    pub fn list_jobs(&self) -> Vec<JobRecord> {
        let mut jobs: Vec<JobRecord> = self.lock().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        jobs
    }
}
