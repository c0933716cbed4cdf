//! Snapshot persistence across restarts.
//!
//! Two independent keys, mirrored as files in a storage directory:
//! `incoming.json` carries a freshly uploaded collection to the engine and
//! is consumed (deleted) on read; `session.json` holds the full session
//! snapshot, written repeatedly and read once at startup. A session
//! snapshot older than the staleness threshold is discarded.
//!
//! Persistence is best-effort by contract: callers treat any failure as
//! "no snapshot available" and fall back to fresh initialization.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use quizforge_core::model::{ExerciseRecord, ExerciseSet};

use crate::config::ExamConfig;
use crate::controller::ExamResults;
use crate::error::PersistError;
use crate::state::{SessionPhase, UserStats};

/// Snapshots older than this are discarded at load.
pub const MAX_SNAPSHOT_AGE_HOURS: i64 = 24;

/// Cadence for interval-driven autosaves, in seconds.
pub const AUTOSAVE_INTERVAL_SECS: u64 = 5;

const SESSION_FILE: &str = "session.json";
const INCOMING_FILE: &str = "incoming.json";

/// Everything needed to resume a session after a reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub saved_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub set: ExerciseSet,
    pub current: Vec<ExerciseRecord>,
    pub phase: SessionPhase,
    pub current_index: usize,
    pub config: Option<ExamConfig>,
    pub exam_start: Option<DateTime<Utc>>,
    pub checked: BTreeMap<u32, bool>,
    pub stats: UserStats,
    pub results: Option<ExamResults>,
}

impl Snapshot {
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.saved_at
    }

    /// Strictly older than the threshold; exactly 24 hours still restores.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age_at(now) > Duration::hours(MAX_SNAPSHOT_AGE_HOURS)
    }
}

/// A collection handed from the upload boundary to the engine, consumed on
/// the engine's next read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingCollection {
    pub loaded_at: DateTime<Utc>,
    pub set: ExerciseSet,
}

/// Storage seam between the session controller and wherever snapshots live.
pub trait SnapshotStore {
    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError>;
    fn load(&self) -> Result<Option<Snapshot>, PersistError>;
    fn clear(&self) -> Result<(), PersistError>;

    fn put_incoming(&self, incoming: &IncomingCollection) -> Result<(), PersistError>;
    /// Read and clear the incoming collection, if any.
    fn take_incoming(&self) -> Result<Option<IncomingCollection>, PersistError>;
}

/// Snapshot files under one directory.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSnapshotStore { dir: dir.into() }
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn incoming_path(&self) -> PathBuf {
        self.dir.join(INCOMING_FILE)
    }

    /// Load the snapshot and apply the staleness rule at `now`. A stale
    /// snapshot is deleted and reported as [`PersistError::Stale`].
    pub fn load_fresh(&self, now: DateTime<Utc>) -> Result<Option<Snapshot>, PersistError> {
        let Some(snapshot) = self.load()? else {
            return Ok(None);
        };
        if snapshot.is_stale(now) {
            let age_hours = snapshot.age_at(now).num_hours();
            tracing::info!(age_hours, "discarding stale session snapshot");
            self.clear()?;
            return Err(PersistError::Stale { age_hours });
        }
        Ok(Some(snapshot))
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, PersistError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string(value)?;
    fs::write(path, text)?;
    Ok(())
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        write_json(&self.session_path(), snapshot)
    }

    fn load(&self) -> Result<Option<Snapshot>, PersistError> {
        read_json(&self.session_path())
    }

    fn clear(&self) -> Result<(), PersistError> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn put_incoming(&self, incoming: &IncomingCollection) -> Result<(), PersistError> {
        write_json(&self.incoming_path(), incoming)
    }

    fn take_incoming(&self) -> Result<Option<IncomingCollection>, PersistError> {
        let path = self.incoming_path();
        let incoming = read_json(&path)?;
        if incoming.is_some() {
            fs::remove_file(&path)?;
        }
        Ok(incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SessionController;

    fn sample_set() -> ExerciseSet {
        serde_json::from_str(
            r#"{"course": "Test", "exercises": [
                {"id": 1, "type": "true_false", "question": "One", "correct_answer": true},
                {"id": 2, "type": "true_false", "question": "Two", "correct_answer": false}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let now = Utc::now();
        let ctrl = SessionController::new(sample_set(), now);
        store.save(&ctrl.snapshot(now)).unwrap();

        let loaded = store.load_fresh(now).unwrap().unwrap();
        assert_eq!(loaded.session_id, ctrl.session_id());
        assert_eq!(loaded.current.len(), 2);

        // The loaded snapshot must rebuild into a working controller.
        let restored = SessionController::restore(loaded, now);
        assert_eq!(restored.exercise_count(), 2);
        assert_eq!(restored.session_id(), ctrl.session_id());
    }

    #[test]
    fn missing_snapshot_is_none_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        assert!(store.load_fresh(Utc::now()).unwrap().is_none());
    }

    #[test]
    fn stale_snapshot_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let saved = Utc::now();
        let ctrl = SessionController::new(sample_set(), saved);
        store.save(&ctrl.snapshot(saved)).unwrap();

        let later = saved + Duration::hours(MAX_SNAPSHOT_AGE_HOURS) + Duration::seconds(1);
        assert!(matches!(
            store.load_fresh(later),
            Err(PersistError::Stale { .. })
        ));
        // Gone after the failed load.
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn snapshot_exactly_at_the_threshold_survives() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let saved = Utc::now();
        let ctrl = SessionController::new(sample_set(), saved);
        store.save(&ctrl.snapshot(saved)).unwrap();

        let later = saved + Duration::hours(MAX_SNAPSHOT_AGE_HOURS);
        assert!(store.load_fresh(later).unwrap().is_some());
    }

    #[test]
    fn incoming_collection_is_consumed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        store
            .put_incoming(&IncomingCollection {
                loaded_at: Utc::now(),
                set: sample_set(),
            })
            .unwrap();
        assert!(store.take_incoming().unwrap().is_some());
        assert!(store.take_incoming().unwrap().is_none());
    }

    #[test]
    fn corrupt_snapshot_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        fs::write(store.session_path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(PersistError::Corrupt(_))));
    }
}
