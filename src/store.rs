//! Persistence of named croquis records: a diagram document plus its PNG snapshot.
//!
//! The editor talks to a [`CroquisStore`] it is handed at startup. [`MemoryStore`]
//! keeps everything in process; [`DirStore`] writes one JSON file per record and
//! keeps snapshots as PNG files in a `snapshots/` subdirectory.

use crate::types::Diagram;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Errors returned by store operations. The message is shown to the user as is.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record name was empty or whitespace only.
    #[error("Name must not be empty")]
    InvalidName,
    /// No record with this id exists.
    #[error("Croquis {0} not found")]
    NotFound(Uuid),
    /// Reading or writing the backing files failed.
    #[error("Storage error: {0}")]
    Io(#[from] io::Error),
    /// A stored record could not be (de)serialized.
    #[error("Invalid stored data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Listing entry for a stored croquis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CroquisSummary {
    /// Record id
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A full stored croquis.
#[derive(Debug, Clone, PartialEq)]
pub struct CroquisRecord {
    /// Record id
    pub id: Uuid,
    /// Display name, never blank
    pub name: String,
    /// Structured diagram document
    pub data: Option<Diagram>,
    /// PNG snapshot bytes
    pub snapshot: Option<Vec<u8>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl CroquisRecord {
    /// Listing entry for this record.
    pub fn summary(&self) -> CroquisSummary {
        CroquisSummary {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Changes applied by [`CroquisStore::update`].
///
/// `name` is only changed when given. `data` and `snapshot` always replace the
/// stored values; `None` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CroquisUpdate {
    /// New display name
    pub name: Option<String>,
    /// Replacement document
    pub data: Option<Diagram>,
    /// Replacement snapshot
    pub snapshot: Option<Vec<u8>>,
}

/// Storage backend for croquis records.
pub trait CroquisStore: Send + Sync {
    /// Stores a new record. Fails with [`StoreError::InvalidName`] for a blank name.
    /// If the snapshot cannot be written the record is removed again.
    fn create(
        &self,
        name: &str,
        data: Option<Diagram>,
        snapshot: Option<Vec<u8>>,
    ) -> Result<CroquisSummary, StoreError>;

    /// Loads a record.
    fn get(&self, id: Uuid) -> Result<CroquisRecord, StoreError>;

    /// All records, newest first.
    fn list(&self) -> Result<Vec<CroquisSummary>, StoreError>;

    /// Applies an update to an existing record.
    fn update(&self, id: Uuid, update: CroquisUpdate) -> Result<CroquisSummary, StoreError>;

    /// Deletes a record.
    fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

fn clean_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(StoreError::InvalidName)
    } else {
        Ok(trimmed.to_string())
    }
}

fn newest_first(summaries: &mut [CroquisSummary]) {
    summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// In-process store, mostly useful for tests and the browser build.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CroquisRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, Vec<CroquisRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CroquisStore for MemoryStore {
    fn create(
        &self,
        name: &str,
        data: Option<Diagram>,
        snapshot: Option<Vec<u8>>,
    ) -> Result<CroquisSummary, StoreError> {
        let record = CroquisRecord {
            id: Uuid::new_v4(),
            name: clean_name(name)?,
            data,
            snapshot,
            created_at: Utc::now(),
        };
        let summary = record.summary();
        self.records().push(record);
        Ok(summary)
    }

    fn get(&self, id: Uuid) -> Result<CroquisRecord, StoreError> {
        self.records()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn list(&self) -> Result<Vec<CroquisSummary>, StoreError> {
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut summaries: Vec<_> = self.records().iter().rev().map(|r| r.summary()).collect();
        newest_first(&mut summaries);
        Ok(summaries)
    }

    fn update(&self, id: Uuid, update: CroquisUpdate) -> Result<CroquisSummary, StoreError> {
        let name = update.name.as_deref().map(clean_name).transpose()?;
        let mut records = self.records();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if let Some(name) = name {
            record.name = name;
        }
        record.data = update.data;
        record.snapshot = update.snapshot;
        Ok(record.summary())
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records();
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        records.remove(index);
        Ok(())
    }
}

/// On-disk form of a record, without the snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    data: Option<Diagram>,
}

/// Directory-backed store: `<dir>/<id>.json` plus `<dir>/snapshots/<id>.png`.
#[derive(Debug)]
pub struct DirStore {
    dir: PathBuf,
    snapshots: PathBuf,
    // Serializes writers so a create's rollback cannot race an update.
    lock: Mutex<()>,
}

impl DirStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        let snapshots = dir.join("snapshots");
        fs::create_dir_all(&snapshots)?;
        log::info!("Opened croquis store at {}", dir.display());
        Ok(Self {
            dir,
            snapshots,
            lock: Mutex::new(()),
        })
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id.simple()))
    }

    fn snapshot_path(&self, id: Uuid) -> PathBuf {
        self.snapshots.join(format!("{}.png", id.simple()))
    }

    fn read_record(&self, id: Uuid) -> Result<StoredRecord, StoreError> {
        match fs::read_to_string(self.record_path(id)) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record(&self, record: &StoredRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.record_path(record.id), json)?;
        Ok(())
    }

    fn write_snapshot(&self, id: Uuid, snapshot: Option<&[u8]>) -> Result<(), StoreError> {
        let path = self.snapshot_path(id);
        match snapshot {
            Some(bytes) => fs::write(path, bytes)?,
            None => remove_if_exists(&path)?,
        }
        Ok(())
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn summary_of(record: &StoredRecord) -> CroquisSummary {
    CroquisSummary {
        id: record.id,
        name: record.name.clone(),
        created_at: record.created_at,
    }
}

impl CroquisStore for DirStore {
    fn create(
        &self,
        name: &str,
        data: Option<Diagram>,
        snapshot: Option<Vec<u8>>,
    ) -> Result<CroquisSummary, StoreError> {
        let record = StoredRecord {
            id: Uuid::new_v4(),
            name: clean_name(name)?,
            created_at: Utc::now(),
            data,
        };
        let _guard = self.guard();
        self.write_record(&record)?;

        if let Some(bytes) = snapshot.as_deref() {
            if let Err(e) = self.write_snapshot(record.id, Some(bytes)) {
                log::warn!("Snapshot write failed for {}, removing record: {}", record.id, e);
                if let Err(cleanup) = remove_if_exists(&self.record_path(record.id)) {
                    log::error!("Failed to roll back record {}: {}", record.id, cleanup);
                }
                return Err(e);
            }
        }
        log::debug!("Created croquis {} ({})", record.id, record.name);
        Ok(summary_of(&record))
    }

    fn get(&self, id: Uuid) -> Result<CroquisRecord, StoreError> {
        let stored = self.read_record(id)?;
        let snapshot = match fs::read(self.snapshot_path(id)) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(CroquisRecord {
            id: stored.id,
            name: stored.name,
            data: stored.data,
            snapshot,
            created_at: stored.created_at,
        })
    }

    fn list(&self) -> Result<Vec<CroquisSummary>, StoreError> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Skipping unreadable record {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_slice::<StoredRecord>(&bytes) {
                Ok(record) => summaries.push(summary_of(&record)),
                Err(e) => log::warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }
        newest_first(&mut summaries);
        Ok(summaries)
    }

    fn update(&self, id: Uuid, update: CroquisUpdate) -> Result<CroquisSummary, StoreError> {
        let name = update.name.as_deref().map(clean_name).transpose()?;
        let _guard = self.guard();
        let previous = self.read_record(id)?;
        let record = StoredRecord {
            id: previous.id,
            name: name.unwrap_or_else(|| previous.name.clone()),
            created_at: previous.created_at,
            data: update.data,
        };
        self.write_record(&record)?;

        if let Err(e) = self.write_snapshot(id, update.snapshot.as_deref()) {
            log::warn!("Snapshot write failed for {}, restoring record: {}", id, e);
            if let Err(cleanup) = self.write_record(&previous) {
                log::error!("Failed to restore record {}: {}", id, cleanup);
            }
            return Err(e);
        }
        Ok(summary_of(&record))
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let _guard = self.guard();
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound(id)),
            Err(e) => return Err(e.into()),
        }
        remove_if_exists(&self.snapshot_path(id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MicProps, Symbol, SymbolProps};
    use std::time::Duration;

    fn diagram() -> Diagram {
        let mut diagram = Diagram::new();
        diagram.nodes.push(Symbol::new(SymbolProps::Mic(MicProps::default()), 4.0, 2.0));
        diagram
    }

    fn exercise_crud(store: &dyn CroquisStore) {
        let plot = diagram();
        let first = store.create("  Fiesta  ", Some(plot.clone()), Some(vec![1, 2, 3])).unwrap();
        assert_eq!(first.name, "Fiesta");
        std::thread::sleep(Duration::from_millis(5));
        let second = store.create("Ensayo", None, None).unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Ensayo", "Fiesta"]);

        let record = store.get(first.id).unwrap();
        assert_eq!(record.data, Some(plot));
        assert_eq!(record.snapshot, Some(vec![1, 2, 3]));

        let updated = store
            .update(
                first.id,
                CroquisUpdate {
                    name: None,
                    data: Some(Diagram::new()),
                    snapshot: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Fiesta");
        let record = store.get(first.id).unwrap();
        assert_eq!(record.data, Some(Diagram::new()));
        assert!(record.snapshot.is_none());

        let renamed = store
            .update(
                second.id,
                CroquisUpdate {
                    name: Some("Show".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Show");

        store.delete(second.id).unwrap();
        assert!(matches!(store.get(second.id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(second.id), Err(StoreError::NotFound(_))));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    fn exercise_validation(store: &dyn CroquisStore) {
        assert!(matches!(store.create("   ", None, None), Err(StoreError::InvalidName)));
        assert!(store.list().unwrap().is_empty());

        let created = store.create("Ok", None, None).unwrap();
        let blank = CroquisUpdate {
            name: Some("".into()),
            ..Default::default()
        };
        assert!(matches!(store.update(created.id, blank), Err(StoreError::InvalidName)));
        assert!(matches!(
            store.update(Uuid::new_v4(), CroquisUpdate::default()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_memory_store_crud() {
        exercise_crud(&MemoryStore::new());
    }

    #[test]
    fn test_memory_store_validation() {
        exercise_validation(&MemoryStore::new());
    }

    #[test]
    fn test_dir_store_crud() {
        let dir = tempfile::tempdir().unwrap();
        exercise_crud(&DirStore::open(dir.path()).unwrap());
    }

    #[test]
    fn test_dir_store_validation() {
        let dir = tempfile::tempdir().unwrap();
        exercise_validation(&DirStore::open(dir.path()).unwrap());
    }

    #[test]
    fn test_dir_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = DirStore::open(dir.path()).unwrap();
            store.create("Persisted", Some(diagram()), Some(vec![9])).unwrap().id
        };
        let store = DirStore::open(dir.path()).unwrap();
        let record = store.get(id).unwrap();
        assert_eq!(record.name, "Persisted");
        assert_eq!(record.snapshot, Some(vec![9]));
    }

    #[test]
    fn test_dir_store_rolls_back_when_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        // Replace the snapshot directory with a plain file so PNG writes fail.
        fs::remove_dir(dir.path().join("snapshots")).unwrap();
        fs::write(dir.path().join("snapshots"), b"not a directory").unwrap();

        let result = store.create("Broken", Some(diagram()), Some(vec![1]));
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.list().unwrap().is_empty());

        // Records without a snapshot still work.
        store.create("No snapshot", Some(diagram()), None).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_dir_store_update_restores_record_when_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        let plot = diagram();
        let id = store.create("Before", Some(plot.clone()), Some(vec![7])).unwrap().id;
        fs::remove_dir_all(dir.path().join("snapshots")).unwrap();
        fs::write(dir.path().join("snapshots"), b"not a directory").unwrap();

        let result = store.update(
            id,
            CroquisUpdate {
                name: Some("After".into()),
                data: Some(Diagram::new()),
                snapshot: Some(vec![8]),
            },
        );
        assert!(matches!(result, Err(StoreError::Io(_))));

        let stored = store.read_record(id).unwrap();
        assert_eq!(stored.name, "Before");
        assert_eq!(stored.data, Some(plot));
        assert_eq!(store.list().unwrap()[0].name, "Before");
    }

    #[test]
    fn test_dir_store_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.create("Good", None, None).unwrap();
        fs::write(dir.path().join("junk.json"), "{").unwrap();
        fs::write(dir.path().join("binary.json"), [0xff, 0xfe, 0x00]).unwrap();
        let names: Vec<_> = store.list().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Good"]);
    }
}
