//! File-based concept storage for Lockin.
//!
//! Each concept is stored as one JSON document in `~/.lockin/concepts/`
//! holding its metadata, scheduling state and review history. Atomic
//! writes are achieved via temp file + rename pattern.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::config::concepts_dir;
use crate::core::{Concept, ConceptState, ReviewHistory, ReviewRecord};
use crate::error::{LockinError, Result};
use crate::storage::ConceptStore;

/// On-disk document of one concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConceptDocument {
    concept: Concept,
    #[serde(default)]
    reviews: ReviewHistory,
}

/// File-based concept storage.
///
/// Stores concepts as JSON files in a configurable directory. Writes that
/// read a document first (`put`, `commit_review`) are serialized by a lock
/// shared between clones, so the conflict check and the write happen as one
/// step. A second store opened on the same directory gets its own lock.
#[derive(Debug, Clone)]
pub struct FileConceptStore {
    /// Directory where concept files are stored.
    concepts_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileConceptStore {
    /// Create a new file concept store with the default directory.
    ///
    /// Uses `~/.lockin/concepts/` or `$LOCKIN_HOME/concepts/`.
    pub fn new() -> Result<Self> {
        let dir = concepts_dir().ok_or_else(|| {
            LockinError::config("Could not determine concepts directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a new file concept store with a custom directory.
    pub fn with_dir(concepts_dir: impl Into<PathBuf>) -> Result<Self> {
        let concepts_dir = concepts_dir.into();

        if !concepts_dir.exists() {
            fs::create_dir_all(&concepts_dir)
                .map_err(|e| LockinError::storage(&concepts_dir, e))?;
        }

        Ok(Self {
            concepts_dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// The directory holding concept files.
    pub fn dir(&self) -> &Path {
        &self.concepts_dir
    }

    /// IDs become file names, so only plain identifiers are accepted.
    fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    }

    /// Get the path for a concept file.
    fn concept_path(&self, id: &str) -> PathBuf {
        self.concepts_dir.join(format!("{}.json", id))
    }

    /// Get the path for a temp file used during atomic writes.
    fn temp_path(&self, id: &str) -> PathBuf {
        self.concepts_dir.join(format!(".{}.json.tmp", id))
    }

    /// Read a concept document, `None` if it doesn't exist.
    fn read_document(&self, id: &str) -> Result<Option<ConceptDocument>> {
        if !Self::is_valid_id(id) {
            return Ok(None);
        }

        let path = self.concept_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| LockinError::storage(&path, e))?;
        let document: ConceptDocument = serde_json::from_str(&content)?;

        Ok(Some(document))
    }

    /// Write a concept document atomically using temp file + rename.
    fn atomic_write(&self, document: &ConceptDocument) -> Result<()> {
        let id = document.concept.id();
        if !Self::is_valid_id(id) {
            return Err(LockinError::storage(
                self.concept_path(id),
                io::Error::new(io::ErrorKind::InvalidInput, "invalid concept id"),
            ));
        }

        let final_path = self.concept_path(id);
        let temp_path = self.temp_path(id);

        let json = serde_json::to_string_pretty(document)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| LockinError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| LockinError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| LockinError::storage(&temp_path, e))?;
        }

        // Rename temp file to final path (atomic on POSIX)
        fs::rename(&temp_path, &final_path).map_err(|e| LockinError::storage(&final_path, e))?;

        tracing::debug!(concept_id = id, path = %final_path.display(), "concept written");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| {
            LockinError::storage(
                &self.concepts_dir,
                io::Error::other("concept store lock poisoned"),
            )
        })
    }
}

impl ConceptStore for FileConceptStore {
    fn get(&self, id: &str) -> Result<Option<Concept>> {
        Ok(self.read_document(id)?.map(|doc| doc.concept))
    }

    fn put(&self, concept: &Concept) -> Result<()> {
        let _guard = self.lock()?;

        let reviews = self
            .read_document(concept.id())?
            .map(|doc| doc.reviews)
            .unwrap_or_default();

        self.atomic_write(&ConceptDocument {
            concept: concept.clone(),
            reviews,
        })
    }

    fn list(&self, limit: usize) -> Result<Vec<Concept>> {
        if !self.concepts_dir.exists() {
            return Ok(Vec::new());
        }

        let mut concepts: Vec<Concept> = Vec::new();

        let entries = fs::read_dir(&self.concepts_dir)
            .map_err(|e| LockinError::storage(&self.concepts_dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| LockinError::storage(&self.concepts_dir, e))?;
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            if path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true)
            {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<ConceptDocument>(&content).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(document) => concepts.push(document.concept),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable concept file")
                }
            }
        }

        // Newest first; id breaks ties so the order is stable
        concepts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id().cmp(b.id()))
        });
        concepts.truncate(limit);

        Ok(concepts)
    }

    fn delete(&self, id: &str) -> Result<()> {
        if !Self::is_valid_id(id) {
            return Ok(());
        }

        let _guard = self.lock()?;
        let path = self.concept_path(id);

        if path.exists() {
            fs::remove_file(&path).map_err(|e| LockinError::storage(&path, e))?;
        }

        // Also clean up any temp file
        let temp_path = self.temp_path(id);
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        Ok(())
    }

    fn history(&self, id: &str) -> Result<ReviewHistory> {
        self.read_document(id)?
            .map(|doc| doc.reviews)
            .ok_or_else(|| LockinError::concept_not_found(id))
    }

    fn commit_review(
        &self,
        expected: &ConceptState,
        updated: &ConceptState,
        record: &ReviewRecord,
    ) -> Result<()> {
        let _guard = self.lock()?;

        let mut document = self
            .read_document(&expected.id)?
            .ok_or_else(|| LockinError::concept_not_found(&expected.id))?;

        if document.concept.state != *expected {
            tracing::debug!(concept_id = %expected.id, "stale review rejected");
            return Err(LockinError::conflict(&expected.id));
        }

        document.concept.state = updated.clone();
        document.reviews.push(record.clone());

        self.atomic_write(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::{
        test_concept_store_commit_review, test_concept_store_crud, test_concept_store_list_order,
    };
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_store() -> (FileConceptStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileConceptStore::with_dir(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_file_concept_store_crud() {
        let (store, _dir) = create_test_store();
        test_concept_store_crud(&store);
    }

    #[test]
    fn test_file_concept_store_list_order() {
        let (store, _dir) = create_test_store();
        test_concept_store_list_order(&store);
    }

    #[test]
    fn test_file_concept_store_commit_review() {
        let (store, _dir) = create_test_store();
        test_concept_store_commit_review(&store);
    }

    #[test]
    #[serial_test::serial]
    fn test_new_uses_lockin_home() {
        let home = TempDir::new().unwrap();
        std::env::set_var("LOCKIN_HOME", home.path());

        let store = FileConceptStore::new().unwrap();
        assert_eq!(store.dir(), home.path().join("concepts").as_path());
        assert!(store.dir().is_dir());

        std::env::remove_var("LOCKIN_HOME");
    }

    #[test]
    fn test_with_dir_creates_directory() {
        let dir = TempDir::new().unwrap();
        let concepts_path = dir.path().join("concepts");

        assert!(!concepts_path.exists());

        let store = FileConceptStore::with_dir(&concepts_path).unwrap();

        assert!(concepts_path.is_dir());
        assert_eq!(store.dir(), concepts_path.as_path());
    }

    #[test]
    fn test_concept_path() {
        let (store, _dir) = create_test_store();
        assert!(store.concept_path("abc").ends_with("abc.json"));
    }

    #[test]
    fn test_get_nonexistent() {
        let (store, _dir) = create_test_store();
        assert!(store.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_path_like_ids_are_never_found() {
        let (store, _dir) = create_test_store();
        assert!(store.get("../escape").unwrap().is_none());
        assert!(store.get("").unwrap().is_none());
        assert!(store.get(".hidden").unwrap().is_none());
        store.delete("../escape").unwrap();
    }

    #[test]
    fn test_put_rejects_path_like_id() {
        let (store, _dir) = create_test_store();
        let concept = Concept::new("x", "", Utc::now()).with_id("a/b");
        assert!(matches!(
            store.put(&concept),
            Err(LockinError::Storage { .. })
        ));
    }

    #[test]
    fn test_document_holds_state_and_reviews() {
        let (store, _dir) = create_test_store();
        let concept = Concept::new("Traits", "Static dispatch", Utc::now()).with_id("traits");
        store.put(&concept).unwrap();

        let outcome = crate::scheduling::Scheduler::new()
            .record_review(&concept.state, 3, Utc::now())
            .unwrap();
        store
            .commit_review(&concept.state, &outcome.state, &outcome.record)
            .unwrap();

        let content = fs::read_to_string(store.concept_path("traits")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["concept"]["id"], "traits");
        assert_eq!(value["concept"]["last_interval_days"], 1.0);
        assert_eq!(value["reviews"].as_array().unwrap().len(), 1);
        assert_eq!(value["reviews"][0]["recall_grade"], 3);
    }

    #[test]
    fn test_temp_file_cleaned_up() {
        let (store, _dir) = create_test_store();
        let concept = Concept::new("t", "", Utc::now()).with_id("temp");
        store.put(&concept).unwrap();
        assert!(!store.temp_path("temp").exists());
    }

    #[test]
    fn test_list_ignores_temp_and_invalid_files() {
        let (store, dir) = create_test_store();

        let concept = Concept::new("valid", "", Utc::now());
        store.put(&concept).unwrap();

        fs::write(dir.path().join(".temp.json.tmp"), "{}").unwrap();
        fs::write(dir.path().join("invalid.json"), "not valid json").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let concepts = store.list(10).unwrap();
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0].name, "valid");
    }

    #[test]
    fn test_get_corrupt_file_is_an_error() {
        let (store, dir) = create_test_store();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        assert!(matches!(store.get("broken"), Err(LockinError::Serde { .. })));
    }

    #[test]
    fn test_clones_share_the_write_lock() {
        use std::thread;

        let (store, _dir) = create_test_store();
        let concept = Concept::new("shared", "", Utc::now());
        store.put(&concept).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let expected = concept.state.clone();
                thread::spawn(move || {
                    let outcome = crate::scheduling::Scheduler::new()
                        .record_review(&expected, 4, Utc::now())
                        .unwrap();
                    store
                        .commit_review(&expected, &outcome.state, &outcome.record)
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(store.history(concept.id()).unwrap().len(), 1);
    }

    #[test]
    fn test_write_lock_scope() {
        let (store, dir) = create_test_store();
        let clone = store.clone();
        let reopened = FileConceptStore::with_dir(dir.path()).unwrap();

        assert!(Arc::ptr_eq(&store.write_lock, &clone.write_lock));
        assert!(!Arc::ptr_eq(&store.write_lock, &reopened.write_lock));
        assert_eq!(reopened.dir(), store.dir());
    }
}
