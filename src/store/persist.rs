//! Durable state record — the single namespaced blob holding profile, path
//! and answers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::learning::{LearningPath, OnboardingAnswers, UserProfile};

/// Namespace the state record is stored under.
pub const STORAGE_NAMESPACE: &str = "skillroute-storage";

/// The persisted subset of the store. Nothing else is written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub profile: Option<UserProfile>,
    pub path: Option<LearningPath>,
    pub answers: OnboardingAnswers,
}

impl PersistedState {
    fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn from_json(namespace: &str, raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw).map_err(|e| StorageError::Malformed {
            namespace: namespace.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Backend-agnostic storage for the state record.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load the record. `Ok(None)` when nothing was ever saved.
    async fn load(&self) -> Result<Option<PersistedState>, StorageError>;

    /// Overwrite the record.
    async fn save(&self, state: &PersistedState) -> Result<(), StorageError>;

    /// Remove the record entirely.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// JSON file on disk: `<dir>/<namespace>.json`.
pub struct FileStorage {
    dir: PathBuf,
    namespace: String,
}

impl FileStorage {
    /// Storage under the default namespace.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_namespace(dir, STORAGE_NAMESPACE)
    }

    pub fn with_namespace(dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            namespace: namespace.into(),
        }
    }

    /// Path of the record file.
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.namespace))
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", self.namespace))
    }

    async fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(dir).await?;
        Ok(())
    }
}

#[async_trait]
impl StateStorage for FileStorage {
    async fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        let raw = match fs::read_to_string(self.file_path()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        PersistedState::from_json(&self.namespace, &raw).map(Some)
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        Self::ensure_dir(&self.dir).await?;
        let json = state.to_json()?;
        // Write-then-rename so a crash never leaves a half-written record.
        let tmp = self.temp_path();
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, self.file_path()).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(self.file_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory key/value storage holding serialized records, keyed by namespace.
pub struct MemoryStorage {
    namespace: String,
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            namespace: STORAGE_NAMESPACE.to_string(),
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Put a raw string under the namespace, bypassing serialization.
    pub async fn put_raw(&self, raw: impl Into<String>) {
        self.records
            .lock()
            .await
            .insert(self.namespace.clone(), raw.into());
    }

    /// The raw serialized record, if any.
    pub async fn raw(&self) -> Option<String> {
        self.records.lock().await.get(&self.namespace).cloned()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        match self.raw().await {
            Some(raw) => PersistedState::from_json(&self.namespace, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        let json = state.to_json()?;
        self.put_raw(json).await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.records.lock().await.remove(&self.namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::learning::{Attachment, LearningTask, Milestone, TaskKind};

    fn sample_state() -> PersistedState {
        let answers = OnboardingAnswers {
            name: Some("Ada".to_string()),
            current_skills: Some(vec!["rust".to_string()]),
            daily_free_hours: Some(1.5),
            resume: Some(Attachment::new("cv.pdf", vec![1, 2, 3])),
            ..Default::default()
        };
        let profile = UserProfile::from_answers(&answers);
        let path = LearningPath {
            id: "path-1".to_string(),
            title: "Backend Developer Learning Path".to_string(),
            description: "For Ada".to_string(),
            total_weeks: 12,
            milestones: vec![Milestone {
                id: "1".to_string(),
                title: "Foundations".to_string(),
                description: String::new(),
                target_date: Utc::now(),
                completed: false,
                tasks: vec![LearningTask::new("1", "Read", TaskKind::Reading, 120, 100)],
                xp_reward: 300,
            }],
            created_at: Utc::now(),
        };
        PersistedState {
            profile: Some(profile),
            path: Some(path),
            answers,
        }
    }

    #[tokio::test]
    async fn file_storage_missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_storage_roundtrip_drops_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));
        let state = sample_state();

        storage.save(&state).await.unwrap();
        assert!(storage.file_path().ends_with("skillroute-storage.json"));

        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(loaded.profile, state.profile);
        assert_eq!(loaded.path, state.path);
        assert!(loaded.answers.resume.is_none());

        let mut expected_answers = state.answers.clone();
        expected_answers.resume = None;
        assert_eq!(loaded.answers, expected_answers);
    }

    #[tokio::test]
    async fn file_storage_malformed_record_errors() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        tokio::fs::write(storage.file_path(), "{ not json").await.unwrap();
        let err = storage.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[tokio::test]
    async fn file_storage_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.save(&PersistedState::default()).await.unwrap();
        storage.clear().await.unwrap();
        storage.clear().await.unwrap();
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persisted_record_has_exactly_three_keys() {
        let storage = MemoryStorage::new();
        storage.save(&sample_state()).await.unwrap();
        let raw: serde_json::Value = serde_json::from_str(&storage.raw().await.unwrap()).unwrap();
        let mut keys: Vec<&str> = raw.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["answers", "path", "profile"]);
    }

    #[tokio::test]
    async fn partial_record_fills_defaults() {
        let storage = MemoryStorage::new();
        storage.put_raw(r#"{"answers": {"name": "Ada"}}"#).await;
        let loaded = storage.load().await.unwrap().unwrap();
        assert!(loaded.profile.is_none());
        assert!(loaded.path.is_none());
        assert_eq!(loaded.answers.name.as_deref(), Some("Ada"));
    }
}
