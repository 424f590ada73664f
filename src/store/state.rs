//! AppStore — the single source of truth for profile, answers, path,
//! questionnaire position and the busy flag.
//!
//! The store is constructed explicitly and shared as `Arc<AppStore>`. Every
//! mutation takes the write lock, applies the change, persists the durable
//! subset while still holding the lock (so saves land in mutation order) and
//! broadcasts a [`StoreEvent`] to subscribers.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use super::persist::{PersistedState, StateStorage};
use crate::error::StoreError;
use crate::learning::{AnswersPatch, LearningPath, OnboardingAnswers, UserProfile};

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// An owned snapshot of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub profile: Option<UserProfile>,
    pub answers: OnboardingAnswers,
    pub path: Option<LearningPath>,
    /// Questionnaire step index.
    pub step: usize,
    /// True while a learning path is being generated.
    pub busy: bool,
}

impl AppState {
    fn from_persisted(persisted: PersistedState) -> Self {
        Self {
            profile: persisted.profile,
            answers: persisted.answers,
            path: persisted.path,
            step: 0,
            busy: false,
        }
    }

    fn persisted(&self) -> PersistedState {
        PersistedState {
            profile: self.profile.clone(),
            path: self.path.clone(),
            answers: self.answers.clone(),
        }
    }
}

/// Result of a task completion that actually awarded points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCompletion {
    pub task_id: String,
    pub xp_awarded: u32,
    pub xp_total: u32,
    pub streak: u32,
}

/// Change notifications broadcast to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// Full state (sent to new WebSocket clients and after lag).
    StateSync { state: AppState },
    ProfileChanged { profile: UserProfile },
    AnswersChanged { answers: OnboardingAnswers },
    StepChanged { step: usize },
    PathChanged { path: LearningPath },
    TaskCompleted { completion: TaskCompletion },
    OnboardingFinalized { profile: UserProfile, path: LearningPath },
    BusyChanged { busy: bool },
    Reset,
}

/// The profile/progress store.
pub struct AppStore {
    state: RwLock<AppState>,
    storage: Arc<dyn StateStorage>,
    tx: broadcast::Sender<StoreEvent>,
}

impl AppStore {
    /// Open a store, restoring whatever the storage holds.
    ///
    /// A missing record yields the initial state; a malformed or unreadable
    /// one is logged and also yields the initial state.
    pub async fn open(storage: Arc<dyn StateStorage>) -> Arc<Self> {
        let initial = match storage.load().await {
            Ok(Some(persisted)) => {
                debug!(
                    has_profile = persisted.profile.is_some(),
                    has_path = persisted.path.is_some(),
                    "Restored persisted state"
                );
                AppState::from_persisted(persisted)
            }
            Ok(None) => AppState::default(),
            Err(e) => {
                warn!("Discarding unreadable persisted state: {}", e);
                AppState::default()
            }
        };
        Self::with_state(storage, initial)
    }

    fn with_state(storage: Arc<dyn StateStorage>, state: AppState) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            state: RwLock::new(state),
            storage,
            tx,
        })
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Owned copy of the current state.
    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.state.read().await.profile.clone()
    }

    pub async fn path(&self) -> Option<LearningPath> {
        self.state.read().await.path.clone()
    }

    pub async fn answers(&self) -> OnboardingAnswers {
        self.state.read().await.answers.clone()
    }

    pub async fn step(&self) -> usize {
        self.state.read().await.step
    }

    pub async fn is_busy(&self) -> bool {
        self.state.read().await.busy
    }

    /// Replace the profile wholesale.
    pub async fn set_profile(&self, profile: UserProfile) -> Result<(), StoreError> {
        if profile.id.trim().is_empty() {
            return Err(StoreError::EmptyProfileId);
        }
        let mut state = self.state.write().await;
        state.profile = Some(profile.clone());
        self.persist(&state).await;
        drop(state);

        info!(profile_id = %profile.id, "Profile set");
        self.emit(StoreEvent::ProfileChanged { profile });
        Ok(())
    }

    /// Shallow-merge a partial answer set into the current answers.
    pub async fn update_answers(&self, patch: AnswersPatch) {
        let mut state = self.state.write().await;
        state.answers.merge(patch);
        let answers = state.answers.clone();
        self.persist(&state).await;
        drop(state);

        self.emit(StoreEvent::AnswersChanged { answers });
    }

    /// Like [`update_answers`](Self::update_answers), but refused while a
    /// learning path is being generated. Returns false when refused.
    pub async fn update_answers_if_idle(&self, patch: AnswersPatch) -> bool {
        let mut state = self.state.write().await;
        if state.busy {
            debug!("Answers update refused: generation in progress");
            return false;
        }
        state.answers.merge(patch);
        let answers = state.answers.clone();
        self.persist(&state).await;
        drop(state);

        self.emit(StoreEvent::AnswersChanged { answers });
        true
    }

    /// Set the questionnaire position. Bounds are the caller's concern.
    pub async fn set_step(&self, step: usize) {
        self.state.write().await.step = step;
        debug!(step, "Questionnaire step set");
        self.emit(StoreEvent::StepChanged { step });
    }

    /// Replace the learning path wholesale.
    pub async fn set_path(&self, path: LearningPath) -> Result<(), StoreError> {
        path.validate()?;
        let mut state = self.state.write().await;
        state.path = Some(path.clone());
        self.persist(&state).await;
        drop(state);

        info!(path_id = %path.id, milestones = path.milestones.len(), "Learning path set");
        self.emit(StoreEvent::PathChanged { path });
        Ok(())
    }

    /// Mark a task completed and award its points.
    ///
    /// Returns `None` (and changes nothing) when there is no profile or path,
    /// the task is unknown, or it was already completed.
    pub async fn complete_task(&self, task_id: &str) -> Option<TaskCompletion> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let (Some(profile), Some(path)) = (state.profile.as_mut(), state.path.as_mut()) else {
            debug!(task_id, "Task completion ignored: no profile or path");
            return None;
        };

        let Some(task) = path.find_task_mut(task_id) else {
            debug!(task_id, "Task completion ignored: unknown task");
            return None;
        };
        if task.completed {
            debug!(task_id, "Task completion ignored: already completed");
            return None;
        }

        task.completed = true;
        let xp_awarded = task.xp_reward;
        profile.xp = profile.xp.saturating_add(xp_awarded);
        // Placeholder streak: one per newly completed task.
        profile.streak = profile.streak.saturating_add(1);

        let completion = TaskCompletion {
            task_id: task_id.to_string(),
            xp_awarded,
            xp_total: profile.xp,
            streak: profile.streak,
        };

        self.persist(&guard).await;
        drop(guard);

        info!(
            task_id,
            xp_awarded,
            xp_total = completion.xp_total,
            streak = completion.streak,
            "Task completed"
        );
        self.emit(StoreEvent::TaskCompleted {
            completion: completion.clone(),
        });
        Some(completion)
    }

    /// Commit a generated path together with the profile built for it.
    ///
    /// Answers and step are cleared in the same mutation.
    pub async fn finalize_onboarding(
        &self,
        profile: UserProfile,
        path: LearningPath,
    ) -> Result<(), StoreError> {
        if profile.id.trim().is_empty() {
            return Err(StoreError::EmptyProfileId);
        }
        path.validate()?;

        let mut state = self.state.write().await;
        state.profile = Some(profile.clone());
        state.path = Some(path.clone());
        state.answers = OnboardingAnswers::default();
        state.step = 0;
        self.persist(&state).await;
        drop(state);

        info!(profile_id = %profile.id, path_id = %path.id, "Onboarding finalized");
        self.emit(StoreEvent::OnboardingFinalized { profile, path });
        Ok(())
    }

    /// Clear answers, step, profile, path and the busy flag back to their
    /// initial values and drop the persisted record.
    ///
    /// Any generation run must be stopped first, or its result lands on the
    /// freshly reset store.
    pub async fn reset_onboarding(&self) {
        let mut state = self.state.write().await;
        let was_busy = state.busy;
        *state = AppState::default();
        if let Err(e) = self.storage.clear().await {
            warn!("Failed to clear persisted state: {}", e);
        }
        drop(state);

        info!("Onboarding reset");
        self.emit(StoreEvent::Reset);
        if was_busy {
            self.emit(StoreEvent::BusyChanged { busy: false });
        }
    }

    pub async fn set_busy(&self, busy: bool) {
        self.state.write().await.busy = busy;
        self.emit(StoreEvent::BusyChanged { busy });
    }

    /// Atomically flip busy from false to true and hand back the answers as
    /// they stand at that moment. `None` if already busy.
    pub(crate) async fn try_begin_busy(&self) -> Option<OnboardingAnswers> {
        let mut state = self.state.write().await;
        if state.busy {
            return None;
        }
        state.busy = true;
        let answers = state.answers.clone();
        drop(state);
        self.emit(StoreEvent::BusyChanged { busy: true });
        Some(answers)
    }

    async fn persist(&self, state: &AppState) {
        if let Err(e) = self.storage.save(&state.persisted()).await {
            warn!("Failed to persist state: {}", e);
        }
    }

    fn emit(&self, event: StoreEvent) {
        // Ok if nobody is listening.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::error::StorageError;
    use crate::learning::{Attachment, LearningTask, Milestone, TaskKind};
    use crate::store::persist::MemoryStorage;

    fn two_task_path() -> LearningPath {
        LearningPath {
            id: "path-1".to_string(),
            title: "Backend Developer Learning Path".to_string(),
            description: "Personalized learning path for Ada".to_string(),
            total_weeks: 12,
            milestones: vec![Milestone {
                id: "m1".to_string(),
                title: "Foundations".to_string(),
                description: String::new(),
                target_date: Utc::now(),
                completed: false,
                tasks: vec![
                    LearningTask::new("t1", "Read", TaskKind::Reading, 120, 100),
                    LearningTask::new("t2", "Build", TaskKind::Project, 180, 200),
                ],
                xp_reward: 300,
            }],
            created_at: Utc::now(),
        }
    }

    fn profile() -> UserProfile {
        UserProfile::from_answers(&OnboardingAnswers {
            name: Some("Ada".to_string()),
            ..Default::default()
        })
    }

    async fn store_with_path() -> (Arc<MemoryStorage>, Arc<AppStore>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = AppStore::open(storage.clone()).await;
        store.set_profile(profile()).await.unwrap();
        store.set_path(two_task_path()).await.unwrap();
        (storage, store)
    }

    struct FailingStorage;

    #[async_trait::async_trait]
    impl StateStorage for FailingStorage {
        async fn load(&self) -> Result<Option<PersistedState>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk on fire")))
        }
        async fn save(&self, _state: &PersistedState) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk on fire")))
        }
        async fn clear(&self) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn starts_empty() {
        let store = AppStore::open(Arc::new(MemoryStorage::new())).await;
        assert_eq!(store.snapshot().await, AppState::default());
    }

    #[tokio::test]
    async fn malformed_record_falls_back_to_initial_state() {
        let storage = Arc::new(MemoryStorage::new());
        storage.put_raw("definitely not json").await;
        let store = AppStore::open(storage).await;
        assert_eq!(store.snapshot().await, AppState::default());
    }

    #[tokio::test]
    async fn storage_failures_are_swallowed() {
        let store = AppStore::open(Arc::new(FailingStorage)).await;
        store.update_answers(AnswersPatch::default().name("Ada")).await;
        store.set_profile(profile()).await.unwrap();
        assert_eq!(store.answers().await.name.as_deref(), Some("Ada"));
        assert!(store.profile().await.is_some());
    }

    #[tokio::test]
    async fn set_profile_rejects_empty_id() {
        let store = AppStore::open(Arc::new(MemoryStorage::new())).await;
        let mut p = profile();
        p.id = "  ".to_string();
        assert!(matches!(
            store.set_profile(p).await,
            Err(StoreError::EmptyProfileId)
        ));
        assert!(store.profile().await.is_none());
    }

    #[tokio::test]
    async fn set_path_rejects_duplicate_task_ids() {
        let store = AppStore::open(Arc::new(MemoryStorage::new())).await;
        let mut path = two_task_path();
        path.milestones[0].tasks[1].id = "t1".to_string();
        assert!(store.set_path(path).await.is_err());
        assert!(store.path().await.is_none());
    }

    #[tokio::test]
    async fn complete_task_awards_points_once() {
        let (_storage, store) = store_with_path().await;

        let first = store.complete_task("t1").await.unwrap();
        assert_eq!(first.xp_awarded, 100);
        assert_eq!(first.xp_total, 100);
        assert_eq!(first.streak, 1);

        assert!(store.complete_task("t1").await.is_none());
        let profile = store.profile().await.unwrap();
        assert_eq!(profile.xp, 100);
        assert_eq!(profile.streak, 1);
    }

    #[tokio::test]
    async fn complete_unknown_task_changes_nothing() {
        let (_storage, store) = store_with_path().await;
        let before = store.snapshot().await;
        assert!(store.complete_task("nope").await.is_none());
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn complete_task_without_profile_is_noop() {
        let store = AppStore::open(Arc::new(MemoryStorage::new())).await;
        store.set_path(two_task_path()).await.unwrap();
        assert!(store.complete_task("t1").await.is_none());
        assert!(!store.path().await.unwrap().milestones[0].tasks[0].completed);
    }

    #[tokio::test]
    async fn mutations_round_trip_through_storage() {
        let (storage, store) = store_with_path().await;
        store
            .update_answers(
                AnswersPatch::default()
                    .target_role("Backend Developer")
                    .resume(Some(Attachment::new("cv.pdf", vec![9]))),
            )
            .await;
        store.complete_task("t2").await.unwrap();
        store.set_step(4).await;

        let before = store.snapshot().await;
        let reopened = AppStore::open(storage).await;
        let after = reopened.snapshot().await;

        assert_eq!(after.profile, before.profile);
        assert_eq!(after.path, before.path);
        assert_eq!(after.answers.target_role.as_deref(), Some("Backend Developer"));
        assert!(after.answers.resume.is_none());
        assert_eq!(after.step, 0, "Step is not persisted");
        assert!(!after.busy);
    }

    #[tokio::test]
    async fn reset_restores_initial_values() {
        let (storage, store) = store_with_path().await;
        store.update_answers(AnswersPatch::default().name("Ada")).await;
        store.set_step(3).await;
        store.reset_onboarding().await;

        let snap = store.snapshot().await;
        assert!(snap.profile.is_none());
        assert!(snap.path.is_none());
        assert!(snap.answers.is_empty());
        assert_eq!(snap.step, 0);

        let reopened = AppStore::open(storage).await;
        assert_eq!(reopened.snapshot().await, AppState::default());
    }

    #[tokio::test]
    async fn finalize_clears_answers_and_keeps_profile_and_path() {
        let store = AppStore::open(Arc::new(MemoryStorage::new())).await;
        store.update_answers(AnswersPatch::default().name("Ada")).await;
        store.set_step(8).await;
        store.finalize_onboarding(profile(), two_task_path()).await.unwrap();

        let snap = store.snapshot().await;
        assert!(snap.profile.is_some());
        assert!(snap.path.is_some());
        assert!(snap.answers.is_empty());
        assert_eq!(snap.step, 0);
    }

    #[tokio::test]
    async fn try_begin_busy_is_exclusive() {
        let store = AppStore::open(Arc::new(MemoryStorage::new())).await;
        store.update_answers(AnswersPatch::default().name("Ada")).await;
        let answers = store.try_begin_busy().await.unwrap();
        assert_eq!(answers.name.as_deref(), Some("Ada"));
        assert!(store.try_begin_busy().await.is_none());
        store.set_busy(false).await;
        assert!(store.try_begin_busy().await.is_some());
    }

    #[tokio::test]
    async fn answers_are_frozen_while_busy() {
        let store = AppStore::open(Arc::new(MemoryStorage::new())).await;
        assert!(store.update_answers_if_idle(AnswersPatch::default().name("Ada")).await);

        store.try_begin_busy().await.unwrap();
        assert!(
            !store
                .update_answers_if_idle(AnswersPatch::default().target_role("Data Engineer"))
                .await
        );
        assert!(store.answers().await.target_role.is_none());
        assert_eq!(store.answers().await.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn reset_clears_busy_and_the_record() {
        let (storage, store) = store_with_path().await;
        store.try_begin_busy().await.unwrap();
        store.reset_onboarding().await;

        assert!(!store.is_busy().await);
        assert!(storage.raw().await.is_none());
    }

    #[tokio::test]
    async fn mutations_are_broadcast() {
        let (_storage, store) = store_with_path().await;
        let mut rx = store.subscribe();
        store.complete_task("t1").await.unwrap();
        match rx.recv().await.unwrap() {
            StoreEvent::TaskCompleted { completion } => {
                assert_eq!(completion.task_id, "t1");
                assert_eq!(completion.xp_total, 100);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn two_task_scenario_tracks_xp_and_percentage() {
        use crate::learning::progress::{completed_task_count, completion_percentage, total_task_count};

        let (_storage, store) = store_with_path().await;

        store.complete_task("t1").await.unwrap();
        let path = store.path().await.unwrap();
        assert_eq!(store.profile().await.unwrap().xp, 100);
        assert_eq!(
            completion_percentage(completed_task_count(&path), total_task_count(&path)),
            50
        );

        store.complete_task("t2").await.unwrap();
        let path = store.path().await.unwrap();
        assert_eq!(store.profile().await.unwrap().xp, 300);
        assert_eq!(
            completion_percentage(completed_task_count(&path), total_task_count(&path)),
            100
        );
    }
}
