//! Wizard — drives the questionnaire over the store and runs learning path
//! generation when the last step is answered.
//!
//! Generation runs as its own tokio task. While it runs the store's busy
//! flag is set and every navigation call and answer edit is refused with
//! [`WizardError::Busy`]. The task works from the answers as they stood when
//! it started and finishes in exactly one of four ways: success (profile and
//! path committed), generator failure (including a panic), timeout, or
//! cancellation. Only success touches profile, path or answers; the other
//! three clear the busy flag and leave the wizard on the terminal step.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::step::{StepInput, WizardStep};
use crate::config::GenerationConfig;
use crate::error::{GenerationError, WizardError};
use crate::generator::{PathGenerator, PathRequest};
use crate::learning::{AnswersPatch, LearningPath, OnboardingAnswers, UserProfile};
use crate::store::AppStore;

/// What the UI renders for the current step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepPrompt {
    pub step: WizardStep,
    /// One-based position for progress display.
    pub position: usize,
    pub total: usize,
    pub question: &'static str,
    pub optional: bool,
    pub terminal: bool,
    /// Pre-populated from the current answers.
    pub input: StepInput,
}

/// Outcome of moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the given step.
    Moved(WizardStep),
    /// The terminal step was answered and generation started.
    Generating,
}

type GenerationTask = JoinHandle<Result<LearningPath, GenerationError>>;

/// Drives the questionnaire.
pub struct Wizard {
    store: Arc<AppStore>,
    generator: Arc<dyn PathGenerator>,
    timeout: Duration,
    /// The current or most recent generation run. Locked across busy flag
    /// and spawn, so nobody can observe a started run without its handle.
    task: Mutex<Option<GenerationTask>>,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl Wizard {
    pub fn new(
        store: Arc<AppStore>,
        generator: Arc<dyn PathGenerator>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            store,
            generator,
            timeout: config.timeout,
            task: Mutex::new(None),
            cancel: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<AppStore> {
        &self.store
    }

    /// The current step. An out-of-range stored index reads as the first step.
    pub async fn current_step(&self) -> WizardStep {
        WizardStep::from_index(self.store.step().await).unwrap_or_default()
    }

    pub async fn prompt(&self) -> StepPrompt {
        let step = self.current_step().await;
        let answers = self.store.answers().await;
        StepPrompt {
            step,
            position: step.index() + 1,
            total: WizardStep::COUNT,
            question: step.question(),
            optional: step.is_optional(),
            terminal: step.is_terminal(),
            input: step.prefill(&answers),
        }
    }

    /// Answer the current step and move forward.
    ///
    /// Invalid input writes nothing and does not move.
    pub async fn advance(&self, input: StepInput) -> Result<Advance, WizardError> {
        self.ensure_idle().await?;
        let step = self.current_step().await;
        let input = step.validate(input)?;
        self.update_answers(input.into_patch()).await?;
        self.move_forward(step).await
    }

    /// Move forward from an optional step without writing an answer.
    pub async fn skip(&self) -> Result<Advance, WizardError> {
        self.ensure_idle().await?;
        let step = self.current_step().await;
        if !step.is_optional() {
            return Err(WizardError::NotSkippable {
                step: step.to_string(),
            });
        }
        self.move_forward(step).await
    }

    /// Move back one step. Writes nothing; stays put on the first step.
    pub async fn back(&self) -> Result<WizardStep, WizardError> {
        self.ensure_idle().await?;
        let step = self.current_step().await;
        match step.prev() {
            Some(prev) => {
                debug_assert!(step.can_transition_to(prev));
                self.store.set_step(prev.index()).await;
                Ok(prev)
            }
            None => Ok(step),
        }
    }

    /// Merge a partial answer set outside the step flow. Refused while a path
    /// is being generated.
    pub async fn update_answers(&self, patch: AnswersPatch) -> Result<(), WizardError> {
        if self.store.update_answers_if_idle(patch).await {
            Ok(())
        } else {
            Err(WizardError::Busy)
        }
    }

    async fn move_forward(&self, step: WizardStep) -> Result<Advance, WizardError> {
        match step.next() {
            Some(next) => {
                debug_assert!(step.can_transition_to(next));
                self.store.set_step(next.index()).await;
                Ok(Advance::Moved(next))
            }
            None => {
                self.start_generation().await?;
                Ok(Advance::Generating)
            }
        }
    }

    /// Start generating a path from the current answers.
    pub async fn start_generation(&self) -> Result<(), WizardError> {
        let mut task = self.task.lock().await;
        let mut cancel = self.cancel.lock().await;
        let Some(answers) = self.store.try_begin_busy().await else {
            return Err(WizardError::Busy);
        };

        let (cancel_tx, cancel_rx) = oneshot::channel();
        *cancel = Some(cancel_tx);
        *task = Some(tokio::spawn(run_generation(
            Arc::clone(&self.store),
            Arc::clone(&self.generator),
            self.timeout,
            answers,
            cancel_rx,
        )));
        Ok(())
    }

    /// Stop a running generation and wait for it to wind down. The result is
    /// discarded and the store is left as it was before generation started.
    pub async fn cancel_generation(&self) -> Result<(), WizardError> {
        if !self.signal_cancel().await {
            return Err(WizardError::NotGenerating);
        }
        let _ = self.wait_generation().await;
        Ok(())
    }

    /// Wait for the latest generation run to finish and take its result.
    /// `None` if there is no run whose result has not been taken yet.
    pub async fn wait_generation(&self) -> Option<Result<LearningPath, GenerationError>> {
        let mut task = self.task.lock().await;
        match task.take() {
            Some(handle) => Some(join_generation(&self.store, handle).await),
            None => None,
        }
    }

    /// Stop any running generation, then clear the store back to its initial
    /// state.
    pub async fn reset(&self) {
        // First signal without the task lock, in case a waiter holds it.
        self.signal_cancel().await;

        let mut task = self.task.lock().await;
        self.signal_cancel().await;
        if let Some(handle) = task.take() {
            let _ = join_generation(&self.store, handle).await;
        }
        self.store.reset_onboarding().await;
    }

    /// True if a live run received the signal.
    async fn signal_cancel(&self) -> bool {
        match self.cancel.lock().await.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    async fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.store.is_busy().await {
            return Err(WizardError::Busy);
        }
        Ok(())
    }
}

async fn join_generation(
    store: &AppStore,
    handle: GenerationTask,
) -> Result<LearningPath, GenerationError> {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            // The run died before it could clear the flag itself.
            store.set_busy(false).await;
            Err(GenerationError::Failed {
                generator: "wizard".to_string(),
                reason: e.to_string(),
            })
        }
    }
}

async fn run_generation(
    store: Arc<AppStore>,
    generator: Arc<dyn PathGenerator>,
    timeout: Duration,
    answers: OnboardingAnswers,
    cancel_rx: oneshot::Receiver<()>,
) -> Result<LearningPath, GenerationError> {
    let request = PathRequest::from_answers(&answers);
    let generator_name = generator.name().to_string();

    info!(
        generator = %generator_name,
        target_role = %request.target_role,
        "Generating learning path"
    );

    // A dropped sender is not a cancellation.
    let cancelled = async move {
        if cancel_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    // Own task, so a panicking generator surfaces as a JoinError here.
    let mut work = tokio::spawn(async move { generator.generate(&request).await });

    let outcome = tokio::select! {
        joined = tokio::time::timeout(timeout, &mut work) => match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(GenerationError::Failed {
                generator: generator_name.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(GenerationError::Timeout {
                generator: generator_name.clone(),
                timeout,
            }),
        },
        _ = cancelled => Err(GenerationError::Cancelled),
    };
    work.abort();

    let outcome = match outcome {
        Ok(path) => {
            let profile = UserProfile::from_answers(&answers);
            store
                .finalize_onboarding(profile, path.clone())
                .await
                .map(|()| path)
                .map_err(GenerationError::from)
        }
        Err(e) => Err(e),
    };

    match &outcome {
        Ok(path) => info!(path_id = %path.id, "Learning path ready"),
        Err(GenerationError::Cancelled) => warn!("Learning path generation cancelled"),
        Err(e) => error!("Learning path generation failed: {}", e),
    }

    store.set_busy(false).await;
    outcome
}
