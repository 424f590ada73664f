//! Error types for SkillRoute.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the durable state record.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Persisted state under {namespace} is malformed: {reason}")]
    Malformed { namespace: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected store mutations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Profile identity must not be empty")]
    EmptyProfileId,

    #[error("Task id {task_id} appears more than once in path {path_id}")]
    DuplicateTaskId { path_id: String, task_id: String },
}

/// Questionnaire navigation errors.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("A learning path is being generated")]
    Busy,

    #[error("Input for step {got} given while on step {expected}")]
    InputMismatch { expected: String, got: String },

    #[error("Invalid answer for step {step}: {reason}")]
    Invalid { step: String, reason: String },

    #[error("Step {step} cannot be skipped")]
    NotSkippable { step: String },

    #[error("No learning path generation in progress")]
    NotGenerating,
}

/// Learning path generation errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generator {generator} failed: {reason}")]
    Failed { generator: String, reason: String },

    #[error("Generator {generator} timed out after {timeout:?}")]
    Timeout { generator: String, timeout: Duration },

    #[error("Generation was cancelled")]
    Cancelled,

    #[error("Generated path rejected: {0}")]
    Rejected(#[from] StoreError),
}
