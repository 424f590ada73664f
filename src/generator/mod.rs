//! Learning path generation.
//!
//! A [`PathGenerator`] turns the questionnaire answers into a
//! [`LearningPath`]. The shipped implementation is [`MockPathGenerator`], a
//! fixed-latency stub; a backend-backed generator slots in behind the same
//! trait.

pub mod mock;

pub use mock::MockPathGenerator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::learning::{LearningPath, OnboardingAnswers};

/// Typed generation request, mirroring the questionnaire answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    pub name: String,
    pub degree: String,
    pub current_year: String,
    pub target_role: String,
    pub current_skills: Vec<String>,
    pub daily_free_hours: Option<f32>,
    pub study_hours: Vec<String>,
    pub constraints: Vec<String>,
    pub resume_uploaded: bool,
}

impl PathRequest {
    pub fn from_answers(answers: &OnboardingAnswers) -> Self {
        Self {
            name: answers.name.clone().unwrap_or_default(),
            degree: answers.degree.clone().unwrap_or_default(),
            current_year: answers.current_year.clone().unwrap_or_default(),
            target_role: answers.target_role.clone().unwrap_or_default(),
            current_skills: answers.current_skills.clone().unwrap_or_default(),
            daily_free_hours: answers.daily_free_hours,
            study_hours: answers.study_hours.clone().unwrap_or_default(),
            constraints: answers.constraints.clone().unwrap_or_default(),
            resume_uploaded: answers.resume.is_some(),
        }
    }
}

/// Produces a learning path for a set of answers.
#[async_trait]
pub trait PathGenerator: Send + Sync {
    /// Generator name, used in logs and errors.
    fn name(&self) -> &str;

    async fn generate(&self, request: &PathRequest) -> Result<LearningPath, GenerationError>;
}
