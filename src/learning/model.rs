//! Profile, onboarding answers and learning path data models.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// The kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Reading,
    Video,
    Practice,
    Project,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Reading => "reading",
            Self::Video => "video",
            Self::Practice => "practice",
            Self::Project => "project",
        };
        write!(f, "{s}")
    }
}

/// A single actionable learning unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningTask {
    /// Unique within its path.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Estimated duration in minutes.
    pub estimated_minutes: u32,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    /// Flips to true on completion and never reverts.
    pub completed: bool,
    pub xp_reward: u32,
}

impl LearningTask {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: TaskKind,
        estimated_minutes: u32,
        xp_reward: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            estimated_minutes,
            kind,
            completed: false,
            xp_reward,
        }
    }

    /// Builder: set description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }
}

/// A grouped phase of a learning path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub description: String,
    pub target_date: DateTime<Utc>,
    /// Stored flag. Nothing writes it; see [`Milestone::is_complete`].
    pub completed: bool,
    pub tasks: Vec<LearningTask>,
    pub xp_reward: u32,
}

impl Milestone {
    /// Completion derived from the child tasks.
    ///
    /// A milestone without tasks is only complete if its stored flag says so.
    pub fn is_complete(&self) -> bool {
        self.completed || (!self.tasks.is_empty() && self.tasks.iter().all(|t| t.completed))
    }
}

/// A generated curriculum: milestones containing tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Total duration in weeks.
    pub total_weeks: u32,
    pub milestones: Vec<Milestone>,
    pub created_at: DateTime<Utc>,
}

impl LearningPath {
    /// All tasks in milestone order.
    pub fn tasks(&self) -> impl Iterator<Item = &LearningTask> {
        self.milestones.iter().flat_map(|m| m.tasks.iter())
    }

    pub fn find_task_mut(&mut self, task_id: &str) -> Option<&mut LearningTask> {
        self.milestones
            .iter_mut()
            .flat_map(|m| m.tasks.iter_mut())
            .find(|t| t.id == task_id)
    }

    /// Check that task identities are unique across the whole path.
    pub fn validate(&self) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for task in self.tasks() {
            if !seen.insert(task.id.as_str()) {
                return Err(StoreError::DuplicateTaskId {
                    path_id: self.id.clone(),
                    task_id: task.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A file attached during onboarding (the resume).
///
/// Never persisted: [`OnboardingAnswers`] skips it when serializing, and the
/// bytes never leave the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing)]
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }
}

/// In-progress questionnaire answers, filled field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingAnswers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_skills: Option<Vec<String>>,
    /// Daily free time in hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_free_hours: Option<f32>,
    /// Preferred study time-slot labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_hours: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,
    #[serde(skip)]
    pub resume: Option<Attachment>,
}

impl OnboardingAnswers {
    /// Shallow-merge a patch. Absent fields are left alone; lists are replaced.
    pub fn merge(&mut self, patch: AnswersPatch) {
        let AnswersPatch {
            name,
            degree,
            current_year,
            target_role,
            current_skills,
            daily_free_hours,
            study_hours,
            constraints,
            resume,
        } = patch;

        if name.is_some() {
            self.name = name;
        }
        if degree.is_some() {
            self.degree = degree;
        }
        if current_year.is_some() {
            self.current_year = current_year;
        }
        if target_role.is_some() {
            self.target_role = target_role;
        }
        if current_skills.is_some() {
            self.current_skills = current_skills;
        }
        if daily_free_hours.is_some() {
            self.daily_free_hours = daily_free_hours;
        }
        if study_hours.is_some() {
            self.study_hours = study_hours;
        }
        if constraints.is_some() {
            self.constraints = constraints;
        }
        if let Some(resume) = resume {
            self.resume = resume;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A partial update to [`OnboardingAnswers`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnswersPatch {
    pub name: Option<String>,
    pub degree: Option<String>,
    pub current_year: Option<String>,
    pub target_role: Option<String>,
    pub current_skills: Option<Vec<String>>,
    pub daily_free_hours: Option<f32>,
    pub study_hours: Option<Vec<String>>,
    pub constraints: Option<Vec<String>>,
    /// `Some(None)` clears the attachment, `None` leaves it alone.
    #[serde(skip)]
    pub resume: Option<Option<Attachment>>,
}

impl AnswersPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn degree(mut self, degree: impl Into<String>) -> Self {
        self.degree = Some(degree.into());
        self
    }

    pub fn current_year(mut self, year: impl Into<String>) -> Self {
        self.current_year = Some(year.into());
        self
    }

    pub fn target_role(mut self, role: impl Into<String>) -> Self {
        self.target_role = Some(role.into());
        self
    }

    pub fn current_skills(mut self, skills: Vec<String>) -> Self {
        self.current_skills = Some(skills);
        self
    }

    pub fn daily_free_hours(mut self, hours: f32) -> Self {
        self.daily_free_hours = Some(hours);
        self
    }

    pub fn study_hours(mut self, slots: Vec<String>) -> Self {
        self.study_hours = Some(slots);
        self
    }

    pub fn constraints(mut self, constraints: Vec<String>) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn resume(mut self, resume: Option<Attachment>) -> Self {
        self.resume = Some(resume);
        self
    }
}

/// The finalized user record created at the end of onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    /// Educational background.
    pub degree: String,
    pub current_year: String,
    pub target_role: String,
    pub current_skills: Vec<String>,
    /// Daily time budget in hours.
    pub daily_free_hours: f32,
    pub study_hours: Vec<String>,
    pub constraints: Vec<String>,
    pub resume_uploaded: bool,
    pub xp: u32,
    pub streak: u32,
    pub created_at: DateTime<Utc>,
}

/// Daily time budget used when the questionnaire never asked.
pub const DEFAULT_DAILY_HOURS: f32 = 1.0;

impl UserProfile {
    /// Build a fresh profile from questionnaire answers.
    pub fn from_answers(answers: &OnboardingAnswers) -> Self {
        let name = answers
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("User");

        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            degree: answers.degree.clone().unwrap_or_default(),
            current_year: answers.current_year.clone().unwrap_or_default(),
            target_role: answers.target_role.clone().unwrap_or_default(),
            current_skills: answers.current_skills.clone().unwrap_or_default(),
            daily_free_hours: answers.daily_free_hours.unwrap_or(DEFAULT_DAILY_HOURS),
            study_hours: answers.study_hours.clone().unwrap_or_default(),
            constraints: answers.constraints.clone().unwrap_or_default(),
            resume_uploaded: answers.resume.is_some(),
            xp: 0,
            streak: 0,
            created_at: Utc::now(),
        }
    }
}
