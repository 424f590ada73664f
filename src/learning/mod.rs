//! Learning domain — profiles, questionnaire answers, learning paths and
//! the progress figures the dashboard shows.

pub mod model;
pub mod progress;

pub use model::{
    AnswersPatch, Attachment, LearningPath, LearningTask, Milestone, OnboardingAnswers, TaskKind,
    UserProfile,
};
pub use progress::{DashboardSummary, MilestoneProgress, completion_percentage, todays_tasks};
