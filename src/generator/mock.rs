//! Fixed-latency stub generator returning a canned learning path.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tracing::info;
use uuid::Uuid;

use super::{PathGenerator, PathRequest};
use crate::error::GenerationError;
use crate::learning::{LearningPath, LearningTask, Milestone, TaskKind};

const FALLBACK_NAME: &str = "User";
const FALLBACK_ROLE: &str = "Software Developer";

/// Waits `latency`, then returns the canned path with the request's name and
/// target role interpolated into the title and description.
#[derive(Debug, Clone)]
pub struct MockPathGenerator {
    latency: Duration,
}

impl MockPathGenerator {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for MockPathGenerator {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

#[async_trait]
impl PathGenerator for MockPathGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &PathRequest) -> Result<LearningPath, GenerationError> {
        tokio::time::sleep(self.latency).await;

        let name = non_blank(&request.name).unwrap_or(FALLBACK_NAME);
        let role = non_blank(&request.target_role).unwrap_or(FALLBACK_ROLE);

        let path = canned_path(
            format!("{role} Learning Path"),
            format!("Personalized learning path for {name} to become a {role}."),
        );
        info!(path_id = %path.id, target_role = role, "Generated canned learning path");
        Ok(path)
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn canned_tasks() -> Vec<LearningTask> {
    vec![
        LearningTask::new("1", "Learn React Fundamentals", TaskKind::Reading, 120, 100)
            .with_description(
                "Complete the official React tutorial and understand components, props, and state.",
            ),
        LearningTask::new("2", "Build a To-Do App", TaskKind::Project, 180, 200)
            .with_description("Create your first React application with CRUD functionality."),
        LearningTask::new("3", "TypeScript Basics", TaskKind::Video, 90, 150)
            .with_description("Learn TypeScript fundamentals and type annotations."),
        LearningTask::new("4", "State Management with Redux", TaskKind::Practice, 150, 175)
            .with_description("Understand global state management patterns."),
    ]
}

fn canned_path(title: String, description: String) -> LearningPath {
    let now = Utc::now();
    let mut tasks = canned_tasks();
    let later = tasks.split_off(2);

    LearningPath {
        id: Uuid::new_v4().to_string(),
        title,
        description,
        total_weeks: 12,
        milestones: vec![
            Milestone {
                id: "1".to_string(),
                title: "Frontend Foundations".to_string(),
                description: "Master the core concepts of modern frontend development."
                    .to_string(),
                target_date: now + ChronoDuration::days(7),
                completed: false,
                tasks,
                xp_reward: 300,
            },
            Milestone {
                id: "2".to_string(),
                title: "Advanced JavaScript & TypeScript".to_string(),
                description: "Develop expertise in modern JavaScript and TypeScript.".to_string(),
                target_date: now + ChronoDuration::days(14),
                completed: false,
                tasks: later,
                xp_reward: 325,
            },
        ],
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, role: &str) -> PathRequest {
        PathRequest {
            name: name.to_string(),
            target_role: role.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn interpolates_name_and_role() {
        let generator = MockPathGenerator::new(Duration::ZERO);
        let path = generator
            .generate(&request("Ada", "Backend Developer"))
            .await
            .unwrap();
        assert_eq!(path.title, "Backend Developer Learning Path");
        assert!(path.description.contains("Ada"));
        assert!(path.description.contains("Backend Developer"));
    }

    #[tokio::test]
    async fn blank_fields_fall_back() {
        let generator = MockPathGenerator::new(Duration::ZERO);
        let path = generator.generate(&request("  ", "")).await.unwrap();
        assert_eq!(path.title, "Software Developer Learning Path");
        assert!(path.description.contains("User"));
    }

    #[tokio::test]
    async fn canned_path_shape() {
        let generator = MockPathGenerator::new(Duration::ZERO);
        let path = generator.generate(&request("Ada", "Dev")).await.unwrap();
        path.validate().unwrap();
        assert_eq!(path.total_weeks, 12);
        assert_eq!(path.milestones.len(), 2);
        let rewards: Vec<u32> = path.tasks().map(|t| t.xp_reward).collect();
        assert_eq!(rewards, vec![100, 200, 150, 175]);
        assert!(path.milestones[0].target_date < path.milestones[1].target_date);
        assert!(path.tasks().all(|t| !t.completed));
    }

    #[tokio::test]
    async fn each_call_gets_a_fresh_id() {
        let generator = MockPathGenerator::new(Duration::ZERO);
        let a = generator.generate(&request("Ada", "Dev")).await.unwrap();
        let b = generator.generate(&request("Ada", "Dev")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_latency() {
        let generator = MockPathGenerator::new(Duration::from_secs(3));
        let started = tokio::time::Instant::now();
        generator.generate(&request("Ada", "Dev")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
