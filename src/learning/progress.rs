//! Dashboard aggregates derived from a learning path.
//!
//! Everything here is recomputed from the path on every call; nothing is
//! cached, so there is no derived state to keep in sync with the store.

use serde::Serialize;

use super::model::{LearningPath, LearningTask, UserProfile};

/// Number of incomplete tasks shown as "today's tasks".
pub const TODAY_TASK_LIMIT: usize = 3;

/// First `limit` incomplete tasks, flattened in milestone order.
pub fn todays_tasks(path: &LearningPath, limit: usize) -> Vec<&LearningTask> {
    path.tasks().filter(|t| !t.completed).take(limit).collect()
}

pub fn completed_task_count(path: &LearningPath) -> usize {
    path.tasks().filter(|t| t.completed).count()
}

pub fn total_task_count(path: &LearningPath) -> usize {
    path.tasks().count()
}

/// `round(completed / total * 100)`, or 0 for an empty path.
pub fn completion_percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Per-milestone progress line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneProgress {
    pub id: String,
    pub title: String,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub percentage: u32,
    pub completed: bool,
    pub xp_reward: u32,
}

pub fn milestone_progress(path: &LearningPath) -> Vec<MilestoneProgress> {
    path.milestones
        .iter()
        .map(|m| {
            let completed_tasks = m.tasks.iter().filter(|t| t.completed).count();
            let total_tasks = m.tasks.len();
            MilestoneProgress {
                id: m.id.clone(),
                title: m.title.clone(),
                completed_tasks,
                total_tasks,
                percentage: completion_percentage(completed_tasks, total_tasks),
                completed: m.is_complete(),
                xp_reward: m.xp_reward,
            }
        })
        .collect()
}

/// Everything the dashboard view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub name: String,
    pub target_role: String,
    pub xp: u32,
    pub streak: u32,
    pub path_title: String,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub completion_percentage: u32,
    pub todays_tasks: Vec<LearningTask>,
    pub milestones: Vec<MilestoneProgress>,
}

impl DashboardSummary {
    pub fn build(profile: &UserProfile, path: Option<&LearningPath>, limit: usize) -> Self {
        let (completed_tasks, total_tasks, todays, milestones, path_title) = match path {
            Some(path) => (
                completed_task_count(path),
                total_task_count(path),
                todays_tasks(path, limit).into_iter().cloned().collect(),
                milestone_progress(path),
                path.title.clone(),
            ),
            None => (0, 0, Vec::new(), Vec::new(), String::new()),
        };

        Self {
            name: profile.name.clone(),
            target_role: profile.target_role.clone(),
            xp: profile.xp,
            streak: profile.streak,
            path_title,
            completed_tasks,
            total_tasks,
            completion_percentage: completion_percentage(completed_tasks, total_tasks),
            todays_tasks: todays,
            milestones,
        }
    }
}
