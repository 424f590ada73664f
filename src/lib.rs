//! SkillRoute — onboarding questionnaire, learning path generation and
//! progress dashboard over a single persisted store.

pub mod api;
pub mod config;
pub mod error;
pub mod generator;
pub mod learning;
pub mod navigation;
pub mod onboarding;
pub mod store;
