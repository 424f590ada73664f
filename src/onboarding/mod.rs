//! Onboarding — the step-by-step questionnaire that collects preferences
//! and ends in learning path generation.
//!
//! Each step writes its answer into the store before the position moves
//! forward by one. Moving back never writes. Answers are frozen while a path
//! is being generated. Answering the last step starts
//! generation; once it succeeds the profile and path are committed and the
//! answers are discarded.

pub mod step;
pub mod summary;
pub mod wizard;

pub use step::{StepInput, WizardStep};
pub use summary::{SummaryItem, summarize};
pub use wizard::{Advance, StepPrompt, Wizard};
