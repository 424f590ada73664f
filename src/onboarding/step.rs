//! Questionnaire steps — the linear sequence of questions and the input
//! each one captures.

use serde::{Deserialize, Serialize};

use crate::error::WizardError;
use crate::learning::model::DEFAULT_DAILY_HOURS;
use crate::learning::{AnswersPatch, Attachment, OnboardingAnswers};

/// The questionnaire steps.
///
/// Progresses linearly: Name → Degree → Experience → TargetRole → Skills →
/// DailyTime → Schedule → Constraints → Resume. Advancing past Resume starts
/// learning path generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Name,
    Degree,
    Experience,
    TargetRole,
    Skills,
    DailyTime,
    Schedule,
    Constraints,
    Resume,
}

impl WizardStep {
    /// All steps in order.
    pub const ALL: [WizardStep; 9] = [
        Self::Name,
        Self::Degree,
        Self::Experience,
        Self::TargetRole,
        Self::Skills,
        Self::DailyTime,
        Self::Schedule,
        Self::Constraints,
        Self::Resume,
    ];

    /// Number of steps.
    pub const COUNT: usize = Self::ALL.len();

    /// Zero-based position of this step.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Get the next step, if any.
    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Get the previous step, if any.
    pub fn prev(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    /// Only single steps forward or backward are valid moves.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        self.next() == Some(target) || self.prev() == Some(target)
    }

    /// Advancing from the terminal step triggers generation.
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Optional steps can be skipped without answering.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Skills | Self::Constraints | Self::Resume)
    }

    /// The prompt shown for this step.
    pub fn question(&self) -> &'static str {
        match self {
            Self::Name => "What's your name?",
            Self::Degree => "What's your educational background?",
            Self::Experience => "Which year of study are you in?",
            Self::TargetRole => "What role are you aiming for?",
            Self::Skills => "Which skills do you already have?",
            Self::DailyTime => "How much time can you study each day?",
            Self::Schedule => "When do you prefer to study?",
            Self::Constraints => "Anything that limits your study time?",
            Self::Resume => "Upload your resume (optional)",
        }
    }

    /// Input pre-populated from the current answers, so a revisited step
    /// shows what was entered before.
    pub fn prefill(&self, answers: &OnboardingAnswers) -> StepInput {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let list = |v: &Option<Vec<String>>| v.clone().unwrap_or_default();
        match self {
            Self::Name => StepInput::Name(text(&answers.name)),
            Self::Degree => StepInput::Degree(text(&answers.degree)),
            Self::Experience => StepInput::Experience(text(&answers.current_year)),
            Self::TargetRole => StepInput::TargetRole(text(&answers.target_role)),
            Self::Skills => StepInput::Skills(list(&answers.current_skills)),
            Self::DailyTime => {
                StepInput::DailyTime(answers.daily_free_hours.unwrap_or(DEFAULT_DAILY_HOURS))
            }
            Self::Schedule => StepInput::Schedule(list(&answers.study_hours)),
            Self::Constraints => StepInput::Constraints(list(&answers.constraints)),
            Self::Resume => StepInput::Resume(answers.resume.clone()),
        }
    }

    /// Check `input` belongs to this step and passes its predicate.
    ///
    /// Returns the normalized input: strings trimmed, blank list entries dropped.
    pub fn validate(&self, input: StepInput) -> Result<StepInput, WizardError> {
        if input.step() != *self {
            return Err(WizardError::InputMismatch {
                expected: self.to_string(),
                got: input.step().to_string(),
            });
        }

        let input = input.normalized();
        let problem = match &input {
            StepInput::Name(s)
            | StepInput::Degree(s)
            | StepInput::Experience(s)
            | StepInput::TargetRole(s)
                if s.is_empty() =>
            {
                Some("an answer is required")
            }
            StepInput::DailyTime(hours) if !hours.is_finite() || *hours <= 0.0 => {
                Some("daily time must be a positive number of hours")
            }
            StepInput::Schedule(slots) if slots.is_empty() => Some("pick at least one time slot"),
            _ => None,
        };

        match problem {
            Some(reason) => Err(WizardError::Invalid {
                step: self.to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(input),
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Degree => "degree",
            Self::Experience => "experience",
            Self::TargetRole => "target_role",
            Self::Skills => "skills",
            Self::DailyTime => "daily_time",
            Self::Schedule => "schedule",
            Self::Constraints => "constraints",
            Self::Resume => "resume",
        };
        write!(f, "{s}")
    }
}

/// The value captured by a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "value", rename_all = "snake_case")]
pub enum StepInput {
    Name(String),
    Degree(String),
    /// Current year of study.
    Experience(String),
    TargetRole(String),
    Skills(Vec<String>),
    /// Hours per day.
    DailyTime(f32),
    /// Preferred time-slot labels.
    Schedule(Vec<String>),
    Constraints(Vec<String>),
    Resume(Option<Attachment>),
}

impl StepInput {
    /// The step this input answers.
    pub fn step(&self) -> WizardStep {
        match self {
            Self::Name(_) => WizardStep::Name,
            Self::Degree(_) => WizardStep::Degree,
            Self::Experience(_) => WizardStep::Experience,
            Self::TargetRole(_) => WizardStep::TargetRole,
            Self::Skills(_) => WizardStep::Skills,
            Self::DailyTime(_) => WizardStep::DailyTime,
            Self::Schedule(_) => WizardStep::Schedule,
            Self::Constraints(_) => WizardStep::Constraints,
            Self::Resume(_) => WizardStep::Resume,
        }
    }

    fn normalized(self) -> Self {
        let trim = |s: String| s.trim().to_string();
        let clean = |v: Vec<String>| {
            v.into_iter()
                .map(trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        };
        match self {
            Self::Name(s) => Self::Name(trim(s)),
            Self::Degree(s) => Self::Degree(trim(s)),
            Self::Experience(s) => Self::Experience(trim(s)),
            Self::TargetRole(s) => Self::TargetRole(trim(s)),
            Self::Skills(v) => Self::Skills(clean(v)),
            Self::Schedule(v) => Self::Schedule(clean(v)),
            Self::Constraints(v) => Self::Constraints(clean(v)),
            other => other,
        }
    }

    /// The answers patch this input writes.
    pub fn into_patch(self) -> AnswersPatch {
        let patch = AnswersPatch::default();
        match self {
            Self::Name(s) => patch.name(s),
            Self::Degree(s) => patch.degree(s),
            Self::Experience(s) => patch.current_year(s),
            Self::TargetRole(s) => patch.target_role(s),
            Self::Skills(v) => patch.current_skills(v),
            Self::DailyTime(h) => patch.daily_free_hours(h),
            Self::Schedule(v) => patch.study_hours(v),
            Self::Constraints(v) => patch.constraints(v),
            Self::Resume(a) => patch.resume(a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_all_steps() {
        let mut current = WizardStep::Name;
        let mut visited = vec![current];
        while let Some(next) = current.next() {
            visited.push(next);
            current = next;
        }
        assert_eq!(visited, WizardStep::ALL.to_vec());
        assert!(current.is_terminal());
    }

    #[test]
    fn prev_stops_at_first() {
        assert_eq!(WizardStep::Name.prev(), None);
        assert_eq!(WizardStep::Degree.prev(), Some(WizardStep::Name));
        assert_eq!(WizardStep::Resume.prev(), Some(WizardStep::Constraints));
    }

    #[test]
    fn transitions_move_by_exactly_one() {
        use WizardStep::*;
        assert!(Name.can_transition_to(Degree));
        assert!(Degree.can_transition_to(Name));
        assert!(!Name.can_transition_to(Experience));
        assert!(!Skills.can_transition_to(Skills));
        assert!(!Resume.can_transition_to(Name));
    }

    #[test]
    fn index_roundtrips() {
        for (i, step) in WizardStep::ALL.iter().enumerate() {
            assert_eq!(step.index(), i);
            assert_eq!(WizardStep::from_index(i), Some(*step));
        }
        assert_eq!(WizardStep::from_index(WizardStep::COUNT), None);
    }

    #[test]
    fn display_matches_serde() {
        for step in WizardStep::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json, "Display and serde should match for {step:?}");
        }
    }

    #[test]
    fn required_text_steps_reject_blank() {
        let err = WizardStep::Name
            .validate(StepInput::Name("   ".to_string()))
            .unwrap_err();
        assert!(matches!(err, WizardError::Invalid { .. }));
    }

    #[test]
    fn validate_trims() {
        let input = WizardStep::Name
            .validate(StepInput::Name("  Ada ".to_string()))
            .unwrap();
        assert_eq!(input, StepInput::Name("Ada".to_string()));
    }

    #[test]
    fn validate_rejects_input_for_other_step() {
        let err = WizardStep::Degree
            .validate(StepInput::Name("Ada".to_string()))
            .unwrap_err();
        assert!(matches!(err, WizardError::InputMismatch { .. }));
    }

    #[test]
    fn daily_time_must_be_positive() {
        assert!(WizardStep::DailyTime.validate(StepInput::DailyTime(0.0)).is_err());
        assert!(WizardStep::DailyTime.validate(StepInput::DailyTime(f32::NAN)).is_err());
        assert!(WizardStep::DailyTime.validate(StepInput::DailyTime(0.5)).is_ok());
    }

    #[test]
    fn schedule_needs_a_slot_but_constraints_may_be_empty() {
        assert!(
            WizardStep::Schedule
                .validate(StepInput::Schedule(vec![" ".to_string()]))
                .is_err()
        );
        assert!(
            WizardStep::Constraints
                .validate(StepInput::Constraints(vec![]))
                .is_ok()
        );
    }

    #[test]
    fn prefill_reads_current_answers() {
        let answers = OnboardingAnswers {
            name: Some("Ada".to_string()),
            study_hours: Some(vec!["evening".to_string()]),
            ..Default::default()
        };
        assert_eq!(
            WizardStep::Name.prefill(&answers),
            StepInput::Name("Ada".to_string())
        );
        assert_eq!(
            WizardStep::Schedule.prefill(&answers),
            StepInput::Schedule(vec!["evening".to_string()])
        );
        assert_eq!(
            WizardStep::DailyTime.prefill(&answers),
            StepInput::DailyTime(DEFAULT_DAILY_HOURS)
        );
        assert_eq!(WizardStep::Degree.prefill(&answers), StepInput::Degree(String::new()));
    }

    #[test]
    fn input_wire_format() {
        let input: StepInput =
            serde_json::from_str(r#"{"step": "target_role", "value": "Backend Developer"}"#)
                .unwrap();
        assert_eq!(input, StepInput::TargetRole("Backend Developer".to_string()));

        let input: StepInput = serde_json::from_str(r#"{"step": "resume", "value": null}"#).unwrap();
        assert_eq!(input, StepInput::Resume(None));
    }

    #[test]
    fn into_patch_targets_matching_field() {
        let patch = StepInput::Experience("2nd year".to_string()).into_patch();
        assert_eq!(patch.current_year.as_deref(), Some("2nd year"));
        assert!(patch.name.is_none());
    }
}
