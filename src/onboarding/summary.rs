//! Review screen shown before generation — one line per answer.

use serde::Serialize;

use crate::learning::OnboardingAnswers;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryItem {
    pub label: &'static str,
    pub value: String,
}

impl SummaryItem {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

fn text_or(value: &Option<String>, fallback: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn count_or(values: &Option<Vec<String>>, one: &str, many: &str, fallback: &str) -> String {
    match values.as_ref().map(Vec::len) {
        Some(1) => format!("1 {one}"),
        Some(n) if n > 1 => format!("{n} {many}"),
        _ => fallback.to_string(),
    }
}

/// Summarize the answers collected so far.
pub fn summarize(answers: &OnboardingAnswers) -> Vec<SummaryItem> {
    let daily = match answers.daily_free_hours {
        Some(h) if h > 0.0 => {
            let unit = if h == 1.0 { "hour" } else { "hours" };
            format!("{h} {unit}")
        }
        _ => "Not specified".to_string(),
    };

    vec![
        SummaryItem::new("Name", text_or(&answers.name, "Not provided")),
        SummaryItem::new("Background", text_or(&answers.degree, "Not provided")),
        SummaryItem::new("Year of Study", text_or(&answers.current_year, "Not provided")),
        SummaryItem::new("Target Role", text_or(&answers.target_role, "Not provided")),
        SummaryItem::new(
            "Current Skills",
            count_or(
                &answers.current_skills,
                "skill selected",
                "skills selected",
                "No skills selected",
            ),
        ),
        SummaryItem::new("Daily Time", daily),
        SummaryItem::new(
            "Preferred Times",
            count_or(
                &answers.study_hours,
                "time slot",
                "time slots",
                "No preferences set",
            ),
        ),
        SummaryItem::new(
            "Constraints",
            count_or(
                &answers.constraints,
                "constraint noted",
                "constraints noted",
                "No constraints",
            ),
        ),
        SummaryItem::new(
            "Resume",
            if answers.resume.is_some() { "Uploaded" } else { "Not uploaded" },
        ),
    ]
}
