//! Named views and route resolution.

use serde::{Deserialize, Serialize};

/// The client-side views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Welcome,
    Carousel,
    Questionnaire,
    Summary,
    Generating,
    Dashboard,
    FullPath,
    CreatePlan,
    AdjustSchedule,
}

impl View {
    pub const ALL: [View; 9] = [
        Self::Welcome,
        Self::Carousel,
        Self::Questionnaire,
        Self::Summary,
        Self::Generating,
        Self::Dashboard,
        Self::FullPath,
        Self::CreatePlan,
        Self::AdjustSchedule,
    ];

    pub fn route(&self) -> &'static str {
        match self {
            Self::Welcome => "/",
            Self::Carousel => "/onboarding",
            Self::Questionnaire => "/questionnaire",
            Self::Summary => "/summary",
            Self::Generating => "/generating",
            Self::Dashboard => "/dashboard",
            Self::FullPath => "/view-full-path",
            Self::CreatePlan => "/create-plan",
            Self::AdjustSchedule => "/adjust-schedule",
        }
    }

    /// Exact route match. A single trailing slash is ignored.
    pub fn from_route(route: &str) -> Option<Self> {
        let route = match route.strip_suffix('/') {
            Some("") | None => route,
            Some(trimmed) => trimmed,
        };
        Self::ALL.into_iter().find(|v| v.route() == route)
    }

    /// Views that need a finalized profile.
    pub fn requires_profile(&self) -> bool {
        matches!(self, Self::Dashboard)
    }
}

/// Where a route ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub view: View,
    pub route: &'static str,
    /// True when the requested route was not the one served.
    pub redirected: bool,
}

/// Resolve a route. Unknown routes and gated views without a profile land
/// on the welcome view.
pub fn resolve(route: &str, has_profile: bool) -> Resolution {
    let (view, redirected) = match View::from_route(route) {
        Some(view) if view.requires_profile() && !has_profile => (View::Welcome, true),
        Some(view) => (view, false),
        None => (View::Welcome, true),
    };
    Resolution {
        view,
        route: view.route(),
        redirected,
    }
}
