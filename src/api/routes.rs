//! REST endpoints for the questionnaire, store and dashboard.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{debug, info};

use super::ws::ws_handler;
use crate::error::WizardError;
use crate::learning::{AnswersPatch, DashboardSummary};
use crate::navigation::{View, resolve};
use crate::onboarding::{Advance, StepInput, Wizard, summarize};
use crate::store::AppStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<AppStore>,
    pub wizard: Arc<Wizard>,
    /// How many tasks the dashboard lists for today.
    pub today_task_limit: usize,
}

impl ApiState {
    pub fn new(wizard: Arc<Wizard>, today_task_limit: usize) -> Self {
        Self {
            store: Arc::clone(wizard.store()),
            wizard,
            today_task_limit,
        }
    }
}

/// Build the Axum router with REST and WebSocket routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/api/state", get(get_state))
        .route("/api/view", get(get_view))
        .route("/api/wizard", get(get_wizard))
        .route("/api/wizard/advance", post(advance))
        .route("/api/wizard/skip", post(skip))
        .route("/api/wizard/back", post(back))
        .route("/api/wizard/cancel", post(cancel_generation))
        .route("/api/answers", get(get_answers).patch(patch_answers))
        .route("/api/summary", get(get_summary))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/tasks/{id}/complete", post(complete_task))
        .route("/api/onboarding/reset", post(reset_onboarding))
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Error responses: `{"error": "..."}` with a matching status code.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<WizardError> for ApiError {
    fn from(e: WizardError) -> Self {
        let status = match e {
            WizardError::Busy => StatusCode::CONFLICT,
            WizardError::NotGenerating => StatusCode::NOT_FOUND,
            WizardError::InputMismatch { .. }
            | WizardError::Invalid { .. }
            | WizardError::NotSkippable { .. } => StatusCode::BAD_REQUEST,
        };
        Self(status, e.to_string())
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "skillroute"
    }))
}

// ── Store ───────────────────────────────────────────────────────────────

async fn get_state(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.store.snapshot().await)
}

#[derive(Debug, Deserialize)]
struct ViewQuery {
    #[serde(default)]
    path: Option<String>,
}

/// GET /api/view?path=/dashboard
///
/// Resolves a client route, applying the welcome fallback and profile gate.
async fn get_view(
    State(state): State<ApiState>,
    Query(query): Query<ViewQuery>,
) -> impl IntoResponse {
    let has_profile = state.store.profile().await.is_some();
    let route = query.path.as_deref().unwrap_or(View::Welcome.route());
    Json(resolve(route, has_profile))
}

async fn get_answers(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.store.answers().await)
}

/// PATCH /api/answers
///
/// 409 while a learning path is being generated.
async fn patch_answers(
    State(state): State<ApiState>,
    Json(patch): Json<AnswersPatch>,
) -> Result<Response, ApiError> {
    state.wizard.update_answers(patch).await?;
    Ok(Json(state.store.answers().await).into_response())
}

async fn get_summary(State(state): State<ApiState>) -> impl IntoResponse {
    Json(summarize(&state.store.answers().await))
}

/// POST /api/onboarding/reset
///
/// Stops any running generation first, so its result cannot land afterwards.
async fn reset_onboarding(State(state): State<ApiState>) -> impl IntoResponse {
    state.wizard.reset().await;
    Json(state.store.snapshot().await)
}

// ── Wizard ──────────────────────────────────────────────────────────────

async fn get_wizard(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.wizard.prompt().await)
}

async fn advance(
    State(state): State<ApiState>,
    Json(input): Json<StepInput>,
) -> Result<Response, ApiError> {
    debug!(step = %input.step(), "Advance requested");
    let advance = state.wizard.advance(input).await?;
    Ok(advance_response(&state, advance).await)
}

async fn skip(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let advance = state.wizard.skip().await?;
    Ok(advance_response(&state, advance).await)
}

async fn back(State(state): State<ApiState>) -> Result<Response, ApiError> {
    state.wizard.back().await?;
    Ok(Json(state.wizard.prompt().await).into_response())
}

async fn advance_response(state: &ApiState, advance: Advance) -> Response {
    match advance {
        Advance::Moved(_) => Json(state.wizard.prompt().await).into_response(),
        Advance::Generating => {
            info!("Learning path generation started");
            (
                StatusCode::ACCEPTED,
                Json(serde_json::json!({ "status": "generating" })),
            )
                .into_response()
        }
    }
}

/// POST /api/wizard/cancel
///
/// Leaving the generating view cancels the run and discards its result.
async fn cancel_generation(State(state): State<ApiState>) -> Result<Response, ApiError> {
    state.wizard.cancel_generation().await?;
    Ok(Json(serde_json::json!({ "status": "cancelled" })).into_response())
}

// ── Dashboard ───────────────────────────────────────────────────────────

/// GET /api/dashboard
///
/// 404 with a redirect to the welcome route when no profile exists yet.
async fn get_dashboard(State(state): State<ApiState>) -> Response {
    let snapshot = state.store.snapshot().await;
    match snapshot.profile {
        Some(profile) => Json(DashboardSummary::build(
            &profile,
            snapshot.path.as_ref(),
            state.today_task_limit,
        ))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "No profile exists yet",
                "redirect": View::Welcome.route(),
            })),
        )
            .into_response(),
    }
}

/// POST /api/tasks/{id}/complete
///
/// Completing an unknown or already-completed task is not an error; the
/// response just reports that nothing changed.
async fn complete_task(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.complete_task(&id).await {
        Some(completion) => Json(serde_json::json!({
            "completed": true,
            "completion": completion,
        })),
        None => Json(serde_json::json!({ "completed": false })),
    }
}
