use super::error::ApiError;
use super::state::AppState;
use crate::scoring::{Dimension, Score};
use crate::session::{
    Capabilities, DifficultySetting, InterviewContext, LifecycleInput, SessionConfig, SessionStats,
    Transition,
};
use crate::signals::{SignalEvent, SignalSummary};
use crate::transcript::Message;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Interview length in minutes (default from config)
    pub duration_minutes: Option<u32>,

    #[serde(default)]
    pub capabilities: Option<Capabilities>,

    #[serde(default)]
    pub weights: Option<BTreeMap<Dimension, f64>>,

    #[serde(default)]
    pub context: InterviewContext,

    #[serde(default)]
    pub difficulty: DifficultySetting,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub session_id: String,
    pub status: String,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct SignalsResponse {
    pub summary: SignalSummary,
    pub events: Vec<SignalEvent>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews
/// Schedule a new interview session
pub async fn schedule_interview(
    State(state): State<AppState>,
    Json(req): Json<ScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("interview-{}", uuid::Uuid::new_v4()));

    let config = SessionConfig {
        session_id: session_id.clone(),
        duration_minutes: req.duration_minutes.unwrap_or(state.default_duration_minutes),
        capabilities: req.capabilities.unwrap_or_default(),
        weights: req.weights,
        context: req.context,
        difficulty: req.difficulty,
    };

    state.registry.schedule(config).await?;

    info!("Interview scheduled: {}", session_id);

    Ok((
        StatusCode::CREATED,
        Json(ScheduleResponse {
            session_id: session_id.clone(),
            status: "scheduled".to_string(),
            message: format!("Interview {} scheduled", session_id),
        }),
    ))
}

/// POST /interviews/:session_id/invite
pub async fn invite_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<TransitionResponse>, ApiError> {
    apply_lifecycle(&state, session_id, LifecycleInput::Invite).await
}

/// POST /interviews/:session_id/cancel
pub async fn cancel_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<TransitionResponse>, ApiError> {
    apply_lifecycle(&state, session_id, LifecycleInput::Cancel).await
}

/// POST /interviews/:session_id/no-show
pub async fn mark_no_show(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<TransitionResponse>, ApiError> {
    apply_lifecycle(&state, session_id, LifecycleInput::NoShow).await
}

async fn apply_lifecycle(
    state: &AppState,
    session_id: String,
    input: LifecycleInput,
) -> Result<Json<TransitionResponse>, ApiError> {
    let router = state.registry.get(&session_id).await?;
    let transition = router.lifecycle(input).await?;
    let stats = router.stats().await?;

    Ok(Json(TransitionResponse {
        session_id,
        status: stats.state.to_string(),
        changed: matches!(transition, Transition::Applied { .. }),
    }))
}

/// GET /interviews/:session_id/status
pub async fn get_interview_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStats>, ApiError> {
    Ok(Json(state.registry.status(&session_id).await?))
}

/// GET /interviews/:session_id/transcript
/// Full transcript in sequence order (historical catch-up for late joiners)
pub async fn get_interview_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let transcript = state.registry.deps().transcripts.list(&session_id).await?;
    Ok(Json(transcript))
}

/// GET /interviews/:session_id/signals
pub async fn get_interview_signals(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SignalsResponse>, ApiError> {
    let signals = &state.registry.deps().signals;
    let events = signals.events(&session_id).await;
    Ok(Json(SignalsResponse {
        summary: SignalSummary::from_events(&events),
        events,
    }))
}

/// GET /interviews/:session_id/score
pub async fn get_interview_score(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Score>, ApiError> {
    state
        .registry
        .deps()
        .aggregator
        .scores()
        .get(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No score for session {}", session_id)))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
