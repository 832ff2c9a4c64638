use std::convert::Infallible;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::{Stream, StreamExt};
use proctor_core::{AssignOutcome, AssignmentError};
use proctor_core::seating::Seat;
use serde::{Deserialize, Serialize};
use crate::{
    error::AppError,
    middleware::{examinee_auth_middleware, ExamineeClaims},
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignSeatResponse {
    pub seat_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RosterResponse {
    pub strategy: String,
    pub available: usize,
    pub seats: Vec<Seat>,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Comma separated topic list.
    pub topics: Option<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/v1/seats/assign", post(assign_seat))
        .route_layer(middleware::from_fn_with_state(state, examinee_auth_middleware));

    Router::new()
        .route("/v1/seats", get(list_seats))
        .route("/v1/seats/stream", get(stream_assignments))
        .merge(protected)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/seats/assign
/// Seat the caller, or return the seat they already hold. 204 when full.
pub async fn assign_seat(
    State(state): State<AppState>,
    Extension(claims): Extension<ExamineeClaims>,
) -> Result<Response, AppError> {
    let result = state.seating.request_seat(&claims.sub).await.map_err(|e| match e {
        AssignmentError::EmptyRequester => AppError::ValidationError(e.to_string()),
        other => AppError::from(other),
    })?;

    let (seat_id, status) = match result.outcome {
        AssignOutcome::Assigned(seat_id) => (seat_id, "ASSIGNED"),
        AssignOutcome::Existing(seat_id) => (seat_id, "EXISTING"),
        AssignOutcome::NoSeats => return Ok(StatusCode::NO_CONTENT.into_response()),
    };

    Ok(Json(AssignSeatResponse {
        seat_id,
        status: status.to_string(),
    })
    .into_response())
}

/// GET /v1/seats
/// Roster in seating order with current occupancy.
pub async fn list_seats(State(state): State<AppState>) -> Result<Json<RosterResponse>, AppError> {
    let roster = state.seating.roster().await?;

    Ok(Json(RosterResponse {
        strategy: state.seating.store().picker_name().to_string(),
        available: roster.available(),
        seats: roster.into_seats(),
    }))
}

/// GET /v1/seats/stream?topics=...
/// Server-sent events for every broadcast on the requested topics.
/// Frames never carry requester ids.
pub async fn stream_assignments(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let topics: Vec<String> = match query.topics {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        None => vec![state.seating.topic().to_string()],
    };

    let stream = state
        .realtime
        .subscribe(topics)
        .await
        .map(|message| Ok(Event::default().event(message.topic).data(message.payload)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
