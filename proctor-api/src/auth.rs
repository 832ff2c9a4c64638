use axum::{
    extract::State,
    Json,
    routing::post,
    Router,
};
use serde::Serialize;
use chrono::{Utc, Duration};
use uuid::Uuid;
use crate::{state::AppState, error::AppError, middleware::auth::{issue_token, ExamineeClaims, EXAMINEE_ROLE}};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    requester_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/guest", post(login_guest))
}

/// Ungated demo login: every call mints a fresh examinee identity.
async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let claims = ExamineeClaims {
        sub: format!("examinee-{}", Uuid::new_v4()),
        role: EXAMINEE_ROLE.to_owned(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = issue_token(&state.auth, &claims)
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse { token, requester_id: claims.sub }))
}
