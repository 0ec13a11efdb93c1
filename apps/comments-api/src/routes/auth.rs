//! Login and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiErrorBody};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

// ---------------------------------------------------------------------------
// POST /api/login
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_id: String,
    pub username: String,
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created", body = LoginResponse),
        (status = 400, description = "Username is blank", body = ApiErrorBody),
    ),
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let name = body.username.unwrap_or_default();
    let session_id = state.sessions.login(&name)?;

    Ok(Json(LoginResponse {
        session_id,
        username: name.trim().to_string(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/logout
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub session_id: String,
}

#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "Auth",
    request_body = LogoutRequest,
    responses((status = 204, description = "Session discarded (or already gone)")),
)]
pub async fn logout(State(state): State<AppState>, Json(body): Json<LogoutRequest>) -> StatusCode {
    if state.sessions.logout(&body.session_id) {
        tracing::debug!(live = state.sessions.len(), "session ended");
    }
    StatusCode::NO_CONTENT
}
