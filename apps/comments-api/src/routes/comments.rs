//! Comment history and ingest endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ApiErrorBody};
use crate::models::comment::Comment;
use crate::AppState;

/// Default and maximum page size when `after` or `limit` is given.
const DEFAULT_PAGE: usize = 100;
const MAX_PAGE: usize = 1000;

pub fn router() -> Router<AppState> {
    Router::new().route("/comments", get(list_comments).post(post_comment))
}

// ---------------------------------------------------------------------------
// GET /api/comments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// Only return comments with a greater sequence.
    pub after: Option<u64>,
    /// Page size, 1 to 1000. Defaults to 100 when paging.
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/comments",
    tag = "Comments",
    params(HistoryParams),
    responses(
        (status = 200, description = "Comments, oldest first", body = Vec<Comment>),
    ),
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    if params.after.is_none() && params.limit.is_none() {
        return Ok(Json(state.comments.history().await?));
    }

    let after = params.after.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    Ok(Json(state.comments.history_after(after, limit).await?))
}

// ---------------------------------------------------------------------------
// POST /api/comments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostCommentRequest {
    /// Display name to post as. Falls back to the session's name when blank.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/comments",
    tag = "Comments",
    request_body = PostCommentRequest,
    responses(
        (status = 201, description = "Comment stored and pushed to viewers", body = Comment),
        (status = 400, description = "Blank or oversized username/comment", body = ApiErrorBody),
    ),
)]
pub async fn post_comment(
    State(state): State<AppState>,
    Json(body): Json<PostCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let author = match body.username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => body
            .session_id
            .as_deref()
            .and_then(|id| state.sessions.lookup(id))
            .unwrap_or_default(),
    };
    let text = body.comment.unwrap_or_default();

    let comment = state.comments.post(&author, &text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
