pub mod auth;
pub mod comments;
pub mod health;

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
        .nest("/api", auth::router().merge(comments::router()))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::login,
        auth::logout,
        comments::list_comments,
        comments::post_comment,
    ),
    components(
        schemas(
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            crate::models::comment::Comment,
            health::HealthResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::LogoutRequest,
            comments::PostCommentRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Auth", description = "Display-name sessions"),
        (name = "Comments", description = "Comment history and posting"),
    )
)]
pub struct ApiDoc;
