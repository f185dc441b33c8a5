use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    models::ServiceResponse,
};

pub mod movie_details;
pub mod movie_search;
pub mod state;
pub mod user_genres;

pub use state::AppState;

/// Creates the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .nest("/api/v1", api_routes())
        .fallback(not_found)
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movie_details", get(movie_details::get_movie_details))
        .route("/movie_search_text", get(movie_search::search_text))
        .route("/movie_search_genre", get(movie_search::search_genre))
        .route("/user_genres", get(user_genres::get_user_genres))
        .route("/update_user_genres", put(user_genres::update_user_genres))
}

async fn health_check() -> ServiceResponse {
    ServiceResponse::new(StatusCode::OK, "Movie Match Service is up and running!", None)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(detail).into_response()
}

/// Rejects blank values for parameters the adapters key on
pub(crate) fn required<'a>(name: &str, value: &'a str) -> AppResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!(
            "Query parameter '{}' must not be empty",
            name
        )));
    }
    Ok(value)
}
