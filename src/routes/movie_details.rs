use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::ServiceResponse,
    routes::{required, AppState},
    services::movie_details,
};

#[derive(Debug, Deserialize)]
pub struct MovieDetailsQuery {
    movie_id: String,
}

/// Handler for the aggregated movie details endpoint
pub async fn get_movie_details(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<MovieDetailsQuery>, QueryRejection>,
) -> AppResult<ServiceResponse> {
    let Query(params) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let movie_id = required("movie_id", &params.movie_id)?;

    tracing::info!(
        request_id = %request_id,
        movie_id = %movie_id,
        "Processing movie details request"
    );

    let response =
        movie_details::get_movie_details(state.downstream.as_ref(), &state.config, movie_id)
            .await?;

    tracing::info!(
        request_id = %request_id,
        status = %response.code,
        "Movie details request completed"
    );

    Ok(response)
}
