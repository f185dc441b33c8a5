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
    services::movie_search::{self, GenreSearch},
};

const DEFAULT_SORT: &str = "popularity.desc";

#[derive(Debug, Deserialize)]
pub struct TextSearchQuery {
    query: String,
}

#[derive(Debug, Deserialize)]
pub struct GenreSearchQuery {
    language: String,
    with_genres: String,
    vote_avg_gt: f64,
    #[serde(default)]
    sort_by: Option<String>,
}

impl GenreSearchQuery {
    fn into_search(self) -> AppResult<GenreSearch> {
        let language = required("language", &self.language)?.to_string();
        let genre_ids = parse_genre_ids(&self.with_genres)?;
        let sort_by = self
            .sort_by
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SORT.to_string());

        Ok(GenreSearch {
            language,
            genre_ids,
            min_rating: self.vote_avg_gt,
            sort_by,
        })
    }
}

/// Parses a comma-separated genre id list such as `28,12`
fn parse_genre_ids(raw: &str) -> AppResult<Vec<u32>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>().map_err(|_| {
                AppError::validation(format!("'{}' in with_genres is not a genre id", s))
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    if ids.is_empty() {
        return Err(AppError::validation(
            "Query parameter 'with_genres' must list at least one genre id",
        ));
    }

    Ok(ids)
}

/// Handler for the free-text title search endpoint
pub async fn search_text(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<TextSearchQuery>, QueryRejection>,
) -> AppResult<ServiceResponse> {
    let Query(params) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let text = required("query", &params.query)?;

    tracing::info!(request_id = %request_id, query = %text, "Processing text search");

    movie_search::search_by_text(state.downstream.as_ref(), &state.config, text).await
}

/// Handler for the genre discovery search endpoint
pub async fn search_genre(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<GenreSearchQuery>, QueryRejection>,
) -> AppResult<ServiceResponse> {
    let Query(params) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let search = params.into_search()?;

    tracing::info!(
        request_id = %request_id,
        language = %search.language,
        genres = ?search.genre_ids,
        min_rating = search.min_rating,
        sort_by = %search.sort_by,
        "Processing genre search"
    );

    movie_search::search_by_genre(state.downstream.as_ref(), &state.config, &search).await
}
