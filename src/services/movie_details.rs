use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::{
    config::Config,
    error::AppResult,
    models::{AggregatedMovieDetails, MovieId, ServiceResponse},
    services::downstream::{require, Downstream, Params, ServiceError},
};

const BASE_UNAVAILABLE: &str = "OMDB service unavailable";

/// Builds the composite movie record for `movie_id`
///
/// The base record is fetched first because every other lookup needs its title.
/// The four enrichment lookups are then issued together and each one degrades
/// to `null` on its own when it fails.
///
/// Status mapping:
/// - base record unavailable or malformed: 503
/// - base record rejected by the adapter: the adapter's status and message
/// - no enrichment succeeded: 503
/// - some enrichments failed: 200 "retrieved partially"
/// - everything succeeded: 200 "retrieved successfully"
pub async fn get_movie_details(
    downstream: &dyn Downstream,
    config: &Config,
    movie_id: &str,
) -> AppResult<ServiceResponse> {
    let id = MovieId::Imdb(movie_id.to_string());
    let details = match aggregate(downstream, config, &id).await {
        Ok(details) => details,
        Err(ServiceError::Reported {
            status,
            message,
            data,
        }) => {
            tracing::warn!(movie_id = %movie_id, status = %status, "Base record rejected");
            return Ok(ServiceResponse::new(status, message, data));
        }
        Err(e) => {
            tracing::error!(movie_id = %movie_id, error = %e, "Base record unavailable");
            return Ok(ServiceResponse::unavailable(BASE_UNAVAILABLE));
        }
    };

    let available = details.available_count();

    tracing::info!(
        movie_id = %movie_id,
        available = available,
        total = AggregatedMovieDetails::OPTIONAL_FIELDS,
        "Movie details aggregated"
    );

    if available == 0 {
        return Ok(ServiceResponse::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "All services are currently unavailable",
            None,
        ));
    }

    let message = if available == AggregatedMovieDetails::OPTIONAL_FIELDS {
        "Movie details retrieved successfully"
    } else {
        "Movie details retrieved partially"
    };

    let data = json!({ "movie_details": serde_json::to_value(&details)? });
    Ok(ServiceResponse::ok(message, data))
}

/// Fetches the base record, then the four optional records concurrently
///
/// Returns an error only when the base record cannot be used.
pub async fn aggregate(
    downstream: &dyn Downstream,
    config: &Config,
    movie_id: &MovieId,
) -> Result<AggregatedMovieDetails, ServiceError> {
    let omdb = downstream
        .get(&config.omdb_url, vec![("id", movie_id.to_string())])
        .await?;

    let title = require(&omdb, "/Title")?
        .as_str()
        .ok_or_else(|| ServiceError::Malformed("'Title' is not a string".to_string()))?
        .to_string();

    tracing::debug!(movie_id = %movie_id, title = %title, "Base record fetched");

    let (youtube, spotify, streaming, trivia) = tokio::join!(
        fetch_optional(
            downstream,
            "youtube",
            &config.youtube_url,
            vec![("query", format!("{} trailer", title))],
        ),
        fetch_optional(
            downstream,
            "spotify",
            &config.spotify_url,
            vec![("playlist_name", title.clone())],
        ),
        fetch_optional(
            downstream,
            "streaming",
            &config.streaming_url,
            vec![
                ("imdb_id", movie_id.to_string()),
                ("country", config.streaming_country.clone()),
            ],
        ),
        fetch_optional(
            downstream,
            "trivia",
            &config.trivia_url,
            vec![("movie_title", title.clone())],
        ),
    );

    Ok(AggregatedMovieDetails {
        omdb,
        youtube,
        spotify,
        streaming,
        trivia,
    })
}

async fn fetch_optional(
    downstream: &dyn Downstream,
    field: &'static str,
    url: &str,
    params: Params,
) -> Option<Value> {
    match downstream.get(url, params).await {
        Ok(Value::Null) => {
            tracing::warn!(field = field, "Optional movie detail returned no payload");
            None
        }
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(field = field, error = %e, "Optional movie detail unavailable");
            None
        }
    }
}
