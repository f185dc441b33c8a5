use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

pub mod genre;
pub mod movie;

pub use genre::{Genre, PreferenceUpdate, UserGenre, UserPreferenceSet};
pub use movie::{AggregatedMovieDetails, DiscoveredMovie, EnrichedMovie, MovieDetailRecord};

/// Identifier for a movie in one of the two id spaces the adapters use
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MovieId {
    /// IMDB ID (e.g., "tt4154796"), understood by the base-record and streaming adapters
    Imdb(String),
    /// TMDB numeric ID, understood by the discovery and per-movie detail adapters
    Tmdb(u64),
}

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovieId::Imdb(id) => write!(f, "{}", id),
            MovieId::Tmdb(id) => write!(f, "{}", id),
        }
    }
}

// ============================================================================
// Response envelope
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

impl ResponseStatus {
    /// `Error` iff the HTTP code is 400 or above
    pub fn for_code(code: StatusCode) -> Self {
        if code.as_u16() >= 400 {
            ResponseStatus::Error
        } else {
            ResponseStatus::Success
        }
    }
}

/// The `{status, message, data}` wrapper used at every service boundary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// An envelope paired with the HTTP status it is sent with
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub code: StatusCode,
    pub body: Envelope,
}

impl ServiceResponse {
    pub fn new(code: StatusCode, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            body: Envelope {
                status: ResponseStatus::for_code(code),
                message: message.into(),
                data,
            },
        }
    }

    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message, None)
    }
}

impl IntoResponse for ServiceResponse {
    fn into_response(self) -> Response {
        (self.code, Json(self.body)).into_response()
    }
}
