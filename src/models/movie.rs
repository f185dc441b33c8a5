use serde::{Deserialize, Serialize};
use serde_json::Value;

const NOT_AVAILABLE: &str = "N/A";

/// Composite record built once per movie-details request
///
/// `omdb` is the mandatory base record; each of the other four fields is
/// independently `None` when its adapter failed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregatedMovieDetails {
    pub omdb: Value,
    pub youtube: Option<Value>,
    pub spotify: Option<Value>,
    pub streaming: Option<Value>,
    pub trivia: Option<Value>,
}

impl AggregatedMovieDetails {
    /// Number of optional sub-records that were retrieved
    pub fn available_count(&self) -> usize {
        [&self.youtube, &self.spotify, &self.streaming, &self.trivia]
            .iter()
            .filter(|field| field.is_some())
            .count()
    }

    pub const OPTIONAL_FIELDS: usize = 4;
}

/// Candidate returned by the genre-filtered discovery adapter
///
/// Only the id is read; every displayed field comes from the detail lookup.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DiscoveredMovie {
    #[serde(rename = "tmdbId")]
    pub tmdb_id: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DetailGenre {
    pub name: String,
}

/// Full record returned by the per-movie detail adapter under `data.movie`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MovieDetailRecord {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    /// ISO date, e.g. "2019-04-24"
    #[serde(rename = "Year", default)]
    pub release_date: Option<String>,
    #[serde(rename = "imdbId", default)]
    pub imdb_id: Option<String>,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
    #[serde(rename = "GenreIds", default)]
    pub genres: Vec<DetailGenre>,
    #[serde(rename = "Rating", default)]
    pub rating: Option<f64>,
}

/// Display shape shared by text search and genre search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedMovie {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Poster")]
    pub poster: String,
    #[serde(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: f64,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum MalformedField {
    #[error("release date missing")]
    MissingDate,
    #[error("release date '{0}' is not ISO formatted")]
    InvalidDate(String),
    #[error("rating {0} is not a finite number")]
    InvalidRating(f64),
}

impl EnrichedMovie {
    /// Reshapes a detail record into the display schema
    pub fn from_detail(
        detail: MovieDetailRecord,
        poster_base: &str,
    ) -> Result<Self, MalformedField> {
        let release_date = detail.release_date.ok_or(MalformedField::MissingDate)?;
        let year = extract_year(&release_date)?;

        let rating = detail.rating.unwrap_or(0.0);
        if !rating.is_finite() {
            return Err(MalformedField::InvalidRating(rating));
        }

        let genre = detail
            .genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            title: detail.title.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            year,
            imdb_id: detail.imdb_id.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            poster: poster_url(poster_base, detail.poster.as_deref()),
            genre,
            imdb_rating: round_rating(rating),
        })
    }
}

/// Takes the part of an ISO date before the first `-`; it must be a 4-digit year
pub fn extract_year(date: &str) -> Result<String, MalformedField> {
    let year = date.split('-').next().unwrap_or_default().trim();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        Ok(year.to_string())
    } else {
        Err(MalformedField::InvalidDate(date.to_string()))
    }
}

/// Rounds half away from zero at one decimal place
pub fn round_rating(rating: f64) -> f64 {
    (rating * 10.0).round() / 10.0
}

pub fn poster_url(base: &str, path: Option<&str>) -> String {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ),
        None => NOT_AVAILABLE.to_string(),
    }
}
