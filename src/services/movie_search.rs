use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use crate::{
    config::Config,
    error::AppResult,
    models::{
        movie::MalformedField, DiscoveredMovie, EnrichedMovie, MovieDetailRecord, MovieId,
        ServiceResponse,
    },
    services::downstream::{require, Downstream, ServiceError},
};

const SEARCH_SUCCESS: &str = "Movies retrieved successfully";
const TEXT_SEARCH_UNAVAILABLE: &str = "OMDB service unavailable";
const DISCOVERY_UNAVAILABLE: &str = "TMDB service unavailable";

/// Filters for a genre discovery search
#[derive(Debug, Clone, PartialEq)]
pub struct GenreSearch {
    pub language: String,
    pub genre_ids: Vec<u32>,
    pub min_rating: f64,
    pub sort_by: String,
}

impl GenreSearch {
    fn discovery_params(&self) -> Vec<(&'static str, String)> {
        let genres = self
            .genre_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");

        vec![
            ("language", self.language.clone()),
            ("with_genres", genres),
            ("vote_avg_gt", self.min_rating.to_string()),
            ("sort_by", self.sort_by.clone()),
        ]
    }
}

/// Why one discovery candidate was left out of the result list
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum EnrichmentError {
    #[error("candidate could not be read: {0}")]
    InvalidCandidate(String),

    #[error("detail lookup failed: {0}")]
    Downstream(#[from] ServiceError),

    #[error("detail record malformed: {0}")]
    Malformed(#[from] MalformedField),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentFailure {
    /// `None` when the candidate did not even carry a readable id
    pub candidate: Option<MovieId>,
    pub error: EnrichmentError,
}

/// Survivors of the enrichment step, sorted by rating, plus what was dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentReport {
    pub movies: Vec<EnrichedMovie>,
    pub failures: Vec<EnrichmentFailure>,
}

/// Free-text title search, highest rated first
pub async fn search_by_text(
    downstream: &dyn Downstream,
    config: &Config,
    query: &str,
) -> AppResult<ServiceResponse> {
    let payload = match downstream
        .get(&config.omdb_search_url, vec![("title", query.to_string())])
        .await
    {
        Ok(payload) => payload,
        Err(e) => return Ok(dependency_failure(e, TEXT_SEARCH_UNAVAILABLE)),
    };

    let mut movies = match require(&payload, "/data").map(Value::as_array) {
        Ok(Some(movies)) => movies.clone(),
        _ => {
            tracing::error!(query = %query, "Text search payload has no movie list");
            return Ok(ServiceResponse::unavailable(TEXT_SEARCH_UNAVAILABLE));
        }
    };

    movies.sort_by(|a, b| rating_of(&b["imdbRating"]).total_cmp(&rating_of(&a["imdbRating"])));

    tracing::info!(query = %query, results = movies.len(), "Text search completed");

    Ok(ServiceResponse::ok(SEARCH_SUCCESS, json!({ "movie_list": movies })))
}

/// Genre discovery followed by per-movie enrichment
pub async fn search_by_genre(
    downstream: &dyn Downstream,
    config: &Config,
    search: &GenreSearch,
) -> AppResult<ServiceResponse> {
    let candidates = match discover(downstream, config, search).await {
        Ok(candidates) => candidates,
        Err(e) => return Ok(dependency_failure(e, DISCOVERY_UNAVAILABLE)),
    };

    let discovered = candidates.len();
    let report = enrich_candidates(downstream, config, &search.language, candidates).await;

    tracing::info!(
        language = %search.language,
        genres = ?search.genre_ids,
        discovered = discovered,
        enriched = report.movies.len(),
        dropped = report.failures.len(),
        "Genre search completed"
    );

    Ok(ServiceResponse::ok(
        SEARCH_SUCCESS,
        json!({ "movie_list": serde_json::to_value(&report.movies)? }),
    ))
}

/// Returns the raw candidate list from the discovery adapter
pub async fn discover(
    downstream: &dyn Downstream,
    config: &Config,
    search: &GenreSearch,
) -> Result<Vec<Value>, ServiceError> {
    let payload = downstream
        .get(&config.tmdb_discover_url, search.discovery_params())
        .await?;

    if payload.get("status").and_then(Value::as_str) != Some("success") {
        return Err(ServiceError::Malformed(
            "discovery payload is not a success envelope".to_string(),
        ));
    }

    require(&payload, "/data/movie_list")?
        .as_array()
        .cloned()
        .ok_or_else(|| ServiceError::Malformed("'movie_list' is not a list".to_string()))
}

/// Looks up every candidate with at most `enrichment_concurrency` calls in
/// flight, drops the ones that fail, and sorts the rest by rating
pub async fn enrich_candidates(
    downstream: &dyn Downstream,
    config: &Config,
    language: &str,
    candidates: Vec<Value>,
) -> EnrichmentReport {
    let outcomes: Vec<Result<EnrichedMovie, EnrichmentFailure>> = stream::iter(candidates)
        .map(|candidate| enrich_one(downstream, config, language, candidate))
        .buffered(config.enrichment_concurrency.max(1))
        .collect()
        .await;

    let mut report = EnrichmentReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(movie) => report.movies.push(movie),
            Err(failure) => {
                tracing::warn!(
                    candidate = ?failure.candidate,
                    error = %failure.error,
                    "Dropping movie from genre search"
                );
                report.failures.push(failure);
            }
        }
    }

    sort_by_rating_desc(&mut report.movies);
    report
}

async fn enrich_one(
    downstream: &dyn Downstream,
    config: &Config,
    language: &str,
    candidate: Value,
) -> Result<EnrichedMovie, EnrichmentFailure> {
    let discovered: DiscoveredMovie =
        serde_json::from_value(candidate).map_err(|e| EnrichmentFailure {
            candidate: None,
            error: EnrichmentError::InvalidCandidate(e.to_string()),
        })?;

    let id = MovieId::Tmdb(discovered.tmdb_id);
    let fail = |error: EnrichmentError| EnrichmentFailure {
        candidate: Some(id.clone()),
        error,
    };

    let payload = downstream
        .get(
            &config.tmdb_movie_url,
            vec![("id", id.to_string()), ("language", language.to_string())],
        )
        .await
        .map_err(|e| fail(e.into()))?;

    let record = require(&payload, "/data/movie").map_err(|e| fail(e.into()))?;
    let detail: MovieDetailRecord = serde_json::from_value(record.clone())
        .map_err(|e| fail(ServiceError::Malformed(e.to_string()).into()))?;

    EnrichedMovie::from_detail(detail, &config.poster_base_url).map_err(|e| fail(e.into()))
}

/// Stable descending sort on `imdbRating`
pub fn sort_by_rating_desc(movies: &mut [EnrichedMovie]) {
    movies.sort_by(|a, b| b.imdb_rating.total_cmp(&a.imdb_rating));
}

/// Numeric value of a rating that may arrive as a number or a string;
/// anything else ("N/A", missing) sorts last
fn rating_of(value: &Value) -> f64 {
    let rating = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    rating
        .filter(|r| r.is_finite())
        .unwrap_or(f64::NEG_INFINITY)
}

/// Reported errors keep the adapter's own status; anything else means the
/// named dependency is unusable
fn dependency_failure(error: ServiceError, unavailable_message: &str) -> ServiceResponse {
    match error {
        ServiceError::Reported { .. } => error.to_response(),
        other => {
            tracing::error!(
                error = %other,
                dependency = unavailable_message,
                "Search dependency failed"
            );
            ServiceResponse::unavailable(unavailable_message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::downstream::MockDownstream;
    use axum::http::StatusCode;

    fn test_config() -> Config {
        Config {
            omdb_search_url: "http://omdb/search_info".to_string(),
            tmdb_discover_url: "http://tmdb/discover-movies".to_string(),
            tmdb_movie_url: "http://tmdb/movie".to_string(),
            poster_base_url: "https://image.tmdb.org/t/p/original".to_string(),
            enrichment_concurrency: 2,
            ..Config::default()
        }
    }

    fn search() -> GenreSearch {
        GenreSearch {
            language: "en-US".to_string(),
            genre_ids: vec![28, 12],
            min_rating: 7.5,
            sort_by: "popularity.desc".to_string(),
        }
    }

    fn discovery(ids: &[u64]) -> Value {
        let list: Vec<Value> = ids
            .iter()
            .map(|id| json!({"tmdbId": id, "Title": format!("Movie {}", id)}))
            .collect();
        json!({"status": "success", "data": {"movie_list": list}})
    }

    fn detail(id: u64, rating: f64) -> Value {
        json!({
            "status": "success",
            "data": {"movie": {
                "Title": format!("Movie {}", id),
                "Year": "2019-04-24",
                "imdbId": format!("tt{:07}", id),
                "Poster": format!("/poster{}.jpg", id),
                "GenreIds": [{"id": 28, "name": "Action"}, {"id": 12, "name": "Adventure"}],
                "Rating": rating
            }}
        })
    }

    fn id_param(params: &[(&'static str, String)]) -> u64 {
        params
            .iter()
            .find(|(key, _)| *key == "id")
            .map(|(_, value)| value.parse().unwrap())
            .unwrap()
    }

    #[test]
    fn test_discovery_params_join_genres() {
        assert_eq!(
            search().discovery_params(),
            vec![
                ("language", "en-US".to_string()),
                ("with_genres", "28,12".to_string()),
                ("vote_avg_gt", "7.5".to_string()),
                ("sort_by", "popularity.desc".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_genre_search_sorts_by_rating() {
        let mut mock = MockDownstream::new();
        mock.expect_get().returning(|url, params| match url {
            "http://tmdb/discover-movies" => Ok(discovery(&[1, 2, 3])),
            "http://tmdb/movie" => {
                let id = id_param(&params);
                let rating = [0.0, 6.04, 8.46, 7.25][id as usize];
                Ok(detail(id, rating))
            }
            other => panic!("unexpected url {}", other),
        });

        let response = search_by_genre(&mock, &test_config(), &search()).await.unwrap();

        assert_eq!(response.code, StatusCode::OK);
        assert_eq!(response.body.message, "Movies retrieved successfully");
        let data = response.body.data.unwrap();
        let list = data["movie_list"].as_array().unwrap();
        let ratings: Vec<f64> = list.iter().map(|m| m["imdbRating"].as_f64().unwrap()).collect();
        assert_eq!(ratings, vec![8.5, 7.3, 6.0]);
        assert_eq!(list[0]["imdbID"], "tt0000002");
        assert_eq!(list[0]["Year"], "2019");
        assert_eq!(list[0]["Genre"], "Action, Adventure");
        assert_eq!(
            list[0]["Poster"],
            "https://image.tmdb.org/t/p/original/poster2.jpg"
        );
    }

    #[tokio::test]
    async fn test_failed_enrichment_is_dropped_and_reported() {
        let mut mock = MockDownstream::new();
        mock.expect_get().returning(|url, params| {
            assert_eq!(url, "http://tmdb/movie");
            match id_param(&params) {
                1 => Ok(detail(1, 7.0)),
                2 => Err(ServiceError::Unavailable { attempts: 3 }),
                3 => Ok(json!({"status": "success", "data": {"movie": {
                    "Title": "No Date", "Rating": 9.0
                }}})),
                4 => Ok(json!({"status": "success", "data": {}})),
                id => Ok(detail(id, 5.5)),
            }
        });

        let candidates = vec![
            json!({"tmdbId": 1}),
            json!({"tmdbId": 2}),
            json!({"tmdbId": 3}),
            json!({"tmdbId": 4}),
            json!({"Title": "no id"}),
            json!({"tmdbId": 5}),
        ];

        let report = enrich_candidates(&mock, &test_config(), "en-US", candidates).await;

        assert_eq!(report.movies.len(), 2);
        assert_eq!(report.movies[0].imdb_rating, 7.0);
        assert_eq!(report.movies[1].imdb_rating, 5.5);
        assert_eq!(report.failures.len(), 4);

        assert_eq!(
            report.failures[0],
            EnrichmentFailure {
                candidate: Some(MovieId::Tmdb(2)),
                error: EnrichmentError::Downstream(ServiceError::Unavailable { attempts: 3 }),
            }
        );
        assert_eq!(
            report.failures[1].error,
            EnrichmentError::Malformed(MalformedField::MissingDate)
        );
        assert!(matches!(
            report.failures[2].error,
            EnrichmentError::Downstream(ServiceError::Malformed(_))
        ));
        assert_eq!(report.failures[3].candidate, None);
    }

    #[tokio::test]
    async fn test_genre_search_passes_language_to_detail_calls() {
        let mut mock = MockDownstream::new();
        mock.expect_get().returning(|url, params| match url {
            "http://tmdb/discover-movies" => Ok(discovery(&[7])),
            _ => {
                assert!(params.contains(&("language", "en-US".to_string())));
                Ok(detail(7, 6.6))
            }
        });

        let response = search_by_genre(&mock, &test_config(), &search()).await.unwrap();
        let data = response.body.data.unwrap();
        assert_eq!(data["movie_list"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_discovery_unavailable() {
        let mut mock = MockDownstream::new();
        mock.expect_get()
            .times(1)
            .returning(|_, _| Err(ServiceError::Unavailable { attempts: 3 }));

        let response = search_by_genre(&mock, &test_config(), &search()).await.unwrap();

        assert_eq!(response.code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body.message, "TMDB service unavailable");
    }

    #[tokio::test]
    async fn test_discovery_without_success_status_is_unavailable() {
        let mut mock = MockDownstream::new();
        mock.expect_get()
            .times(1)
            .returning(|_, _| Ok(json!({"data": {"movie_list": []}})));

        let response = search_by_genre(&mock, &test_config(), &search()).await.unwrap();
        assert_eq!(response.code, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_discovery_rejection_is_passed_through() {
        let mut mock = MockDownstream::new();
        mock.expect_get().times(1).returning(|_, _| {
            Err(ServiceError::Reported {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid language format".to_string(),
                data: None,
            })
        });

        let response = search_by_genre(&mock, &test_config(), &search()).await.unwrap();
        assert_eq!(response.code, StatusCode::BAD_REQUEST);
        assert_eq!(response.body.message, "Invalid language format");
    }

    #[tokio::test]
    async fn test_empty_discovery_gives_empty_list() {
        let mut mock = MockDownstream::new();
        mock.expect_get().times(1).returning(|_, _| Ok(discovery(&[])));

        let response = search_by_genre(&mock, &test_config(), &search()).await.unwrap();
        assert_eq!(response.code, StatusCode::OK);
        assert_eq!(response.body.data.unwrap()["movie_list"], json!([]));
    }

    #[tokio::test]
    async fn test_text_search_sorts_by_rating() {
        let mut mock = MockDownstream::new();
        mock.expect_get().times(1).returning(|url, params| {
            assert_eq!(url, "http://omdb/search_info");
            assert_eq!(params, vec![("title", "batman".to_string())]);
            Ok(json!({"status": "success", "data": [
                {"Title": "Batman Returns", "imdbRating": "NaN"},
                {"Title": "Batman & Robin", "imdbRating": "3.8"},
                {"Title": "Batman Forever", "imdbRating": "N/A"},
                {"Title": "The Dark Knight", "imdbRating": "9.0"},
                {"Title": "Batman Begins", "imdbRating": 8.2}
            ]}))
        });

        let response = search_by_text(&mock, &test_config(), "batman").await.unwrap();

        assert_eq!(response.code, StatusCode::OK);
        let data = response.body.data.unwrap();
        let titles: Vec<&str> = data["movie_list"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["Title"].as_str().unwrap())
            .collect();
        assert_eq!(
            titles,
            vec![
                "The Dark Knight",
                "Batman Begins",
                "Batman & Robin",
                "Batman Returns",
                "Batman Forever"
            ]
        );
    }

    #[tokio::test]
    async fn test_text_search_rejection_is_passed_through() {
        let mut mock = MockDownstream::new();
        mock.expect_get().times(1).returning(|_, _| {
            Err(ServiceError::Reported {
                status: StatusCode::NOT_FOUND,
                message: "Movie not found!".to_string(),
                data: None,
            })
        });

        let response = search_by_text(&mock, &test_config(), "zzzz").await.unwrap();
        assert_eq!(response.code, StatusCode::NOT_FOUND);
        assert_eq!(response.body.message, "Movie not found!");
    }

    #[tokio::test]
    async fn test_text_search_without_list_is_unavailable() {
        let mut mock = MockDownstream::new();
        mock.expect_get()
            .times(1)
            .returning(|_, _| Ok(json!({"status": "success"})));

        let response = search_by_text(&mock, &test_config(), "batman").await.unwrap();
        assert_eq!(response.code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body.message, "OMDB service unavailable");
    }

    #[test]
    fn test_rating_of_handles_mixed_values() {
        assert_eq!(rating_of(&json!(7.5)), 7.5);
        assert_eq!(rating_of(&json!("8.1")), 8.1);
        assert_eq!(rating_of(&json!("N/A")), f64::NEG_INFINITY);
        assert_eq!(rating_of(&Value::Null), f64::NEG_INFINITY);
        assert_eq!(rating_of(&json!("NaN")), f64::NEG_INFINITY);
        assert_eq!(rating_of(&json!("inf")), f64::NEG_INFINITY);
    }

    #[test]
    fn test_sort_is_stable_for_equal_ratings() {
        let movie = |title: &str, rating: f64| EnrichedMovie {
            title: title.to_string(),
            year: "2000".to_string(),
            imdb_id: "N/A".to_string(),
            poster: "N/A".to_string(),
            genre: String::new(),
            imdb_rating: rating,
        };
        let mut movies = vec![movie("a", 7.0), movie("b", 8.0), movie("c", 7.0)];
        sort_by_rating_desc(&mut movies);
        let titles: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
    }
}
