use std::time::Duration;

use serde::Deserialize;

use crate::services::downstream::FetchPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base movie-record adapter (lookup by IMDB id)
    #[serde(default = "default_omdb_url")]
    pub omdb_url: String,

    /// Free-text title search adapter
    #[serde(default = "default_omdb_search_url")]
    pub omdb_search_url: String,

    /// Video-trailer adapter
    #[serde(default = "default_youtube_url")]
    pub youtube_url: String,

    /// Playlist adapter
    #[serde(default = "default_spotify_url")]
    pub spotify_url: String,

    /// Streaming-availability adapter
    #[serde(default = "default_streaming_url")]
    pub streaming_url: String,

    /// Trivia generation adapter
    #[serde(default = "default_trivia_url")]
    pub trivia_url: String,

    /// Genre-filtered discovery adapter
    #[serde(default = "default_tmdb_discover_url")]
    pub tmdb_discover_url: String,

    /// Per-movie detail adapter (lookup by TMDB id)
    #[serde(default = "default_tmdb_movie_url")]
    pub tmdb_movie_url: String,

    /// Genre catalogue adapter
    #[serde(default = "default_genres_url")]
    pub genres_url: String,

    /// User record adapter
    #[serde(default = "default_user_url")]
    pub user_url: String,

    /// Country code sent with streaming-availability lookups
    #[serde(default = "default_streaming_country")]
    pub streaming_country: String,

    /// Prefix for relative poster paths returned by discovery
    #[serde(default = "default_poster_base_url")]
    pub poster_base_url: String,

    /// Per-call timeout for downstream requests, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Total attempts per downstream call (first try included)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed pause between attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Upper bound on in-flight per-movie detail calls during genre search
    #[serde(default = "default_enrichment_concurrency")]
    pub enrichment_concurrency: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_omdb_url() -> String {
    "http://omdb-adapter:5000/api/v1/find".to_string()
}

fn default_omdb_search_url() -> String {
    "http://omdb-adapter:5000/api/v1/search_info".to_string()
}

fn default_youtube_url() -> String {
    "http://youtube-adapter:5000/api/v1/get_video".to_string()
}

fn default_spotify_url() -> String {
    "http://spotify-adapter:5000/api/v1/search_playlist".to_string()
}

fn default_streaming_url() -> String {
    "http://streaming-availability-adapter:5000/api/v1/avail".to_string()
}

fn default_trivia_url() -> String {
    "http://groq-adapter:5000/api/v1/get_trivia".to_string()
}

fn default_tmdb_discover_url() -> String {
    "http://tmdb-adapter:5000/api/v1/discover-movies".to_string()
}

fn default_tmdb_movie_url() -> String {
    "http://tmdb-adapter:5000/api/v1/movie".to_string()
}

fn default_genres_url() -> String {
    "http://genres-db-adapter:5000/api/v1/genres".to_string()
}

fn default_user_url() -> String {
    "http://user-db-adapter:5000/api/v1/user".to_string()
}

fn default_streaming_country() -> String {
    "it".to_string()
}

fn default_poster_base_url() -> String {
    "https://image.tmdb.org/t/p/original".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_enrichment_concurrency() -> usize {
    4
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            omdb_url: default_omdb_url(),
            omdb_search_url: default_omdb_search_url(),
            youtube_url: default_youtube_url(),
            spotify_url: default_spotify_url(),
            streaming_url: default_streaming_url(),
            trivia_url: default_trivia_url(),
            tmdb_discover_url: default_tmdb_discover_url(),
            tmdb_movie_url: default_tmdb_movie_url(),
            genres_url: default_genres_url(),
            user_url: default_user_url(),
            streaming_country: default_streaming_country(),
            poster_base_url: default_poster_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            enrichment_concurrency: default_enrichment_concurrency(),
            host: default_host(),
            port: default_port(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the fetch client and enrichment pool cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_retries == 0 {
            anyhow::bail!("MAX_RETRIES must be at least 1");
        }
        if self.request_timeout_ms == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_MS must be greater than 0");
        }
        if self.enrichment_concurrency == 0 {
            anyhow::bail!("ENRICHMENT_CONCURRENCY must be at least 1");
        }
        Ok(())
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
