//! reqwest-backed downstream client with bounded retries
//!
//! Connection failures and timeouts are retried with a fixed delay up to the
//! policy's attempt budget. Any HTTP response, including 4xx/5xx, ends the loop
//! immediately since the adapter has already answered.
use axum::http::StatusCode;
use reqwest::{Client as HttpClient, RequestBuilder};
use serde_json::Value;

use super::{classify, Downstream, FetchPolicy, FetchResult, Params, ServiceError};

#[derive(Clone)]
pub struct HttpDownstream {
    http_client: HttpClient,
    policy: FetchPolicy,
}

impl HttpDownstream {
    pub fn new(policy: FetchPolicy) -> Self {
        Self {
            http_client: HttpClient::new(),
            policy,
        }
    }

    fn is_transient(error: &reqwest::Error) -> bool {
        error.is_connect() || error.is_timeout()
    }

    /// Sends one attempt and reads the whole body under the call timeout
    async fn attempt(request: RequestBuilder) -> Result<(StatusCode, Vec<u8>), reqwest::Error> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }

    async fn send_with_retry<F>(&self, method: &'static str, url: &str, build: F) -> FetchResult
    where
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.policy.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match Self::attempt(build().timeout(self.policy.timeout)).await {
                Ok((status, body)) => {
                    tracing::debug!(
                        method = method,
                        url = %url,
                        status = %status,
                        attempt = attempt,
                        "Downstream call completed"
                    );
                    return classify(status, &body);
                }
                Err(e) if Self::is_transient(&e) && attempt < max_attempts => {
                    tracing::warn!(
                        method = method,
                        url = %url,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Transient downstream failure, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        method = method,
                        url = %url,
                        attempts = attempt,
                        error = %e,
                        "Downstream unavailable"
                    );
                    return Err(ServiceError::Unavailable { attempts: attempt });
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Downstream for HttpDownstream {
    async fn get(&self, url: &str, params: Params) -> FetchResult {
        self.send_with_retry("GET", url, || self.http_client.get(url).query(&params))
            .await
    }

    async fn put(&self, url: &str, params: Params, body: Value) -> FetchResult {
        self.send_with_retry("PUT", url, || {
            self.http_client.put(url).query(&params).json(&body)
        })
        .await
    }
}
