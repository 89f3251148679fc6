//! Generic REST client wrapper around reqwest.

use crate::error::RestError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header carrying the Binance API key.
const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Wait assumed when a rate-limited response carries no `Retry-After`.
const DEFAULT_RETRY_AFTER_MS: u64 = 60_000;

/// Generic REST client for making HTTP requests.
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a new REST client with the given base URL and request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RestError::RequestBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path?query`, sending the API key header when given.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<T, RestError> {
        self.send(Method::GET, path, query, api_key).await
    }

    /// POST `path?query`. Binance accepts signed parameters in the query string.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<T, RestError> {
        self.send(Method::POST, path, query, api_key).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<T, RestError> {
        let url = self.build_url(path, query);
        tracing::debug!(method = %method, path = %path, "REST request");

        let mut request = self.client.request(method, &url);
        if let Some(key) = api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    fn build_url(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", self.base_url, path, q),
            _ => format!("{}{}", self.base_url, path),
        }
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, RestError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(DEFAULT_RETRY_AFTER_MS);
            return Err(RestError::RateLimited { retry_after_ms });
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(RestError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(body = %body, error = %e, "Failed to parse response");
            RestError::Parse(e.to_string())
        })
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
