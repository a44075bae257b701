//! Fetches arbitrary JSON documents for custom API widgets.

use crate::api::error::ApiError;
use serde_json::Value;
use std::time::Duration;

pub struct ExternalFetcher {
    client: reqwest::Client,
}

impl ExternalFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("finboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { client }
    }

    /// GET `url` and parse the body as JSON.
    pub async fn fetch_json(&self, url: &str) -> Result<Value, ApiError> {
        validate_url(url)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Failed to fetch data")
                    .to_string(),
            });
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Only absolute `http`/`https` URLs are fetched.
pub fn validate_url(url: &str) -> Result<(), ApiError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::Decode("API URL is empty".to_string()));
    }
    let has_scheme = url.starts_with("http://") || url.starts_with("https://");
    let has_host = url
        .split_once("://")
        .map(|(_, rest)| !rest.is_empty() && !rest.starts_with('/'))
        .unwrap_or(false);
    if !has_scheme || !has_host {
        return Err(ApiError::Decode(format!("Not an http(s) URL: {}", url)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://api.coingecko.com/api/v3/ping").is_ok());
        assert!(validate_url("http://localhost:8080/data").is_ok());
        assert!(validate_url("").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("https://").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("example.com/data").is_err());
    }

    #[tokio::test]
    async fn test_invalid_url_does_not_hit_network() {
        let fetcher = ExternalFetcher::new(Duration::from_millis(50));
        let err = fetcher.fetch_json("not a url").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
