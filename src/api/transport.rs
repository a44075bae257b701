//! Request/response seam between the data access layer and whatever serves
//! the financial endpoints.

use futures::future::BoxFuture;

/// A GET request against one of the financial endpoints (`/quote`,
/// `/chart`, `/market`, `/health`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub endpoint: String,
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render as `endpoint?k=v&...`, for logging.
    pub fn display_url(&self) -> String {
        if self.params.is_empty() {
            return self.endpoint.clone();
        }
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}?{}", self.endpoint, query.join("&"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can answer an [`ApiRequest`].
///
/// An `Err` means transport failure; HTTP-level failures come back as a
/// [`RawResponse`] with a non-2xx status.
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<RawResponse, String>>;
}

/// Standard reason phrase for the handful of statuses the endpoints use.
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown Status",
    }
}
