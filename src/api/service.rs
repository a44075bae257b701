//! Data access layer: one operation per data kind, each consulting the
//! response cache before going to the transport.

use crate::api::cache::ResponseCache;
use crate::api::error::ApiError;
use crate::api::transport::{status_reason, ApiRequest, Transport};
use crate::api::types::{ChartPoint, Envelope, HealthReport, HealthStatus, MarketIndex, StockQuote};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex};

const QUOTE_TTL_MINUTES: f64 = 1.0;
const CHART_TTL_MINUTES: f64 = 5.0;
const INDICES_TTL_MINUTES: f64 = 5.0;
const MOVERS_TTL_MINUTES: f64 = 2.0;

pub struct FinancialApi {
    transport: Arc<dyn Transport>,
    cache: Mutex<ResponseCache>,
}

impl FinancialApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: Mutex::new(ResponseCache::new()),
        }
    }

    pub async fn stock_quote(&self, symbol: &str) -> Result<StockQuote, ApiError> {
        let request = ApiRequest::new("/quote").param("symbol", symbol);
        let key = format!("quote_{}", symbol);
        self.fetch(request, &key, QUOTE_TTL_MINUTES)
            .await
            .inspect_err(|e| tracing::warn!(symbol, error = %e, "quote fetch failed"))
    }

    pub async fn multiple_quotes(&self, symbols: &[String]) -> Result<Vec<StockQuote>, ApiError> {
        let joined = symbols.join(",");
        let request = ApiRequest::new("/quote").param("symbols", joined.clone());
        let key = format!("quotes_{}", joined);
        self.fetch(request, &key, QUOTE_TTL_MINUTES)
            .await
            .inspect_err(|e| tracing::warn!(symbols = %joined, error = %e, "quotes fetch failed"))
    }

    pub async fn chart_data(
        &self,
        symbol: &str,
        interval: &str,
        period: &str,
    ) -> Result<Vec<ChartPoint>, ApiError> {
        let request = ApiRequest::new("/chart")
            .param("symbol", symbol)
            .param("interval", interval)
            .param("period", period);
        let key = format!("chart_{}_{}_{}", symbol, interval, period);
        self.fetch(request, &key, CHART_TTL_MINUTES)
            .await
            .inspect_err(|e| tracing::warn!(symbol, error = %e, "chart fetch failed"))
    }

    pub async fn market_indices(&self) -> Result<Vec<MarketIndex>, ApiError> {
        let request = ApiRequest::new("/market").param("type", "indices");
        self.fetch(request, "market_indices", INDICES_TTL_MINUTES)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "market indices fetch failed"))
    }

    pub async fn top_gainers(&self, limit: usize) -> Result<Vec<StockQuote>, ApiError> {
        let request = ApiRequest::new("/market")
            .param("type", "gainers")
            .param("limit", limit.to_string());
        let key = format!("gainers_{}", limit);
        self.fetch(request, &key, MOVERS_TTL_MINUTES)
            .await
            .inspect_err(|e| tracing::warn!(limit, error = %e, "top gainers fetch failed"))
    }

    pub async fn top_losers(&self, limit: usize) -> Result<Vec<StockQuote>, ApiError> {
        let request = ApiRequest::new("/market")
            .param("type", "losers")
            .param("limit", limit.to_string());
        let key = format!("losers_{}", limit);
        self.fetch(request, &key, MOVERS_TTL_MINUTES)
            .await
            .inspect_err(|e| tracing::warn!(limit, error = %e, "top losers fetch failed"))
    }

    /// Probe `/health`. Never fails: any problem is folded into a report
    /// with [`HealthStatus::Error`]. Bypasses the cache.
    pub async fn check_health(&self) -> HealthReport {
        match self.probe_health().await {
            Ok(report) => report,
            Err(message) => {
                tracing::warn!(%message, "health check failed");
                HealthReport {
                    provider: "Server API".to_string(),
                    status: HealthStatus::Error,
                    message,
                    timestamp: None,
                }
            }
        }
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    async fn probe_health(&self) -> Result<HealthReport, String> {
        let response = self.transport.send(ApiRequest::new("/health")).await?;
        let envelope: Envelope = serde_json::from_str(&response.body).map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(envelope
                .error
                .unwrap_or_else(|| "Health check failed".to_string()));
        }
        let data = envelope
            .data
            .ok_or_else(|| "Health check returned no data".to_string())?;
        serde_json::from_value(data).map_err(|e| e.to_string())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        cache_key: &str,
        ttl_minutes: f64,
    ) -> Result<T, ApiError> {
        let value = self.request_value(request, cache_key, ttl_minutes).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn request_value(
        &self,
        request: ApiRequest,
        cache_key: &str,
        ttl_minutes: f64,
    ) -> Result<Value, ApiError> {
        if let Some(hit) = self.cache_get(cache_key) {
            tracing::debug!(key = cache_key, "cache hit");
            return Ok(hit);
        }

        let url = request.display_url();
        let response = self
            .transport
            .send(request)
            .await
            .map_err(ApiError::Transport)?;

        let envelope = serde_json::from_str::<Envelope>(&response.body);
        if !response.is_success() {
            let message = envelope
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| status_reason(response.status).to_string());
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        let envelope = envelope?;
        if let Some(error) = envelope.error {
            return Err(ApiError::Remote(error));
        }
        let data = envelope
            .data
            .ok_or_else(|| ApiError::Decode(format!("{} returned no data", url)))?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.set(cache_key, data.clone(), Some(ttl_minutes));
        }
        Ok(data)
    }

    fn cache_get(&self, key: &str) -> Option<Value> {
        self.cache.lock().ok().and_then(|mut cache| cache.get(key))
    }
}
