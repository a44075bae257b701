//! In-process mock of the financial endpoints.
//!
//! Every dataset is synthetic, drawn fresh on each request. Responses use
//! the same `{data}` / `{error}` envelope and status codes a real server
//! would, so the data access layer exercises its full decode path.

pub mod chart;
pub mod health;
pub mod market;
pub mod quote;

use crate::api::transport::{ApiRequest, RawResponse, Transport};
use crate::api::types::Envelope;
use futures::future::BoxFuture;
use std::time::Duration;

pub struct MockMarket {
    latency: Duration,
}

impl MockMarket {
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
        }
    }

    /// Delay every response, to make fetch interleaving visible.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn route(request: &ApiRequest) -> (u16, Envelope) {
        match request.endpoint.as_str() {
            "/quote" => quote::handle(request),
            "/chart" => chart::handle(request),
            "/market" => market::handle(request),
            "/health" => health::handle(),
            other => (404, Envelope::error(format!("No route for {}", other))),
        }
    }
}

impl Default for MockMarket {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockMarket {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<RawResponse, String>> {
        let (status, envelope) = Self::route(&request);
        let latency = self.latency;
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            let body = serde_json::to_string(&envelope).map_err(|e| e.to_string())?;
            Ok(RawResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::HealthStatus;
    use crate::api::{ApiError, FinancialApi};
    use std::sync::Arc;

    fn api() -> FinancialApi {
        FinancialApi::new(Arc::new(MockMarket::new()))
    }

    #[tokio::test]
    async fn test_end_to_end_gainers() {
        let gainers = api().top_gainers(5).await.unwrap();
        assert_eq!(gainers.len(), 5);
        assert!(gainers.iter().all(|q| q.change > 0.0));
        assert!(gainers
            .windows(2)
            .all(|w| w[0].change_percent >= w[1].change_percent));
    }

    #[tokio::test]
    async fn test_end_to_end_losers() {
        let losers = api().top_losers(5).await.unwrap();
        assert_eq!(losers.len(), 5);
        assert!(losers.iter().all(|q| q.change < 0.0));
        assert!(losers
            .windows(2)
            .all(|w| w[0].change_percent <= w[1].change_percent));
    }

    #[tokio::test]
    async fn test_end_to_end_chart_week() {
        let points = api().chart_data("AAPL", "1D", "1W").await.unwrap();
        assert_eq!(points.len(), 8);
        assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_end_to_end_quotes_and_health() {
        let api = api();
        let quote = api.stock_quote("TSLA").await.unwrap();
        assert_eq!(quote.symbol, "TSLA");
        let quotes = api
            .multiple_quotes(&["AAPL".into(), "MSFT".into()])
            .await
            .unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(api.market_indices().await.unwrap().len(), 3);
        assert_eq!(api.check_health().await.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_cached_quote_is_stable() {
        let api = api();
        let first = api.stock_quote("NVDA").await.unwrap();
        let second = api.stock_quote("NVDA").await.unwrap();
        // random data would differ if the second call reached the mock
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let resp = MockMarket::new()
            .send(ApiRequest::new("/options"))
            .await
            .unwrap();
        assert_eq!(resp.status, 404);

        let api = api();
        let err = api.chart_data("", "1D", "1W").await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 400,
                message: "Symbol parameter required".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let market = MockMarket::with_latency(Duration::from_millis(250));
        let started = tokio::time::Instant::now();
        market.send(ApiRequest::new("/health")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
