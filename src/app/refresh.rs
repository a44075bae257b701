//! Per-widget fetch scheduling.
//!
//! Each widget gets a [`WidgetFeed`]. A feed's generation increases every
//! time the widget's config changes or the widget is refetched by hand;
//! results carry the generation they were requested under and anything
//! older than the feed's current generation is dropped.

use crate::api::external::ExternalFetcher;
use crate::api::types::{ChartPoint, MarketIndex, StockQuote};
use crate::api::FinancialApi;
use crate::app::portfolio;
use crate::store::settings::DashboardSettings;
use crate::store::widget::{Widget, WidgetKind};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetPayload {
    Indices(Vec<MarketIndex>),
    Quotes(Vec<StockQuote>),
    Chart {
        points: Vec<ChartPoint>,
        quote: Option<StockQuote>,
    },
    Custom(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    Loading,
    Ready(WidgetPayload),
    Failed(String),
}

/// What a widget needs fetched, resolved from its config.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchSpec {
    Indices { symbols: Vec<String> },
    Quotes { symbols: Vec<String> },
    Gainers { limit: usize },
    Losers { limit: usize },
    Chart { symbol: String, interval: String, period: String },
    Custom { url: String },
}

impl FetchSpec {
    pub fn for_widget(widget: &Widget) -> Option<FetchSpec> {
        let count = || widget.config_u64("count").unwrap_or(5).max(1) as usize;
        let spec = match widget.kind {
            WidgetKind::MarketOverview => FetchSpec::Indices {
                symbols: widget.config_strings("indices"),
            },
            WidgetKind::Watchlist | WidgetKind::Table => FetchSpec::Quotes {
                symbols: widget.config_strings("symbols"),
            },
            WidgetKind::Portfolio => FetchSpec::Quotes {
                symbols: portfolio::holdings(widget)
                    .into_iter()
                    .map(|h| h.symbol)
                    .collect(),
            },
            WidgetKind::Gainers => FetchSpec::Gainers { limit: count() },
            WidgetKind::Losers => FetchSpec::Losers { limit: count() },
            WidgetKind::Chart => FetchSpec::Chart {
                symbol: widget.config_str("symbol").unwrap_or("AAPL").to_string(),
                interval: widget.config_str("interval").unwrap_or("1D").to_string(),
                period: widget.config_str("period").unwrap_or("1M").to_string(),
            },
            WidgetKind::ApiCustom => {
                let url = widget.config_str("apiUrl").unwrap_or_default().trim();
                if url.is_empty() {
                    return None;
                }
                FetchSpec::Custom { url: url.to_string() }
            }
        };
        Some(spec)
    }

    /// Run the fetch against the data layer.
    pub async fn run(self, api: &FinancialApi, external: &ExternalFetcher) -> Result<WidgetPayload, String> {
        let payload = match self {
            FetchSpec::Indices { symbols } => {
                let mut indices = api.market_indices().await.map_err(|e| e.to_string())?;
                if !symbols.is_empty() {
                    indices.retain(|i| symbols.contains(&i.symbol));
                }
                WidgetPayload::Indices(indices)
            }
            FetchSpec::Quotes { symbols } if symbols.is_empty() => WidgetPayload::Quotes(Vec::new()),
            FetchSpec::Quotes { symbols } => {
                WidgetPayload::Quotes(api.multiple_quotes(&symbols).await.map_err(|e| e.to_string())?)
            }
            FetchSpec::Gainers { limit } => {
                WidgetPayload::Quotes(api.top_gainers(limit).await.map_err(|e| e.to_string())?)
            }
            FetchSpec::Losers { limit } => {
                WidgetPayload::Quotes(api.top_losers(limit).await.map_err(|e| e.to_string())?)
            }
            FetchSpec::Chart { symbol, interval, period } => {
                let points = api
                    .chart_data(&symbol, &interval, &period)
                    .await
                    .map_err(|e| e.to_string())?;
                // the headline quote is decoration; a failure still shows the chart
                let quote = api.stock_quote(&symbol).await.ok();
                WidgetPayload::Chart { points, quote }
            }
            FetchSpec::Custom { url } => {
                WidgetPayload::Custom(external.fetch_json(&url).await.map_err(|e| e.to_string())?)
            }
        };
        Ok(payload)
    }
}

/// Longest periodic interval; anything above is clamped to it.
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Periodic interval for a widget, `None` for fetch-once.
pub fn effective_interval(widget: &Widget, settings: &DashboardSettings) -> Option<Duration> {
    let every = match widget.kind {
        WidgetKind::Chart => None,
        WidgetKind::ApiCustom => match widget.config_u64("refreshInterval") {
            Some(secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => settings.auto_refresh_ms().map(Duration::from_millis),
        },
        _ => settings.auto_refresh_ms().map(Duration::from_millis),
    };
    every.map(|every| every.min(MAX_REFRESH_INTERVAL))
}

#[derive(Debug, Clone)]
pub struct WidgetFeed {
    pub generation: u64,
    pub state: FeedState,
    pub next_due: Option<Instant>,
    pub interval: Option<Duration>,
    pub updated_at: Option<chrono::DateTime<chrono::Local>>,
    fingerprint: Value,
}

impl WidgetFeed {
    fn new(widget: &Widget, interval: Option<Duration>, now: Instant) -> Self {
        Self {
            generation: 0,
            state: FeedState::Loading,
            next_due: Some(now),
            interval,
            updated_at: None,
            fingerprint: fingerprint(widget),
        }
    }
}

fn fingerprint(widget: &Widget) -> Value {
    Value::Object(widget.config.clone())
}

/// A fetch the main loop should spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchJob {
    pub widget_id: String,
    pub generation: u64,
    pub spec: FetchSpec,
}

#[derive(Debug, Default)]
pub struct RefreshScheduler {
    feeds: HashMap<String, WidgetFeed>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self, id: &str) -> Option<&WidgetFeed> {
        self.feeds.get(id)
    }

    /// Reconcile feeds with the current widgets: create feeds for new
    /// widgets, drop feeds of removed ones, bump generations on config
    /// changes, and pick up interval changes.
    pub fn sync(&mut self, widgets: &[Widget], settings: &DashboardSettings, now: Instant) {
        self.feeds.retain(|id, _| widgets.iter().any(|w| &w.id == id));

        for widget in widgets {
            let interval = effective_interval(widget, settings);
            let Some(feed) = self.feeds.get_mut(&widget.id) else {
                self.feeds
                    .insert(widget.id.clone(), WidgetFeed::new(widget, interval, now));
                continue;
            };

            let print = fingerprint(widget);
            if feed.fingerprint != print {
                feed.fingerprint = print;
                feed.generation += 1;
                feed.state = FeedState::Loading;
                feed.next_due = Some(now);
            }
            if feed.interval != interval {
                feed.interval = interval;
                if feed.next_due.map_or(true, |due| due > now) {
                    feed.next_due = interval.and_then(|every| now.checked_add(every));
                }
            }
        }
    }

    /// Collect fetches that are due and schedule their next run.
    pub fn due(&mut self, widgets: &[Widget], now: Instant) -> Vec<FetchJob> {
        let mut jobs = Vec::new();
        for widget in widgets {
            let Some(feed) = self.feeds.get_mut(&widget.id) else {
                continue;
            };
            if !widget.active || !feed.next_due.is_some_and(|due| due <= now) {
                continue;
            }
            feed.next_due = feed.interval.and_then(|every| now.checked_add(every));
            match FetchSpec::for_widget(widget) {
                Some(spec) => jobs.push(FetchJob {
                    widget_id: widget.id.clone(),
                    generation: feed.generation,
                    spec,
                }),
                None => feed.state = FeedState::Failed("Nothing to fetch; configure the widget first".into()),
            }
        }
        jobs
    }

    /// Manual refresh of one widget. Bumps the generation so an in-flight
    /// periodic fetch cannot overwrite the fresh result.
    pub fn refresh(&mut self, id: &str, now: Instant) {
        if let Some(feed) = self.feeds.get_mut(id) {
            feed.generation += 1;
            feed.next_due = Some(now);
        }
    }

    pub fn refresh_all(&mut self, now: Instant) {
        for feed in self.feeds.values_mut() {
            feed.generation += 1;
            feed.next_due = Some(now);
        }
    }

    /// Record a finished fetch. Returns `false` when the result was stale.
    pub fn complete(&mut self, id: &str, generation: u64, result: Result<WidgetPayload, String>) -> bool {
        let Some(feed) = self.feeds.get_mut(id) else {
            tracing::debug!(widget = %id, "dropping result for removed widget");
            return false;
        };
        if feed.generation != generation {
            tracing::debug!(
                widget = %id,
                got = generation,
                current = feed.generation,
                "dropping stale fetch result"
            );
            return false;
        }
        feed.state = match result {
            Ok(payload) => FeedState::Ready(payload),
            Err(message) => FeedState::Failed(message),
        };
        feed.updated_at = Some(chrono::Local::now());
        true
    }
}
