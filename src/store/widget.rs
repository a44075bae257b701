//! Widget model and the catalog of widget kinds.

use rand::RngExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

pub type WidgetConfig = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    MarketOverview,
    Watchlist,
    Gainers,
    Losers,
    Chart,
    Table,
    Portfolio,
    ApiCustom,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 8] = [
        WidgetKind::MarketOverview,
        WidgetKind::Watchlist,
        WidgetKind::Gainers,
        WidgetKind::Losers,
        WidgetKind::Chart,
        WidgetKind::Table,
        WidgetKind::Portfolio,
        WidgetKind::ApiCustom,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            WidgetKind::MarketOverview => "market-overview",
            WidgetKind::Watchlist => "watchlist",
            WidgetKind::Gainers => "gainers",
            WidgetKind::Losers => "losers",
            WidgetKind::Chart => "chart",
            WidgetKind::Table => "table",
            WidgetKind::Portfolio => "portfolio",
            WidgetKind::ApiCustom => "api-custom",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WidgetKind::MarketOverview => "Market Overview",
            WidgetKind::Watchlist => "Watchlist",
            WidgetKind::Gainers => "Top Gainers",
            WidgetKind::Losers => "Top Losers",
            WidgetKind::Chart => "Price Chart",
            WidgetKind::Table => "Stock Table",
            WidgetKind::Portfolio => "Portfolio Performance",
            WidgetKind::ApiCustom => "Custom API",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WidgetKind::MarketOverview => "Display major market indices and their performance",
            WidgetKind::Watchlist => "Track your favorite stocks and their prices",
            WidgetKind::Gainers => "Show the best performing stocks of the day",
            WidgetKind::Losers => "Show the worst performing stocks of the day",
            WidgetKind::Chart => "Price chart for any stock symbol",
            WidgetKind::Table => "Paginated table with stock data and filters",
            WidgetKind::Portfolio => "Track your portfolio's performance and allocation",
            WidgetKind::ApiCustom => "Show selected fields from any JSON API",
        }
    }

    pub fn default_config(&self) -> WidgetConfig {
        let value = match self {
            WidgetKind::MarketOverview => json!({ "indices": ["SPY", "QQQ", "DIA"] }),
            WidgetKind::Watchlist => json!({ "symbols": ["AAPL", "GOOGL", "MSFT"] }),
            WidgetKind::Gainers | WidgetKind::Losers => json!({ "count": 5 }),
            WidgetKind::Chart => json!({ "symbol": "AAPL", "interval": "1D" }),
            WidgetKind::Table => json!({ "symbols": ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA"] }),
            WidgetKind::Portfolio => json!({ "holdings": [] }),
            WidgetKind::ApiCustom => json!({
                "apiUrl": "",
                "refreshInterval": 30,
                "displayMode": "card",
                "selectedFields": [],
                "fieldMapping": {}
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Kinds that span two grid columns.
    pub fn is_wide(&self) -> bool {
        matches!(
            self,
            WidgetKind::MarketOverview | WidgetKind::Chart | WidgetKind::Table
        )
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for WidgetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        WidgetKind::ALL
            .iter()
            .copied()
            .find(|k| k.tag() == lower)
            .ok_or_else(|| format!("unknown widget type '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub title: String,
    pub config: WidgetConfig,
    pub active: bool,
}

impl Widget {
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    pub fn config_u64(&self, key: &str) -> Option<u64> {
        self.config.get(key).and_then(Value::as_u64)
    }

    pub fn config_strings(&self, key: &str) -> Vec<String> {
        self.config
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A widget before it has been assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDraft {
    pub kind: WidgetKind,
    pub title: String,
    pub config: WidgetConfig,
    pub active: bool,
}

impl WidgetDraft {
    /// Draft using the catalog's display name and default config.
    pub fn from_kind(kind: WidgetKind) -> Self {
        Self {
            kind,
            title: kind.display_name().to_string(),
            config: kind.default_config(),
            active: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_config(mut self, key: &str, value: Value) -> Self {
        self.config.insert(key.to_string(), value);
        self
    }

    pub fn into_widget(self, id: String) -> Widget {
        Widget {
            id,
            kind: self.kind,
            title: self.title,
            config: self.config,
            active: self.active,
        }
    }
}

/// Partial update merged shallowly into a widget. `config` replaces the
/// whole config map; `id` and `kind` are never touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetUpdate {
    pub title: Option<String>,
    pub config: Option<WidgetConfig>,
    pub active: Option<bool>,
}

impl WidgetUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn config(config: WidgetConfig) -> Self {
        Self {
            config: Some(config),
            ..Default::default()
        }
    }

    pub fn apply(self, widget: &mut Widget) {
        if let Some(title) = self.title {
            widget.title = title;
        }
        if let Some(config) = self.config {
            widget.config = config;
        }
        if let Some(active) = self.active {
            widget.active = active;
        }
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `widget-<unix millis>-<9 base36 chars>`.
pub fn generate_widget_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("widget-{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}

pub fn default_widgets() -> Vec<Widget> {
    vec![
        WidgetDraft::from_kind(WidgetKind::MarketOverview).into_widget("default-1".into()),
        WidgetDraft::from_kind(WidgetKind::Watchlist)
            .with_title("My Watchlist")
            .into_widget("default-2".into()),
        WidgetDraft::from_kind(WidgetKind::Gainers).into_widget("default-3".into()),
    ]
}
