use crate::api::types::StockQuote;
use crate::store::widget::Widget;
use serde::{Deserialize, Serialize};

/// One position in a portfolio widget's `holdings` config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
    /// Average cost per share.
    pub cost: f64,
}

pub fn holdings(widget: &Widget) -> Vec<Holding> {
    widget
        .config
        .get("holdings")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub day_gain: f64,
    pub day_gain_percent: f64,
    pub total_gain: f64,
    pub total_gain_percent: f64,
    /// Holdings with no quote; excluded from every figure.
    pub unpriced: usize,
}

pub fn summarize(holdings: &[Holding], quotes: &[StockQuote]) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();
    let mut basis = 0.0;
    let mut prior_value = 0.0;

    for holding in holdings {
        let Some(quote) = quotes.iter().find(|q| q.symbol == holding.symbol) else {
            summary.unpriced += 1;
            continue;
        };
        summary.total_value += holding.shares * quote.price;
        summary.day_gain += holding.shares * quote.change;
        prior_value += holding.shares * (quote.price - quote.change);
        basis += holding.shares * holding.cost;
    }

    summary.total_gain = summary.total_value - basis;
    if prior_value > 0.0 {
        summary.day_gain_percent = summary.day_gain / prior_value * 100.0;
    }
    if basis > 0.0 {
        summary.total_gain_percent = summary.total_gain / basis * 100.0;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::widget::{WidgetDraft, WidgetKind};
    use serde_json::json;

    fn quote(symbol: &str, price: f64, change: f64) -> StockQuote {
        StockQuote {
            symbol: symbol.into(),
            price,
            change,
            change_percent: 0.0,
            volume: 0,
            market_cap: None,
            pe: None,
            high: None,
            low: None,
            open: None,
            previous_close: None,
        }
    }

    #[test]
    fn test_summary() {
        let holdings = vec![
            Holding { symbol: "AAPL".into(), shares: 10.0, cost: 100.0 },
            Holding { symbol: "MSFT".into(), shares: 2.0, cost: 300.0 },
            Holding { symbol: "ZZZ".into(), shares: 1.0, cost: 1.0 },
        ];
        let quotes = vec![quote("AAPL", 110.0, 10.0), quote("MSFT", 250.0, -5.0)];
        let s = summarize(&holdings, &quotes);
        assert_eq!(s.total_value, 1600.0);
        assert_eq!(s.day_gain, 90.0);
        assert_eq!(s.total_gain, 0.0);
        assert_eq!(s.unpriced, 1);
        // prior value 10*100 + 2*255
        assert!((s.day_gain_percent - 90.0 / 1510.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_portfolio() {
        assert_eq!(summarize(&[], &[]), PortfolioSummary::default());
    }

    #[test]
    fn test_holdings_from_config() {
        let widget = WidgetDraft::from_kind(WidgetKind::Portfolio)
            .with_config("holdings", json!([{ "symbol": "TSLA", "shares": 3, "cost": 200.5 }]))
            .into_widget("p".into());
        assert_eq!(
            holdings(&widget),
            vec![Holding { symbol: "TSLA".into(), shares: 3.0, cost: 200.5 }]
        );
        let empty = WidgetDraft::from_kind(WidgetKind::Portfolio).into_widget("q".into());
        assert!(holdings(&empty).is_empty());
    }
}
