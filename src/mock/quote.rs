use crate::api::transport::ApiRequest;
use crate::api::types::{round2, Envelope, StockQuote};
use rand::RngExt;
use serde_json::json;

pub fn generate_quote(symbol: &str) -> StockQuote {
    let mut rng = rand::rng();
    let base_price: f64 = rng.random_range(50.0..550.0);
    let change: f64 = rng.random_range(-10.0..10.0);
    let change_percent = change / base_price * 100.0;

    StockQuote {
        symbol: symbol.to_string(),
        price: round2(base_price),
        change: round2(change),
        change_percent: round2(change_percent),
        volume: rng.random_range(1_000_000..11_000_000),
        market_cap: Some(format!("${:.1}B", rng.random_range(100.0..2100.0))),
        pe: Some((rng.random_range(10.0..60.0_f64) * 10.0).round() / 10.0),
        high: Some(round2(base_price + rng.random_range(0.0..10.0))),
        low: Some(round2(base_price - rng.random_range(0.0..10.0))),
        open: Some(round2(base_price + rng.random_range(-2.5..2.5))),
        previous_close: Some(round2(base_price - change)),
    }
}

/// `/quote?symbol=X` returns one quote, `/quote?symbols=A,B` a list.
pub fn handle(request: &ApiRequest) -> (u16, Envelope) {
    if let Some(symbols) = request.get("symbols").filter(|s| !s.is_empty()) {
        let quotes: Vec<StockQuote> = symbols.split(',').map(generate_quote).collect();
        return (200, Envelope::data(json!(quotes)));
    }
    if let Some(symbol) = request.get("symbol").filter(|s| !s.is_empty()) {
        return (200, Envelope::data(json!(generate_quote(symbol))));
    }
    (400, Envelope::error("Symbol or symbols parameter required"))
}
