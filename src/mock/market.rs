use crate::api::transport::ApiRequest;
use crate::api::types::{round2, Envelope, MarketIndex, StockQuote};
use rand::RngExt;
use serde_json::json;

const INDICES: &[(&str, &str)] = &[("SPY", "S&P 500"), ("QQQ", "NASDAQ"), ("DIA", "DOW")];

const GAINER_POOL: &[&str] = &[
    "NVDA", "AMD", "TSLA", "AAPL", "GOOGL", "MSFT", "META", "AMZN", "NFLX", "CRM",
];

const LOSER_POOL: &[&str] = &[
    "META", "NFLX", "CRM", "PYPL", "SNAP", "TWTR", "UBER", "LYFT", "ROKU", "ZM",
];

const DEFAULT_LIMIT: usize = 10;

pub fn indices() -> Vec<MarketIndex> {
    let mut rng = rand::rng();
    INDICES
        .iter()
        .map(|(symbol, name)| MarketIndex {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price: round2(rng.random_range(3000.0..4000.0)),
            change: round2(rng.random_range(-50.0..50.0)),
            change_percent: round2(rng.random_range(-1.5..1.5)),
        })
        .collect()
}

/// Build movers from `pool`. `sign` is `1.0` for gainers and `-1.0` for
/// losers; the magnitude of the change is always in `[5, 25)`.
fn movers(pool: &[&str], limit: usize, sign: f64) -> Vec<StockQuote> {
    let mut rng = rand::rng();
    let mut quotes: Vec<StockQuote> = pool
        .iter()
        .take(limit)
        .map(|symbol| {
            let base_price: f64 = rng.random_range(50.0..550.0);
            let change = sign * rng.random_range(5.0..25.0);
            StockQuote {
                symbol: symbol.to_string(),
                price: round2(base_price),
                change: round2(change),
                change_percent: round2(change / base_price * 100.0),
                volume: rng.random_range(1_000_000..11_000_000),
                market_cap: None,
                pe: None,
                high: None,
                low: None,
                open: None,
                previous_close: None,
            }
        })
        .collect();

    if sign > 0.0 {
        quotes.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
    } else {
        quotes.sort_by(|a, b| a.change_percent.total_cmp(&b.change_percent));
    }
    quotes
}

pub fn gainers(limit: usize) -> Vec<StockQuote> {
    movers(GAINER_POOL, limit, 1.0)
}

pub fn losers(limit: usize) -> Vec<StockQuote> {
    movers(LOSER_POOL, limit, -1.0)
}

pub fn handle(request: &ApiRequest) -> (u16, Envelope) {
    let limit = request
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(DEFAULT_LIMIT);

    match request.get("type").unwrap_or("indices") {
        "indices" => (200, Envelope::data(json!(indices()))),
        "gainers" => (200, Envelope::data(json!(gainers(limit)))),
        "losers" => (200, Envelope::data(json!(losers(limit)))),
        _ => (400, Envelope::error("Invalid type parameter")),
    }
}
