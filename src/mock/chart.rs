use crate::api::transport::ApiRequest;
use crate::api::types::{round2, ChartPoint, Envelope};
use chrono::{Duration, Local};
use rand::RngExt;
use serde_json::json;

/// Number of trailing days covered by a period tag.
pub fn period_days(period: &str) -> i64 {
    match period {
        "1M" => 30,
        "1W" => 7,
        _ => 1,
    }
}

/// A random walk of `days + 1` daily points ending today, oldest first.
/// The price never falls below 80% of where it started.
pub fn generate_series(days: i64) -> Vec<ChartPoint> {
    let mut rng = rand::rng();
    let base_price: f64 = rng.random_range(50.0..550.0);
    let floor = base_price * 0.8;
    let mut current = base_price;
    let today = Local::now().date_naive();

    (0..=days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            current = (current + rng.random_range(-5.0..5.0)).max(floor);
            ChartPoint {
                timestamp: date.format("%Y-%m-%d").to_string(),
                price: round2(current),
                volume: Some(rng.random_range(500_000..1_500_000)),
                high: Some(round2(current + rng.random_range(0.0..5.0))),
                low: Some(round2(current - rng.random_range(0.0..5.0))),
                open: Some(round2(current + rng.random_range(-1.5..1.5))),
                close: Some(round2(current)),
            }
        })
        .collect()
}

pub fn handle(request: &ApiRequest) -> (u16, Envelope) {
    if request.get("symbol").filter(|s| !s.is_empty()).is_none() {
        return (400, Envelope::error("Symbol parameter required"));
    }
    let period = request.get("period").unwrap_or("1M");
    let series = generate_series(period_days(period));
    (200, Envelope::data(json!(series)))
}
