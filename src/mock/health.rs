use crate::api::types::{Envelope, HealthReport, HealthStatus};
use chrono::Utc;
use serde_json::json;

pub fn handle() -> (u16, Envelope) {
    let report = HealthReport {
        provider: "Mock API".to_string(),
        status: HealthStatus::Healthy,
        message: "Financial API is responding normally".to_string(),
        timestamp: Some(Utc::now().to_rfc3339()),
    };
    (200, Envelope::data(json!(report)))
}
