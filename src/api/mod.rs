//! Financial data access: response cache, transport seam, typed service,
//! and helpers for custom API widgets.

pub mod cache;
pub mod error;
pub mod external;
pub mod fields;
pub mod service;
pub mod transport;
pub mod types;

pub use error::ApiError;
pub use service::FinancialApi;
