/// Failure of a data request, already reduced to a human-readable message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("API request failed ({status}): {message}")]
    Status { status: u16, message: String },

    /// The envelope carried an `error` field.
    #[error("{0}")]
    Remote(String),

    /// The body was not a valid envelope or `data` had the wrong shape.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
