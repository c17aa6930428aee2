use recondash_import::CsvError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),
}

impl ApiError {
    /// Timeouts and connection failures; these are the only errors that may
    /// be answered with demo data.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout(e.to_string())
        } else if e.is_decode() {
            ApiError::ResponseShape(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::ResponseShape(e.to_string())
    }
}
