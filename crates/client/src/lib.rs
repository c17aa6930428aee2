pub mod client;
pub mod demo;
pub mod detection;
pub mod error;
pub mod insights;
pub mod types;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use detection::{row_from_json, DetectionResult};
pub use error::ApiError;
pub use insights::{canonicalize_insights, InsightBucket, InsightsResponse};
pub use types::{
    EmailNotification, MutationResponse, RuleSuggestion, TicketPriority, TicketRequest,
    UploadKind, UploadResponse,
};
