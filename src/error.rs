//! Error types for the budget manager agent

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, BudgetAgentError>;

/// Failure categories for a single external model call.
///
/// The variant is what gets surfaced to the user ("could not reach the
/// analysis service"), never the raw transport error alone.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("authentication with the analysis service failed: {0}")]
    Auth(String),

    #[error("analysis service rate limit reached: {0}")]
    RateLimit(String),

    #[error("analysis service timed out: {0}")]
    Timeout(String),

    #[error("could not reach the analysis service: {0}")]
    Network(String),

    #[error("analysis service returned a malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum BudgetAgentError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("no financial input supplied - fill in at least one section")]
    EmptyInput,

    #[error("a report is already being generated for this session")]
    RequestInFlight,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
