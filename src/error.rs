//! Error types for the Teams planner.

/// Top-level error type for the planner.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Microsoft Graph errors.
///
/// There is deliberately no error for malformed message payloads: the
/// normalizer applies safe defaults instead, so upstream data quality
/// issues never abort a run.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Graph request failed ({status}): {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Failed to acquire Graph token: {0}")]
    TokenAcquisition(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Model request failed ({status}): {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Model response missing content")]
    MissingContent,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the planner.
pub type Result<T> = std::result::Result<T, Error>;
