use thiserror::Error;

#[derive(Debug, Error)]
pub enum BountydError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid payload: {0}")]
    Payload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Assessment API error: {0}")]
    Assessment(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Billing/quota error: {0}")]
    Billing(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Queue store error: {0}")]
    Queue(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid lifecycle transition: {0}")]
    Lifecycle(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
