use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Sampler error: {0}")]
    Sampler(String),

    #[error("Sampler timed out after {0:?}")]
    SamplerTimeout(std::time::Duration),

    #[error("Invalid pattern '{pattern}': {reason}")]
    PatternInvalid { pattern: String, reason: String },

    #[error("Field not found: pattern '{0}' did not match")]
    FieldNotFound(String),

    #[error("Value is not an integer: '{0}'")]
    ValueNotInteger(String),

    #[error("Duplicate registration: counter '{0}' is already registered")]
    DuplicateRegistration(String),

    #[error("Counter '{0}' is not registered")]
    NotRegistered(String),

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
