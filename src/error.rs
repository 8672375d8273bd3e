use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Network failure, timeout or non-2xx status from one upstream source
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Upstream answered but a required field was missing or had the wrong shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Exchange rate unavailable: {0}")]
    RateUnavailable(String),

    /// Persistence layer unreachable or misconfigured
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A store operation failed after the store was reachable
    #[error("Store error: {0}")]
    Store(String),

    #[error("Empty result set: {0}")]
    EmptyResultSet(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Errors that only cost the run a single record (the source yields "no data")
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::SourceUnavailable(_)
                | AppError::MalformedResponse(_)
                | AppError::RateUnavailable(_)
                | AppError::Parse(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

// Alias for convenience
pub type Error = AppError;
