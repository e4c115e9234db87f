use thiserror::Error;

/// Exit code for configuration, usage and logger failures
pub const EXIT_CONFIG_FAILURE: u8 = 1;
/// Exit code when one or more recommendation fetches failed
pub const EXIT_FETCH_FAILURE: u8 = 2;
/// Exit code when the report could not be written
pub const EXIT_OUTPUT_FAILURE: u8 = 3;

/// Main error type for the recommender application
#[derive(Error, Debug)]
pub enum RecommenderError {
    /// AWS-related errors
    #[error("AWS error: {0}")]
    Aws(#[from] AwsError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected shape of a recommendation record
    #[error("Parse error: {0}")]
    Parse(String),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(String),
}

impl RecommenderError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            RecommenderError::Aws(_) | RecommenderError::Parse(_) | RecommenderError::Network(_) => {
                EXIT_FETCH_FAILURE
            }
            RecommenderError::Io(_) | RecommenderError::Csv(_) | RecommenderError::Json(_) => {
                EXIT_OUTPUT_FAILURE
            }
            RecommenderError::Config(_) => EXIT_CONFIG_FAILURE,
        }
    }
}

/// AWS-specific errors
#[derive(Error, Debug)]
pub enum AwsError {
    /// Authentication failure
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Authorization/permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// AWS service error
    #[error("AWS service error: {0}")]
    ServiceError(String),

    /// AWS rate limiting
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be signed
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Log file setup error
    #[error("File error: {0}")]
    FileError(String),
}

/// Helper type alias for Results
pub type Result<T> = std::result::Result<T, RecommenderError>;
