//! Error types for Azure DevOps script calls

use thiserror::Error;

/// Result type for Azure DevOps operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while calling the Azure DevOps scripts
#[derive(Error, Debug)]
pub enum Error {
    /// Required environment variable is not set
    #[error("Missing environment variable: {0}")]
    ConfigurationMissing(String),

    /// The script reported an Azure DevOps API error
    #[error("Azure DevOps API error (status {status}): {message}")]
    ExternalApi {
        /// HTTP status, 0 when the script did not report one
        status: u16,
        /// Message as reported by the script
        message: String,
        /// Extra detail, often the response body
        details: String,
    },

    /// Script did not finish in time
    #[error("{script} timed out after {seconds}s")]
    Timeout {
        /// Script file name
        script: String,
        /// Configured limit
        seconds: u64,
    },

    /// Script could not be started
    #[error("Failed to start script: {0}")]
    Spawn(String),

    /// Query flags are not acceptable
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Script output was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Web link could not be built
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ExternalApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}
