//! Error types for the contract review client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Transport and setup errors
///
/// These never reach the user directly. The controller maps them onto a
/// [`JobError`] carrying one of the configured user-visible messages.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network failure, non-2xx reply or undecodable body
    #[error("Transport error during {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// Download reference could not be turned into a URL
    #[error("Invalid download reference '{reference}': {message}")]
    InvalidReference { reference: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a transport error
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error came from talking to the remote service
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// User-facing job errors
///
/// `Display` yields the message a view shows verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// Job creation failed; the controller went back to `Idle`
    #[error("{0}")]
    Submission(String),

    /// A status check failed; the job is `Failed`
    #[error("{0}")]
    Poll(String),

    /// The service reported the job as failed
    #[error("{0}")]
    BusinessFailure(String),

    /// A newer submission replaced this one before it was accepted
    #[error("superseded by a newer submission")]
    Superseded,

    /// The controller was disposed
    #[error("job controller disposed")]
    Disposed,
}

impl JobError {
    /// Stable machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Submission(_) => "submission_error",
            Self::Poll(_) => "poll_error",
            Self::BusinessFailure(_) => "business_failure",
            Self::Superseded => "superseded",
            Self::Disposed => "disposed",
        }
    }

    /// Whether this error leaves the job in the terminal `Failed` state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Poll(_) | Self::BusinessFailure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_displays_user_message() {
        let err = JobError::BusinessFailure("Cláusula 3 inválida".to_string());
        assert_eq!(err.to_string(), "Cláusula 3 inválida");
        assert_eq!(err.kind(), "business_failure");
        assert!(err.is_terminal());

        let err = JobError::Submission("Erro ao iniciar a análise.".to_string());
        assert!(!err.is_terminal());
    }

    #[test]
    fn test_transport_helper() {
        let err = Error::transport("fetch_status", "HTTP 502");
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Transport error during fetch_status: HTTP 502");
        assert!(!Error::config("bad").is_transport());
    }
}
