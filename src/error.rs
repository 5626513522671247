//! Error types for the cache and controller layers.

use std::fmt;

/// Result type for crud-kit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback text used when a server-side failure carries no better description.
pub const SERVER_ERROR_MESSAGE: &str = "Server connection error";

/// Error types for crud-kit.
///
/// Only `Transport` is ever surfaced by the cache layer. Storage-side variants
/// (`Storage`, `QuotaExceeded`, `DeserializationError`) are absorbed inside
/// [`CacheStore`](crate::store::CacheStore) and turned into cache misses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request could not complete, or completed with a non-success status.
    ///
    /// `status` is `None` when no response was received at all
    /// (DNS failure, connection refused, offline).
    Transport {
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Human readable description of the failure.
        message: String,
    },

    /// Persistent store failed to read or write.
    Storage(String),

    /// Write rejected because the store would exceed its quota.
    QuotaExceeded {
        /// Configured quota in bytes.
        limit: usize,
        /// Bytes the store would hold after the write.
        requested: usize,
    },

    /// Value could not be encoded to JSON.
    SerializationError(String),

    /// Stored or received JSON could not be decoded.
    DeserializationError(String),

    /// Invalid settings.
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// Build a transport failure from an HTTP status.
    pub fn status(status: u16) -> Self {
        Error::Transport {
            status: Some(status),
            message: format!("ApiError: {}", status),
        }
    }

    /// Build a transport failure for a request that never got a response.
    pub fn network(message: impl Into<String>) -> Self {
        Error::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status carried by a transport failure.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// True for failures of the persistent store.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::QuotaExceeded { .. } | Error::DeserializationError(_)
        )
    }

    /// Reduce the error to a message fit for an inline error or a toast.
    ///
    /// Status-bearing transport failures map to a status-derived message,
    /// everything else uses its own message, and `default` covers errors
    /// without any usable text.
    pub fn user_message(&self, default: &str) -> String {
        if let Some(status) = self.status_code() {
            return status_message(status);
        }

        let own = match self {
            Error::Transport { message, .. } => message.clone(),
            Error::Storage(msg)
            | Error::SerializationError(msg)
            | Error::DeserializationError(msg)
            | Error::ConfigError(msg)
            | Error::Other(msg) => msg.clone(),
            Error::QuotaExceeded { .. } => self.to_string(),
        };

        if own.trim().is_empty() {
            default.to_string()
        } else {
            own
        }
    }
}

/// Message shown to the user for a non-success HTTP status.
pub fn status_message(status: u16) -> String {
    match status {
        400 => "The request was invalid".to_string(),
        401 | 403 => "You are not authorized to perform this action".to_string(),
        404 => "The requested resource was not found".to_string(),
        408 | 429 => "The server is busy, please try again later".to_string(),
        500..=599 => SERVER_ERROR_MESSAGE.to_string(),
        other => format!("Request failed with status {}", other),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport {
                status: Some(status),
                message,
            } => write!(f, "Transport error ({}): {}", status, message),
            Error::Transport {
                status: None,
                message,
            } => write!(f, "Transport error: {}", message),
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::QuotaExceeded { limit, requested } => write!(
                f,
                "Storage quota exceeded: {} bytes requested, limit is {}",
                requested, limit
            ),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::Storage(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Error::status(status.as_u16()),
            None if e.is_decode() => Error::DeserializationError(e.to_string()),
            None => Error::network(e.to_string()),
        }
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "Storage error: disk full");

        let err = Error::status(404);
        assert_eq!(err.to_string(), "Transport error (404): ApiError: 404");
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn test_user_message_uses_status() {
        assert_eq!(
            Error::status(404).user_message("Failed to fetch data"),
            "The requested resource was not found"
        );
        assert_eq!(
            Error::status(503).user_message("Failed to fetch data"),
            SERVER_ERROR_MESSAGE
        );
        assert_eq!(
            Error::status(418).user_message("x"),
            "Request failed with status 418"
        );
    }

    #[test]
    fn test_user_message_uses_own_message() {
        let err = Error::network("connection refused");
        assert_eq!(err.user_message("Failed to add the user"), "connection refused");
    }

    #[test]
    fn test_user_message_falls_back_to_default() {
        let err = Error::Other(String::new());
        assert_eq!(
            err.user_message("Failed to delete the user"),
            "Failed to delete the user"
        );
    }

    #[test]
    fn test_storage_classification() {
        assert!(Error::Storage("x".into()).is_storage());
        assert!(Error::QuotaExceeded {
            limit: 1,
            requested: 2
        }
        .is_storage());
        assert!(!Error::status(500).is_storage());
    }

    #[test]
    fn test_from_json_error() {
        let err: Error = serde_json::from_str::<u32>("{not json").unwrap_err().into();
        assert!(matches!(err, Error::DeserializationError(_)));
    }
}
