//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Bridge Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Bridge error: {message}")]
    Bridge { message: String },

    #[error("Bridge protocol error: {message}")]
    Protocol { message: String },

    #[error("Invalid bridge endpoint: {endpoint}")]
    Endpoint { endpoint: String },

    #[error("{capability} capture is not supported in this context")]
    CaptureUnavailable { capability: String },

    // ─────────────────────────────────────────────────────────────
    // Backend Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("No scenario identifier available")]
    IdentifierUnresolved,

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn bridge(message: impl Into<String>) -> Self {
        Self::Bridge {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn endpoint(endpoint: impl Into<String>) -> Self {
        Self::Endpoint {
            endpoint: endpoint.into(),
        }
    }

    pub fn capture_unavailable(capability: impl Into<String>) -> Self {
        Self::CaptureUnavailable {
            capability: capability.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors surface in panel error state with a manual retry;
    /// they never abort a capture run on their own.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Bridge { .. }
                | Error::Protocol { .. }
                | Error::Backend { .. }
                | Error::CaptureUnavailable { .. }
                | Error::IdentifierUnresolved
                | Error::ChannelSend { .. }
                | Error::ChannelClosed
        )
    }

    /// Check if this error should abort the capture run entirely
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Endpoint { .. } | Error::ConfigNotFound { .. } | Error::ConfigInvalid { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::bridge("connection lost");
        assert_eq!(err.to_string(), "Bridge error: connection lost");

        let err = Error::capture_unavailable("console");
        assert_eq!(
            err.to_string(),
            "console capture is not supported in this context"
        );

        let err = Error::IdentifierUnresolved;
        assert!(err.to_string().contains("identifier"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::endpoint("not-a-url").is_fatal());
        assert!(Error::ConfigNotFound {
            path: PathBuf::from("/test")
        }
        .is_fatal());
        assert!(!Error::backend("test").is_fatal());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::bridge("test").is_recoverable());
        assert!(Error::backend("timeout").is_recoverable());
        assert!(Error::capture_unavailable("network").is_recoverable());
        assert!(Error::IdentifierUnresolved.is_recoverable());
        assert!(!Error::endpoint("bad").is_recoverable());
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::bridge("test");
        let _ = Error::protocol("test");
        let _ = Error::backend("test");
        let _ = Error::config("test");
        let _ = Error::config_invalid("test");
        let _ = Error::channel_send("test");
    }
}
