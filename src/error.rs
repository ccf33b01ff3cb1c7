//! Error types for the banter crate.
//!
//! This module defines one error type covering every failure that can occur
//! while authenticating a session, pacing outgoing messages, or enumerating
//! a roster.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// The main error type for the banter crate.
#[derive(Clone, Debug)]
pub enum Error {
    /// The session configuration is malformed.  Raised before any network
    /// activity and never retried.
    InvalidConfig {
        /// Human-readable error message.
        message: String,
        /// Configuration field that failed validation.
        param: Option<String>,
    },

    /// Opening the transport exceeded the configured timeout.
    ConnectionTimeout {
        /// Human-readable error message.
        message: String,
        /// The timeout that was exceeded, in seconds.
        duration: Option<f64>,
    },

    /// An authentication challenge occurred with no callback registered to
    /// answer it.
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// The backend rejected the credentials, login code, or password.
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Roster or dialog resolution found no match.
    ChatNotFound {
        /// Human-readable error message.
        message: String,
        /// The identifier that failed to resolve.
        identifier: Option<String>,
    },

    /// The backend mandated a wait before the operation may be retried.
    RateLimited {
        /// Human-readable error message.
        message: String,
        /// Time to wait before retrying, in seconds.
        retry_after_secs: u64,
    },

    /// A resolved peer is not an addressable target for this operation.
    RecipientInvalid {
        /// Human-readable error message.
        message: String,
        /// The recipient identifier that resolved to an invalid peer.
        identifier: Option<String>,
    },

    /// The session was stopped or disconnected while the operation was in
    /// flight.
    SessionClosed {
        /// Human-readable error message.
        message: String,
    },

    /// A wire-level failure reported by the transport.
    Transport {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The external reasoning engine failed to produce a reply.
    Reasoner {
        /// Human-readable error message.
        message: String,
    },

    /// Error during JSON serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// Unknown error.
    Unknown {
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Creates a new invalid-config error.
    pub fn invalid_config(message: impl Into<String>, param: Option<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
            param,
        }
    }

    /// Creates a new connection-timeout error.
    pub fn connection_timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::ConnectionTimeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new chat-not-found error.
    pub fn chat_not_found(message: impl Into<String>, identifier: Option<String>) -> Self {
        Error::ChatNotFound {
            message: message.into(),
            identifier,
        }
    }

    /// Creates a new rate-limited error.
    pub fn rate_limited(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Error::RateLimited {
            message: message.into(),
            retry_after_secs,
        }
    }

    /// Creates a new recipient-invalid error.
    pub fn recipient_invalid(message: impl Into<String>, identifier: Option<String>) -> Self {
        Error::RecipientInvalid {
            message: message.into(),
            identifier,
        }
    }

    /// Creates a new session-closed error.
    pub fn session_closed(message: impl Into<String>) -> Self {
        Error::SessionClosed {
            message: message.into(),
        }
    }

    /// Creates a new transport error.
    pub fn transport(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Transport {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new reasoner error.
    pub fn reasoner(message: impl Into<String>) -> Self {
        Error::Reasoner {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new unknown error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Error::Unknown {
            message: message.into(),
        }
    }

    /// Returns true if this error is a configuration validation failure.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Error::InvalidConfig { .. })
    }

    /// Returns true if this error is a connection timeout.
    pub fn is_connection_timeout(&self) -> bool {
        matches!(self, Error::ConnectionTimeout { .. })
    }

    /// Returns true if this error is a missing-callback configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    /// Returns true if this error is related to authentication.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns true if this error is a chat-not-found error.
    pub fn is_chat_not_found(&self) -> bool {
        matches!(self, Error::ChatNotFound { .. })
    }

    /// Returns true if this error is a backend rate limit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// Returns true if this error marks an unaddressable recipient.
    pub fn is_recipient_invalid(&self) -> bool {
        matches!(self, Error::RecipientInvalid { .. })
    }

    /// Returns true if this error is a closed-session abort.
    pub fn is_session_closed(&self) -> bool {
        matches!(self, Error::SessionClosed { .. })
    }

    /// Returns true if this error may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ConnectionTimeout { .. } | Error::RateLimited { .. } | Error::Transport { .. }
        )
    }

    /// Returns the backend-mandated wait, if this error carries one.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Error::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig { message, param } => {
                if let Some(param) = param {
                    write!(f, "Invalid config: {message} (field: {param})")
                } else {
                    write!(f, "Invalid config: {message}")
                }
            }
            Error::ConnectionTimeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Connection timeout: {message} ({duration} seconds)")
                } else {
                    write!(f, "Connection timeout: {message}")
                }
            }
            Error::Configuration { message } => {
                write!(f, "Configuration error: {message}")
            }
            Error::Authentication { message } => {
                write!(f, "Authentication failed: {message}")
            }
            Error::ChatNotFound {
                message,
                identifier,
            } => {
                if let Some(identifier) = identifier {
                    write!(f, "Chat not found: {message} [{identifier}]")
                } else {
                    write!(f, "Chat not found: {message}")
                }
            }
            Error::RateLimited {
                message,
                retry_after_secs,
            } => {
                write!(
                    f,
                    "Rate limited: {message} (retry after {retry_after_secs} seconds)"
                )
            }
            Error::RecipientInvalid {
                message,
                identifier,
            } => {
                if let Some(identifier) = identifier {
                    write!(f, "Invalid recipient: {message} [{identifier}]")
                } else {
                    write!(f, "Invalid recipient: {message}")
                }
            }
            Error::SessionClosed { message } => {
                write!(f, "Session closed: {message}")
            }
            Error::Transport { message, .. } => {
                write!(f, "Transport error: {message}")
            }
            Error::Reasoner { message } => {
                write!(f, "Reasoner error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::Unknown { message } => {
                write!(f, "Unknown error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Transport { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

/// A specialized Result type for banter operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_carried() {
        let err = Error::rate_limited("flood wait", 42);
        assert!(err.is_rate_limited());
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(42));
    }

    #[test]
    fn retry_after_absent() {
        let err = Error::authentication("bad code");
        assert!(err.is_authentication());
        assert!(!err.is_retryable());
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn display_includes_field() {
        let err = Error::invalid_config(
            "phone_number must start with '+'",
            Some("phone_number".to_string()),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("phone_number"));
        assert!(rendered.contains("Invalid config"));
    }

    #[test]
    fn session_closed_is_not_retryable() {
        let err = Error::session_closed("stopped during send");
        assert!(err.is_session_closed());
        assert!(!err.is_retryable());
    }
}
