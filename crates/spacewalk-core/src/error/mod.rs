//! Error types and result aliases for the Spacewalk acquire method.
//!
//! Every failure the method can hit maps to one variant of [`MethodError`].
//! Per-request variants end up in a `400 URI Failure` frame; the fatal ones
//! (configuration, TLS) abort the process before the protocol loop starts.

use thiserror::Error;

/// Unified error type for all acquire-method operations
#[derive(Error, Debug)]
pub enum MethodError {
    // Config errors
    #[error("Configuration field '{field}' is invalid: {reason}")]
    Config { field: String, reason: String },

    #[error("Bad TLS configuration: {reason}")]
    BadTlsConfig { reason: String },

    // Session errors
    #[error("This system is not registered with the spacewalk server")]
    NotRegistered,

    #[error("{message}")]
    Authentication { message: String },

    #[error("Missing required login information {field}")]
    MissingAuthField { field: String },

    #[error("Unable to resolve base channel: {reason}")]
    ChannelResolution { reason: String },

    // Request errors
    #[error("Host '{requested}' does not match the configured server '{configured}'")]
    HostMismatch { requested: String, configured: String },

    #[error("{status}  {reason}")]
    HttpStatus {
        status: u16,
        reason: String,
        /// Failure while draining the rejected body, reported alongside
        drain_error: Option<Box<MethodError>>,
    },

    #[error("Message is missing required field '{field}'")]
    MissingField { field: String },

    #[error("Transfer failed: {message}")]
    Transfer {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Protocol errors
    #[error("Malformed message: {message}")]
    Protocol { message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for acquire-method operations
pub type MethodResult<T> = Result<T, MethodError>;

impl MethodError {
    /// Create a configuration error for a given key
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create a transfer error from any error type
    pub fn transfer<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transfer {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Category name reported to the front end in failure messages
    pub fn category(&self) -> &'static str {
        match self {
            MethodError::Config { .. } => "ConfigError",
            MethodError::BadTlsConfig { .. } => "BadTlsConfig",
            MethodError::NotRegistered => "NotRegistered",
            MethodError::Authentication { .. } => "AuthenticationError",
            MethodError::MissingAuthField { .. } => "MissingAuthField",
            MethodError::ChannelResolution { .. } => "ChannelResolutionError",
            MethodError::HostMismatch { .. } => "HostMismatch",
            MethodError::HttpStatus { .. } => "HttpStatusError",
            MethodError::MissingField { .. } => "MissingField",
            MethodError::Transfer { .. } => "TransferError",
            MethodError::Network { .. } => "NetworkError",
            MethodError::Protocol { .. } => "ProtocolError",
            MethodError::Io { .. } => "IoError",
        }
    }

    /// Text for the `Message` field of a `400 URI Failure` frame.
    ///
    /// HTTP failures are reported verbatim as `"<status>  <reason>"`, every
    /// other error is prefixed with its category.
    pub fn failure_message(&self) -> String {
        match self {
            MethodError::HttpStatus { .. } => self.to_string(),
            other => format!("{}: {}", other.category(), other),
        }
    }

    /// Value for the optional `FailReason` field
    pub fn fail_reason(&self) -> Option<String> {
        match self {
            MethodError::HttpStatus { status, .. } => Some(format!("HttpError{}", status)),
            _ => None,
        }
    }
}
