//! Error types for the CAMARA adapter layer
//!
//! Every adapter surfaces the same canonical error kinds regardless of the
//! backend's native error shape. Backend HTTP statuses are folded into this
//! taxonomy at the transport boundary and never leak further up.

use thiserror::Error;

use crate::domain::capability::Capability;

/// Unified error type for the adapter layer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Local Errors (raised before any network call)
    // =========================================================================
    #[error("Capability '{capability}' is not supported by {adapter}")]
    CapabilityNotSupported {
        capability: Capability,
        adapter: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Backend Errors (translated from HTTP statuses)
    // =========================================================================
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Platform error (status {status:?}): {message}")]
    PlatformError {
        status: Option<u16>,
        message: String,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML encode error: {0}")]
    YamlEncode(#[from] serde_yaml::Error),
}

impl Error {
    /// Translate a backend HTTP status into the canonical error kind.
    ///
    /// The table is fixed across all adapters: 400, 401, 403, 404 and 503
    /// map to their canonical counterparts, anything else lands in the
    /// generic platform bucket carrying the original status for diagnosis.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            400 => Error::InvalidArgument(detail),
            401 => Error::Unauthenticated(detail),
            403 => Error::PermissionDenied(detail),
            404 => Error::NotFound { resource: detail },
            503 => Error::ServiceUnavailable(detail),
            _ => Error::PlatformError {
                status: Some(status),
                message: detail,
            },
        }
    }

    /// Shorthand for the capability guard failure.
    pub fn unsupported(capability: Capability, adapter: &str) -> Self {
        Error::CapabilityNotSupported {
            capability,
            adapter: adapter.to_string(),
        }
    }

    /// Backend failure without a usable HTTP status.
    pub fn platform(message: impl Into<String>) -> Self {
        Error::PlatformError {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status the REST facade reports for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::CapabilityNotSupported { .. } => 501,
            Error::InvalidArgument(_) => 400,
            Error::Unauthenticated(_) => 401,
            Error::PermissionDenied(_) => 403,
            Error::NotFound { .. } => 404,
            Error::ServiceUnavailable(_) => 503,
            Error::Configuration(_) => 500,
            Error::PlatformError { .. } => 502,
            Error::JsonParse(_) | Error::YamlEncode(_) => 502,
        }
    }

    /// Whether the error was raised locally, before any network call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::CapabilityNotSupported { .. }
                | Error::InvalidArgument(_)
                | Error::Configuration(_)
        )
    }
}

/// Result type alias for the adapter layer
pub type Result<T> = std::result::Result<T, Error>;
