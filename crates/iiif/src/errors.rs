//! Error types for the IIIF adapter.
//!
//! HTTP-level outcomes (404, 5xx, ...) are **not** errors: they are returned as
//! ordinary [`crate::AdapterResponse`] values carrying an error message. The
//! types here cover only the conditions where the call itself failed.
//!
//! [`AdapterError`] is the single error surface exposed by
//! [`crate::IiifAdapter`]. It always carries a message identifying the
//! operation and the original cause, reachable through
//! [`std::error::Error::source`].

use thiserror::Error;

/// Boxed error type used to carry transport-specific failures through the port.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

/// Failures raised by an [`crate::HttpTransport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The built URL could not be parsed by the transport.
    ///
    /// The request builder performs no escaping or validation, so this is
    /// where malformed caller input first surfaces.
    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as built from the request parameters.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The HTTP method string is not a valid method token.
    #[error("Invalid HTTP method '{method}'")]
    InvalidMethod {
        /// The method supplied by the caller.
        method: String,
    },

    /// A request header name or value is not valid on the wire.
    #[error("Invalid request header '{name}'")]
    InvalidHeader {
        /// Name of the offending header.
        name: String,
    },

    /// The request could not be completed (connection refused, timeout,
    /// protocol error, ...).
    #[error("Request to '{url}' failed")]
    Request {
        /// The URL the request was sent to.
        url: String,
        /// Underlying client error.
        #[source]
        source: BoxError,
    },

    /// The response body stream failed while it was being read.
    #[error("Failed to read response body")]
    Body {
        /// Underlying client error.
        #[source]
        source: BoxError,
    },
}

// ---------------------------------------------------------------------------
// Encoding failures
// ---------------------------------------------------------------------------

/// Failures raised while encoding the not-found fallback text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The requested text encoding is not known.
    #[error("Unsupported encoding {encoding}")]
    Unsupported {
        /// The encoding name as configured.
        encoding: String,
    },

    /// The encoding is known but cannot represent a character of the text.
    #[error("Unsupported encoding {encoding}: cannot represent {character:?}")]
    Unrepresentable {
        /// Canonical name of the encoding.
        encoding: String,
        /// First character that could not be encoded.
        character: char,
    },
}

// ---------------------------------------------------------------------------
// Adapter boundary
// ---------------------------------------------------------------------------

/// The original failure wrapped by an [`AdapterError`].
///
/// Both variants are transparent: `Display` and `source()` are those of the
/// inner error, unmodified.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The transport failed to execute the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The not-found fallback body could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// The single error type returned by [`crate::IiifAdapter`].
///
/// The message identifies the operation (method and URI for pass-through
/// requests, the identifier for image requests); the cause is the original
/// failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
    #[source]
    cause: FailureCause,
}

impl AdapterError {
    /// Creates an [`AdapterError`] wrapping `cause`.
    pub fn new(message: impl Into<String>, cause: impl Into<FailureCause>) -> Self {
        Self {
            message: message.into(),
            cause: cause.into(),
        }
    }

    /// Returns the operation message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the wrapped cause.
    pub fn cause(&self) -> &FailureCause {
        &self.cause
    }

    /// Consumes the error and returns the wrapped cause.
    pub fn into_cause(self) -> FailureCause {
        self.cause
    }
}
