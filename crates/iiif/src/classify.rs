//! Response classification.
//!
//! Maps the transport's status code onto one of three outcomes:
//!
//! | Status | Outcome | Body | Error message |
//! |--------|---------|------|---------------|
//! | `200` | success | transport body | none |
//! | `404` | not found | none, or fallback text under [`NotFoundPolicy::FallbackBody`] | `not_found_message()` |
//! | other | not retrieved | none | `not_retrieved_message()` |
//!
//! Classification is pure. The only failure it can produce is an
//! [`EncodingError`] from the fallback body encoder.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;

use crate::errors::EncodingError;
use crate::params::RequestDescriptor;
use crate::transport::TransportResponse;
use crate::types::{AdapterResponse, ResponseBody};

/// Status treated as success.
pub const HTTP_OK: u16 = 200;

/// Status treated as not found.
pub const HTTP_NOT_FOUND: u16 = 404;

/// Text placed in the body of a 404 under [`NotFoundPolicy::FallbackBody`].
pub const NOT_FOUND_FALLBACK_TEXT: &str = "Requested identifier could not be found.";

// ---------------------------------------------------------------------------
// Encoding strategy
// ---------------------------------------------------------------------------

/// Turns fallback text into body bytes.
///
/// Implemented by [`Charset`] and by any `Fn(&str) -> Result<Bytes, EncodingError>`,
/// so tests and callers can inject their own behaviour.
pub trait BodyEncoder: Send + Sync {
    /// Encodes `text`.
    fn encode(&self, text: &str) -> Result<Bytes, EncodingError>;
}

impl<F> BodyEncoder for F
where
    F: Fn(&str) -> Result<Bytes, EncodingError> + Send + Sync,
{
    fn encode(&self, text: &str) -> Result<Bytes, EncodingError> {
        self(text)
    }
}

/// Text encodings supported for the fallback body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl Charset {
    /// Canonical name of the encoding.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "US-ASCII",
        }
    }

    fn max_code_point(self) -> u32 {
        match self {
            Charset::Utf8 => u32::from(char::MAX),
            Charset::Latin1 => 0xFF,
            Charset::Ascii => 0x7F,
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" => Ok(Charset::Latin1),
            "us-ascii" | "ascii" => Ok(Charset::Ascii),
            _ => Err(EncodingError::Unsupported {
                encoding: s.to_string(),
            }),
        }
    }
}

impl BodyEncoder for Charset {
    fn encode(&self, text: &str) -> Result<Bytes, EncodingError> {
        if *self == Charset::Utf8 {
            return Ok(Bytes::copy_from_slice(text.as_bytes()));
        }
        let limit = self.max_code_point();
        text.chars()
            .map(|c| {
                u8::try_from(u32::from(c))
                    .ok()
                    .filter(|b| u32::from(*b) <= limit)
                    .ok_or_else(|| EncodingError::Unrepresentable {
                        encoding: self.name().to_string(),
                        character: c,
                    })
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Bytes::from)
    }
}

// ---------------------------------------------------------------------------
// Not-found policy
// ---------------------------------------------------------------------------

/// How a 404 response is shaped.
#[derive(Clone, Default)]
pub enum NotFoundPolicy {
    /// No body; the error message carries the explanation.
    #[default]
    ErrorOnly,
    /// The body is [`NOT_FOUND_FALLBACK_TEXT`] encoded with the given encoder,
    /// for consumers that only look at the body. The error message is still set.
    FallbackBody(Arc<dyn BodyEncoder>),
}

impl NotFoundPolicy {
    /// Fallback body policy using `encoder`.
    pub fn fallback_body(encoder: impl BodyEncoder + 'static) -> Self {
        NotFoundPolicy::FallbackBody(Arc::new(encoder))
    }
}

impl fmt::Debug for NotFoundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundPolicy::ErrorOnly => f.write_str("ErrorOnly"),
            NotFoundPolicy::FallbackBody(_) => f.write_str("FallbackBody(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classifies a transport response for `descriptor`.
///
/// The transport body of a non-success response is dropped, which releases
/// the connection.
pub fn classify(
    response: TransportResponse,
    descriptor: &dyn RequestDescriptor,
    policy: &NotFoundPolicy,
) -> Result<AdapterResponse, EncodingError> {
    let TransportResponse {
        status,
        headers,
        body,
    } = response;

    match status {
        HTTP_OK => Ok(AdapterResponse::success(status, headers, body)),
        HTTP_NOT_FOUND => {
            drop(body);
            let message = descriptor.not_found_message();
            match policy {
                NotFoundPolicy::ErrorOnly => Ok(AdapterResponse::failure(status, headers, message)),
                NotFoundPolicy::FallbackBody(encoder) => {
                    let bytes = encoder.encode(NOT_FOUND_FALLBACK_TEXT)?;
                    Ok(AdapterResponse::failure_with_body(
                        status,
                        headers,
                        ResponseBody::from_bytes(bytes),
                        message,
                    ))
                }
            }
        }
        _ => {
            drop(body);
            Ok(AdapterResponse::failure(
                status,
                headers,
                descriptor.not_retrieved_message(),
            ))
        }
    }
}
