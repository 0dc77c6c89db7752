//! Shared value types: header lists, response bodies, and the normalized
//! [`AdapterResponse`].
//!
//! Unlike the request descriptors in [`crate::params`], these types carry data
//! flowing back from the image server. [`AdapterResponse`] enforces the
//! body-xor-error invariant through its constructors.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream, StreamExt};
use serde::Serialize;

use crate::errors::TransportError;

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// An ordered list of HTTP header name/value pairs.
///
/// Insertion order is preserved so that headers are replayed onto the
/// transport in the order the caller gave them. Name lookup is
/// case-insensitive; inserting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Creates an empty header list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the list with `name` set to `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name` to `value`, replacing any existing value for that name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .0
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Returns the value for `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no header is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

// ---------------------------------------------------------------------------
// Response body
// ---------------------------------------------------------------------------

/// Boxed chunk stream backing a [`ResponseBody`].
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A lazily-read response body.
///
/// The body owns the underlying connection resource; dropping it (on any path,
/// including error paths) releases that resource.
///
/// Chunks are read after [`crate::IiifAdapter::call`] has already returned, so a
/// failure while reading them (connection reset, timeout mid-body) is not an
/// [`crate::AdapterError`]. It surfaces from [`ResponseBody::bytes`] or from the
/// stream itself as a bare [`TransportError::Body`].
pub struct ResponseBody {
    stream: BodyStream,
}

impl ResponseBody {
    /// Wraps a chunk stream produced by a transport.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
        }
    }

    /// Creates an in-memory body holding `bytes`.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::from_stream(stream::iter(std::iter::once(Ok(bytes))))
    }

    /// Creates a body with no content.
    pub fn empty() -> Self {
        Self::from_stream(stream::empty())
    }

    /// Reads the whole body into memory.
    pub async fn bytes(mut self) -> Result<Bytes, TransportError> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    /// Returns the underlying chunk stream.
    pub fn into_stream(self) -> BodyStream {
        self.stream
    }
}

impl Stream for ResponseBody {
    type Item = Result<Bytes, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().stream.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Adapter response
// ---------------------------------------------------------------------------

/// The normalized result of one adapter call.
///
/// A successful response carries a body and no error message. Every other
/// status carries an error message naming the resource and the cause class.
/// The only non-success response with a body is a 404 classified under
/// [`crate::NotFoundPolicy::FallbackBody`].
#[derive(Debug)]
pub struct AdapterResponse {
    status: u16,
    headers: Headers,
    body: Option<ResponseBody>,
    error_message: Option<String>,
}

impl AdapterResponse {
    /// Creates a successful response.
    pub fn success(status: u16, headers: Headers, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body: Some(body),
            error_message: None,
        }
    }

    /// Creates a failed response with no body.
    pub fn failure(status: u16, headers: Headers, error_message: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: None,
            error_message: Some(error_message.into()),
        }
    }

    /// Creates a failed response that still carries a synthesized body.
    pub(crate) fn failure_with_body(
        status: u16,
        headers: Headers,
        body: ResponseBody,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            headers,
            body: Some(body),
            error_message: Some(error_message.into()),
        }
    }

    /// HTTP status code returned by the image server.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers returned by the image server.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The response body, if any.
    pub fn body(&self) -> Option<&ResponseBody> {
        self.body.as_ref()
    }

    /// The human-readable error message for non-success responses.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns `true` if the server answered with the success status.
    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }

    /// Takes ownership of the body.
    pub fn into_body(self) -> Option<ResponseBody> {
        self.body
    }

    /// Splits the response into status, headers, body and error message.
    pub fn into_parts(self) -> (u16, Headers, Option<ResponseBody>, Option<String>) {
        (self.status, self.headers, self.body, self.error_message)
    }
}
