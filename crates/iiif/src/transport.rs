//! The HTTP transport port.
//!
//! The adapter needs exactly one capability from the outside world: send a
//! request built from a URL, a method and a header list, and hand back the
//! status, the response headers and a lazily-read body. Concrete clients live
//! in infrastructure crates (see the `transport` crate for the reqwest-backed
//! implementation); tests substitute a spy.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::types::{Headers, ResponseBody};

/// A fully built outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Absolute target URL (base URL + path built from the descriptor).
    pub url: String,
    /// HTTP method token, passed through verbatim.
    pub method: String,
    /// Request headers, in the order they must be applied.
    pub headers: Headers,
}

/// What the transport returns once the status line and headers are in.
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers. Repeated headers are joined with `", "`.
    pub headers: Headers,
    /// The body, not yet read.
    pub body: ResponseBody,
}

/// Executes a single HTTP request.
///
/// Implementations must not retry; the adapter issues exactly one call per
/// invocation. Deadlines and cancellation are the implementation's concern.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns once the status and headers are available.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T> HttpTransport for Arc<T>
where
    T: HttpTransport + ?Sized,
{
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}
