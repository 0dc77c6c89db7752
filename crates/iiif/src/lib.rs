//! Outbound adapter for IIIF image servers.
//!
//! Callers describe what they want (a pass-through IIIF request, a structured
//! image request, or an image information request) and receive a normalized
//! [`AdapterResponse`]. They never build URLs or inspect raw status codes.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! The HTTP client is reached through the [`HttpTransport`] port; the
//! `transport` crate supplies the reqwest-backed implementation.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`params`] | Request descriptors and URL building |
//! | [`classify`] | Status classification, not-found policy, body encoders |
//! | [`adapter`] | [`IiifAdapter`] orchestration |
//! | [`transport`] | The [`HttpTransport`] port |
//! | [`types`] | [`Headers`], [`ResponseBody`], [`AdapterResponse`] |
//! | [`errors`] | [`AdapterError`] and its causes |
//! | [`identifiers`] | [`CallId`] |
//!
//! ## Error surface
//!
//! HTTP-level outcomes are values: a 404 or a 500 comes back as `Ok` with
//! [`AdapterResponse::error_message`] set. `Err(AdapterError)` means the call
//! itself failed (transport or encoding), with the original cause attached.

pub mod adapter;
pub mod classify;
pub mod errors;
pub mod identifiers;
pub mod params;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use adapter::IiifAdapter;
pub use classify::{
    classify, BodyEncoder, Charset, NotFoundPolicy, HTTP_NOT_FOUND, HTTP_OK,
    NOT_FOUND_FALLBACK_TEXT,
};
pub use errors::{AdapterError, BoxError, EncodingError, FailureCause, TransportError};
pub use identifiers::CallId;
pub use params::{
    IiifImageParameters, IiifInfoParameters, IiifParameters, RequestDescriptor, IMAGE_ACCEPT,
    INFO_ACCEPT,
};
pub use transport::{HttpTransport, TransportRequest, TransportResponse};
pub use types::{AdapterResponse, BodyStream, Headers, ResponseBody};
