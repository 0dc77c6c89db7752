//! Request descriptors: what the caller wants fetched.
//!
//! Every request form implements [`RequestDescriptor`], which is all the
//! adapter needs: how to build the outbound request from the server base URL,
//! and how to phrase the messages for not-found, other HTTP errors, and call
//! failures. Adding a new form never touches the adapter.
//!
//! The builders are pure string concatenation. No escaping and no IIIF
//! validation is performed; tokens are trusted as given.

use crate::transport::TransportRequest;
use crate::types::Headers;

/// `Accept` header sent with every structured image request.
///
/// Image requests always send this single header. Caller-supplied headers are
/// not part of [`IiifImageParameters`]; use [`IiifParameters`] to forward
/// arbitrary headers.
pub const IMAGE_ACCEPT: &str = "image/avif,image/webp,*/*";

/// `Accept` header sent with image information requests.
pub const INFO_ACCEPT: &str = "application/ld+json,application/json";

/// Capability shared by all request forms.
pub trait RequestDescriptor: Send + Sync {
    /// Builds the URL, method and headers for this request against `base_url`.
    fn build_request(&self, base_url: &str) -> TransportRequest;

    /// Message used when the server answers 404.
    fn not_found_message(&self) -> String;

    /// Message used for any other non-success status.
    fn not_retrieved_message(&self) -> String;

    /// Message of the [`crate::AdapterError`] raised when the call itself fails.
    fn failure_message(&self) -> String;
}

// ---------------------------------------------------------------------------
// Generic pass-through form
// ---------------------------------------------------------------------------

/// An arbitrary IIIF request forwarded as-is.
///
/// The URI is appended to the server base URL without a separator; method and
/// headers reach the transport verbatim, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IiifParameters {
    uri: String,
    method: String,
    headers: Headers,
}

impl IiifParameters {
    /// Creates pass-through parameters.
    pub fn new(uri: impl Into<String>, method: impl Into<String>, headers: Headers) -> Self {
        Self {
            uri: uri.into(),
            method: method.into(),
            headers,
        }
    }

    /// Path fragment appended to the base URL.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

impl RequestDescriptor for IiifParameters {
    fn build_request(&self, base_url: &str) -> TransportRequest {
        TransportRequest {
            url: format!("{base_url}{}", self.uri),
            method: self.method.clone(),
            headers: self.headers.clone(),
        }
    }

    fn not_found_message(&self) -> String {
        format!("Resource with uri: {}, could not be found.", self.uri)
    }

    fn not_retrieved_message(&self) -> String {
        format!("Resource with uri: {}, could not be retrieved", self.uri)
    }

    fn failure_message(&self) -> String {
        format!(
            "Error while calling iiifServer using method: {}, and URI: {}",
            self.method, self.uri
        )
    }
}

// ---------------------------------------------------------------------------
// Structured image form
// ---------------------------------------------------------------------------

/// A structured IIIF image request.
///
/// Builds `{base}/{data_divider}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IiifImageParameters {
    data_divider: String,
    identifier: String,
    region: String,
    size: String,
    rotation: String,
    quality: String,
    format: String,
}

impl IiifImageParameters {
    /// Creates structured image parameters.
    pub fn new(
        data_divider: impl Into<String>,
        identifier: impl Into<String>,
        region: impl Into<String>,
        size: impl Into<String>,
        rotation: impl Into<String>,
        quality: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            data_divider: data_divider.into(),
            identifier: identifier.into(),
            region: region.into(),
            size: size.into(),
            rotation: rotation.into(),
            quality: quality.into(),
            format: format.into(),
        }
    }

    pub fn data_divider(&self) -> &str {
        &self.data_divider
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn rotation(&self) -> &str {
        &self.rotation
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

impl RequestDescriptor for IiifImageParameters {
    fn build_request(&self, base_url: &str) -> TransportRequest {
        TransportRequest {
            url: format!(
                "{base_url}/{}/{}/{}/{}/{}/{}.{}",
                self.data_divider,
                self.identifier,
                self.region,
                self.size,
                self.rotation,
                self.quality,
                self.format
            ),
            method: "GET".to_string(),
            headers: Headers::new().with("Accept", IMAGE_ACCEPT),
        }
    }

    fn not_found_message(&self) -> String {
        format!("Image with id: {}, could not be found.", self.identifier)
    }

    fn not_retrieved_message(&self) -> String {
        format!("Image with id: {}, could not be retrieved", self.identifier)
    }

    fn failure_message(&self) -> String {
        format!(
            "Error while requesting an image from server with id: {}",
            self.identifier
        )
    }
}

// ---------------------------------------------------------------------------
// Image information form
// ---------------------------------------------------------------------------

/// A request for the IIIF image information document (`info.json`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IiifInfoParameters {
    data_divider: String,
    identifier: String,
}

impl IiifInfoParameters {
    /// Creates image information parameters.
    pub fn new(data_divider: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            data_divider: data_divider.into(),
            identifier: identifier.into(),
        }
    }

    pub fn data_divider(&self) -> &str {
        &self.data_divider
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl RequestDescriptor for IiifInfoParameters {
    fn build_request(&self, base_url: &str) -> TransportRequest {
        TransportRequest {
            url: format!(
                "{base_url}/{}/{}/info.json",
                self.data_divider, self.identifier
            ),
            method: "GET".to_string(),
            headers: Headers::new().with("Accept", INFO_ACCEPT),
        }
    }

    fn not_found_message(&self) -> String {
        format!(
            "Image information with id: {}, could not be found.",
            self.identifier
        )
    }

    fn not_retrieved_message(&self) -> String {
        format!(
            "Image information with id: {}, could not be retrieved",
            self.identifier
        )
    }

    fn failure_message(&self) -> String {
        format!(
            "Error while requesting image information from server with id: {}",
            self.identifier
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_parameters() -> IiifImageParameters {
        IiifImageParameters::new(
            "someDataDivider",
            "someIdentifier",
            "someRegion",
            "someSize",
            "someRotation",
            "someQuality",
            "someFormat",
        )
    }

    #[test]
    fn generic_url_is_base_plus_uri() {
        let params = IiifParameters::new("x", "GET", Headers::new());

        let request = params.build_request("srv/");

        assert_eq!(request.url, "srv/x");
        assert_eq!(request.method, "GET");
        assert!(request.headers.is_empty());
    }

    #[test]
    fn generic_method_and_headers_pass_through_in_order() {
        let headers = Headers::new()
            .with("someHeader", "someValue1, someValue2")
            .with("someOtherHeader", "someOtherValue1");
        let params = IiifParameters::new("someUri", "someMethod", headers.clone());

        let request = params.build_request("someIiifServerUrl/");

        assert_eq!(request.url, "someIiifServerUrl/someUri");
        assert_eq!(request.method, "someMethod");
        assert_eq!(request.headers, headers);
    }

    #[test]
    fn structured_url_concatenates_tokens_positionally() {
        let request = image_parameters().build_request("someIiifServerUrl");

        assert_eq!(
            request.url,
            "someIiifServerUrl/someDataDivider/someIdentifier/someRegion/someSize/someRotation/someQuality.someFormat"
        );
    }

    #[test]
    fn structured_request_forces_get_and_accept() {
        let params = IiifImageParameters::new("d", "i", "r", "s", "0", "q", "jpg");

        let request = params.build_request("srv");

        assert_eq!(request.url, "srv/d/i/r/s/0/q.jpg");
        assert_eq!(request.method, "GET");
        let pairs: Vec<_> = request.headers.iter().collect();
        assert_eq!(pairs, vec![("Accept", "image/avif,image/webp,*/*")]);
    }

    #[test]
    fn empty_base_url_still_builds_a_url() {
        let request = IiifParameters::new("/x", "GET", Headers::new()).build_request("");

        assert_eq!(request.url, "/x");
    }

    #[test]
    fn tokens_are_not_escaped() {
        let params = IiifImageParameters::new("d d", "a/b", "full", "max", "0", "default", "png");

        assert_eq!(
            params.build_request("srv").url,
            "srv/d d/a/b/full/max/0/default.png"
        );
    }

    #[test]
    fn info_request_targets_info_json() {
        let request = IiifInfoParameters::new("d", "i").build_request("srv");

        assert_eq!(request.url, "srv/d/i/info.json");
        assert_eq!(request.method, "GET");
        assert_eq!(request.headers.get("Accept"), Some(INFO_ACCEPT));
    }

    #[test]
    fn image_messages_use_the_identifier() {
        let params = image_parameters();

        assert_eq!(
            params.not_found_message(),
            "Image with id: someIdentifier, could not be found."
        );
        assert_eq!(
            params.not_retrieved_message(),
            "Image with id: someIdentifier, could not be retrieved"
        );
        assert_eq!(
            params.failure_message(),
            "Error while requesting an image from server with id: someIdentifier"
        );
    }

    #[test]
    fn generic_messages_use_method_and_uri() {
        let params = IiifParameters::new("someUri", "someMethod", Headers::new());

        assert_eq!(
            params.not_found_message(),
            "Resource with uri: someUri, could not be found."
        );
        assert_eq!(
            params.not_retrieved_message(),
            "Resource with uri: someUri, could not be retrieved"
        );
        assert_eq!(
            params.failure_message(),
            "Error while calling iiifServer using method: someMethod, and URI: someUri"
        );
    }
}
