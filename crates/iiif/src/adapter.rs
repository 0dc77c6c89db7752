//! The IIIF adapter: build → send → classify.
//!
//! [`IiifAdapter`] owns the image server base URL, the transport, and the
//! not-found policy. None of these change after construction, so one adapter
//! can serve any number of concurrent callers without locking.
//!
//! Every call issues exactly one outbound request. There are no retries and
//! no partial results: either the classified response is returned, or a
//! single [`AdapterError`] wrapping the original failure.

use tracing::{debug, error, instrument, warn, Span};

use crate::classify::{classify, NotFoundPolicy};
use crate::errors::{AdapterError, FailureCause};
use crate::identifiers::CallId;
use crate::params::{IiifImageParameters, IiifInfoParameters, IiifParameters, RequestDescriptor};
use crate::transport::HttpTransport;
use crate::types::AdapterResponse;

/// Outbound adapter for a IIIF image server.
#[derive(Debug)]
pub struct IiifAdapter<T> {
    iiif_server_url: String,
    transport: T,
    not_found_policy: NotFoundPolicy,
}

impl<T> IiifAdapter<T>
where
    T: HttpTransport,
{
    /// Creates an adapter for the server at `iiif_server_url`, using the
    /// default [`NotFoundPolicy::ErrorOnly`].
    pub fn new(iiif_server_url: impl Into<String>, transport: T) -> Self {
        Self {
            iiif_server_url: iiif_server_url.into(),
            transport,
            not_found_policy: NotFoundPolicy::default(),
        }
    }

    /// Replaces the not-found policy.
    #[must_use]
    pub fn with_not_found_policy(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found_policy = policy;
        self
    }

    /// The image server base URL.
    pub fn iiif_server_url(&self) -> &str {
        &self.iiif_server_url
    }

    /// The transport used for outbound calls.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The active not-found policy.
    pub fn not_found_policy(&self) -> &NotFoundPolicy {
        &self.not_found_policy
    }

    /// Executes the request described by `descriptor`.
    ///
    /// HTTP-level outcomes (404, 5xx, ...) are returned as `Ok`; inspect
    /// [`AdapterResponse::error_message`]. `Err` means the call itself failed.
    #[instrument(
        name = "iiif_call",
        skip_all,
        fields(
            call_id = %CallId::new_random(),
            method = tracing::field::Empty,
            url = tracing::field::Empty,
        )
    )]
    pub async fn call(
        &self,
        descriptor: &dyn RequestDescriptor,
    ) -> Result<AdapterResponse, AdapterError> {
        match self.try_call(descriptor).await {
            Ok(response) => {
                match response.error_message() {
                    None => debug!(status = response.status(), "Image server call succeeded"),
                    Some(message) => warn!(
                        status = response.status(),
                        error_message = message,
                        "Image server answered with an error status"
                    ),
                }
                Ok(response)
            }
            Err(cause) => {
                let err = AdapterError::new(descriptor.failure_message(), cause);
                error!(error = %err, cause = %err.cause(), "Image server call failed");
                Err(err)
            }
        }
    }

    async fn try_call(
        &self,
        descriptor: &dyn RequestDescriptor,
    ) -> Result<AdapterResponse, FailureCause> {
        let request = descriptor.build_request(&self.iiif_server_url);
        let span = Span::current();
        span.record("method", request.method.as_str());
        span.record("url", request.url.as_str());
        debug!("Dispatching request to image server");

        let response = self.transport.send(request).await?;
        let classified = classify(response, descriptor, &self.not_found_policy)?;
        Ok(classified)
    }

    /// Forwards an arbitrary IIIF request.
    pub async fn call_iiif_server(
        &self,
        parameters: &IiifParameters,
    ) -> Result<AdapterResponse, AdapterError> {
        self.call(parameters).await
    }

    /// Requests an image region/size/rotation/quality/format.
    pub async fn request_image(
        &self,
        parameters: &IiifImageParameters,
    ) -> Result<AdapterResponse, AdapterError> {
        self.call(parameters).await
    }

    /// Requests the image information document for an identifier.
    pub async fn request_information(
        &self,
        data_divider: &str,
        identifier: &str,
    ) -> Result<AdapterResponse, AdapterError> {
        self.call(&IiifInfoParameters::new(data_divider, identifier))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::classify::{Charset, NOT_FOUND_FALLBACK_TEXT};
    use crate::errors::{EncodingError, TransportError};
    use crate::params::IMAGE_ACCEPT;
    use crate::transport::{TransportRequest, TransportResponse};
    use crate::types::{Headers, ResponseBody};

    const IIIF_SERVER_URL: &str = "someIiifServerUrl";
    const SOME_METHOD: &str = "someMethod";
    const SOME_URI: &str = "someUri";

    type Script = Box<dyn Fn() -> Result<TransportResponse, TransportError> + Send + Sync>;

    /// Records every request and answers from a script.
    struct TransportSpy {
        requests: Mutex<Vec<TransportRequest>>,
        script: Script,
    }

    impl TransportSpy {
        fn answering(status: u16, body: &'static [u8]) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                script: Box::new(move || {
                    Ok(TransportResponse {
                        status,
                        headers: Headers::new().with("someResponseHeader", "someValue"),
                        body: ResponseBody::from_bytes(Bytes::from_static(body)),
                    })
                }),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                script: Box::new(move || {
                    Err(TransportError::Request {
                        url: "irrelevant".to_string(),
                        source: message.into(),
                    })
                }),
            }
        }

        fn requests(&self) -> Vec<TransportRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for TransportSpy {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            (self.script)()
        }
    }

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

    fn generic_parameters() -> IiifParameters {
        IiifParameters::new(
            SOME_URI,
            SOME_METHOD,
            Headers::new()
                .with("someHeader", "someValue1, someValue2")
                .with("someOtherHeader", "someOtherValue1"),
        )
    }

    #[test]
    fn adapter_keeps_its_construction_arguments() {
        let adapter = IiifAdapter::new(IIIF_SERVER_URL, TransportSpy::answering(200, b""));

        assert_eq!(adapter.iiif_server_url(), IIIF_SERVER_URL);
        assert!(adapter.transport().requests().is_empty());
        assert!(matches!(adapter.not_found_policy(), NotFoundPolicy::ErrorOnly));
    }

    #[tokio::test]
    async fn generic_request_forwards_url_method_and_headers() {
        let adapter = IiifAdapter::new("someIiifServerUrl/", TransportSpy::answering(200, b"b1"));

        let response = adapter.call_iiif_server(&generic_parameters()).await.unwrap();

        let requests = adapter.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "someIiifServerUrl/someUri");
        assert_eq!(requests[0].method, SOME_METHOD);
        let headers: Vec<_> = requests[0].headers.iter().collect();
        assert_eq!(
            headers,
            vec![
                ("someHeader", "someValue1, someValue2"),
                ("someOtherHeader", "someOtherValue1"),
            ]
        );

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("someResponseHeader"), Some("someValue"));
        assert!(response.error_message().is_none());
        let body = response.into_body().unwrap().bytes().await.unwrap();
        assert_eq!(body, Bytes::from_static(b"b1"));
    }

    #[tokio::test]
    async fn image_request_builds_iiif_url_with_fixed_accept() {
        let adapter = IiifAdapter::new(IIIF_SERVER_URL, TransportSpy::answering(200, b"img"));

        let response = adapter.request_image(&image_parameters()).await.unwrap();

        let request = &adapter.transport().requests()[0];
        assert_eq!(
            request.url,
            "someIiifServerUrl/someDataDivider/someIdentifier/someRegion/someSize/someRotation/someQuality.someFormat"
        );
        assert_eq!(request.method, "GET");
        assert_eq!(request.headers, Headers::new().with("Accept", IMAGE_ACCEPT));
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn image_not_found_returns_error_message_without_body() {
        let adapter = IiifAdapter::new(IIIF_SERVER_URL, TransportSpy::answering(404, b""));

        let response = adapter.request_image(&image_parameters()).await.unwrap();

        assert_eq!(response.status(), 404);
        assert_eq!(response.headers().get("someResponseHeader"), Some("someValue"));
        assert!(response.body().is_none());
        assert_eq!(
            response.error_message(),
            Some("Image with id: someIdentifier, could not be found.")
        );
    }

    #[tokio::test]
    async fn image_other_statuses_return_not_retrieved() {
        for status in [418, 500] {
            let adapter = IiifAdapter::new(IIIF_SERVER_URL, TransportSpy::answering(status, b""));

            let response = adapter.request_image(&image_parameters()).await.unwrap();

            assert_eq!(response.status(), status);
            assert!(response.body().is_none());
            assert_eq!(
                response.error_message(),
                Some("Image with id: someIdentifier, could not be retrieved")
            );
        }
    }

    #[tokio::test]
    async fn generic_not_found_mentions_the_uri() {
        let adapter = IiifAdapter::new("srv/", TransportSpy::answering(404, b""));
        let params = IiifParameters::new("x", "GET", Headers::new());

        let response = adapter.call_iiif_server(&params).await.unwrap();

        assert_eq!(adapter.transport().requests()[0].url, "srv/x");
        assert_eq!(response.status(), 404);
        assert!(response.body().is_none());
        assert!(response.error_message().unwrap().contains("x"));
    }

    #[tokio::test]
    async fn generic_not_found_with_fallback_body() {
        let adapter = IiifAdapter::new("someIiifServerUrl/", TransportSpy::answering(404, b""))
            .with_not_found_policy(NotFoundPolicy::fallback_body(Charset::Utf8));

        let response = adapter.call_iiif_server(&generic_parameters()).await.unwrap();

        assert_eq!(response.status(), 404);
        assert_eq!(
            response.error_message(),
            Some("Resource with uri: someUri, could not be found.")
        );
        let body = response.into_body().unwrap().bytes().await.unwrap();
        assert_eq!(body, Bytes::from_static(NOT_FOUND_FALLBACK_TEXT.as_bytes()));
    }

    #[tokio::test]
    async fn encoding_failure_is_wrapped_in_adapter_error() {
        let failing = |_: &str| -> Result<Bytes, EncodingError> {
            Err(EncodingError::Unsupported {
                encoding: "someUnsupportedEncodingException".to_string(),
            })
        };
        let adapter = IiifAdapter::new("someIiifServerUrl/", TransportSpy::answering(404, b""))
            .with_not_found_policy(NotFoundPolicy::fallback_body(failing));

        let err = adapter
            .call_iiif_server(&generic_parameters())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error while calling iiifServer using method: someMethod, and URI: someUri"
        );
        assert_eq!(
            err.source().unwrap().to_string(),
            "Unsupported encoding someUnsupportedEncodingException"
        );
        assert!(matches!(err.cause(), FailureCause::Encoding(_)));
    }

    #[tokio::test]
    async fn generic_transport_failure_is_wrapped_with_method_and_uri() {
        let adapter = IiifAdapter::new("someIiifServerUrl/", TransportSpy::failing("network down"));

        let err = adapter
            .call_iiif_server(&generic_parameters())
            .await
            .unwrap_err();

        assert_eq!(
            err.message(),
            "Error while calling iiifServer using method: someMethod, and URI: someUri"
        );
        match err.into_cause() {
            FailureCause::Transport(TransportError::Request { source, .. }) => {
                assert_eq!(source.to_string(), "network down");
            }
            other => panic!("unexpected cause: {other:?}"),
        }
    }

    #[tokio::test]
    async fn image_transport_failure_is_wrapped_with_identifier() {
        let adapter = IiifAdapter::new(IIIF_SERVER_URL, TransportSpy::failing("timeout"));

        let err = adapter.request_image(&image_parameters()).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error while requesting an image from server with id: someIdentifier"
        );
        assert!(matches!(
            err.cause(),
            FailureCause::Transport(TransportError::Request { .. })
        ));
        assert_eq!(adapter.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn body_read_failure_surfaces_from_the_body_not_the_call() {
        let spy = TransportSpy {
            requests: Mutex::new(Vec::new()),
            script: Box::new(|| {
                Ok(TransportResponse {
                    status: 200,
                    headers: Headers::new(),
                    body: ResponseBody::from_stream(futures_util::stream::iter(vec![
                        Ok(Bytes::from_static(b"some")),
                        Err(TransportError::Body {
                            source: "connection reset".into(),
                        }),
                    ])),
                })
            }),
        };
        let adapter = IiifAdapter::new(IIIF_SERVER_URL, spy);

        let response = adapter.request_image(&image_parameters()).await.unwrap();

        assert!(response.is_success());
        let body = response.into_body().expect("success carries a body");
        assert!(matches!(
            body.bytes().await,
            Err(TransportError::Body { .. })
        ));
    }

    #[tokio::test]
    async fn information_request_targets_info_json() {
        let adapter = IiifAdapter::new(IIIF_SERVER_URL, TransportSpy::answering(200, b"{}"));

        let response = adapter
            .request_information("someDataDivider", "someIdentifier")
            .await
            .unwrap();

        assert_eq!(
            adapter.transport().requests()[0].url,
            "someIiifServerUrl/someDataDivider/someIdentifier/info.json"
        );
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn transport_can_be_injected_as_a_trait_object() {
        let spy = Arc::new(TransportSpy::answering(200, b"b1"));
        let transport: Arc<dyn HttpTransport> = spy.clone();
        let adapter = IiifAdapter::new(IIIF_SERVER_URL, transport);

        adapter.request_image(&image_parameters()).await.unwrap();

        assert_eq!(spy.requests().len(), 1);
    }

    #[tokio::test]
    async fn adapter_is_shareable_across_tasks() {
        let adapter = Arc::new(IiifAdapter::new(
            IIIF_SERVER_URL,
            TransportSpy::answering(200, b"b1"),
        ));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let adapter = Arc::clone(&adapter);
                tokio::spawn(async move {
                    adapter
                        .request_image(&image_parameters())
                        .await
                        .map(|r| r.status())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 200);
        }
        assert_eq!(adapter.transport().requests().len(), 4);
    }
}
