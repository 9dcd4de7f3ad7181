//! Transport boundary
//!
//! The [`Transport`] trait is an opaque "send bytes, get bytes" capability.
//! [`HttpTransport`] implements it over `reqwest`. Exactly one attempt is
//! made per call; retries are left to the caller.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::error::{InventoryError, Result};
use crate::signer::SignedRequest;

/// Path of the single query endpoint, relative to the base URL
pub const QUERY_PATH: &str = "/query";

/// Response header carrying the server request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Fully-built HTTP POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Whatever came back, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub request_id: Option<String>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// No response was received (DNS, connection, timeout, body read)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Sends one request and returns the raw response
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with a per-request timeout; the client imposes none otherwise
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                InventoryError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body).send().await?;

        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await?.to_vec();

        debug!(status, bytes = body.len(), "Received response");

        Ok(RawResponse {
            status,
            body,
            request_id,
        })
    }
}

/// `{base_url}/query`, tolerating a trailing slash on the base
pub fn endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), QUERY_PATH)
}

/// Attach the signed body and headers to the query endpoint
pub fn build_request(base_url: &str, signed: &SignedRequest) -> TransportRequest {
    TransportRequest {
        url: endpoint(base_url),
        headers: signed.headers(),
        body: signed.body.clone(),
    }
}

/// Issue exactly one POST for a signed command
pub async fn invoke<T: Transport + ?Sized>(
    transport: &T,
    base_url: &str,
    signed: &SignedRequest,
) -> std::result::Result<RawResponse, TransportError> {
    transport.send(build_request(base_url, signed)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::SIGNATURE_HEADER;

    fn signed() -> SignedRequest {
        SignedRequest {
            key_id: "key".to_string(),
            public_key: "pub".to_string(),
            signature: "abc123".to_string(),
            body: br#"["find",{}]"#.to_vec(),
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(endpoint("https://api.example.com"), "https://api.example.com/query");
        assert_eq!(endpoint("https://api.example.com/"), "https://api.example.com/query");
    }

    #[test]
    fn test_build_request_keeps_signed_body_verbatim() {
        let request = build_request("http://localhost:8080", &signed());
        assert_eq!(request.url, "http://localhost:8080/query");
        assert_eq!(request.body, br#"["find",{}]"#.to_vec());
        assert!(
            request
                .headers
                .contains(&(SIGNATURE_HEADER.to_string(), "abc123".to_string()))
        );
    }

    #[tokio::test]
    async fn test_invoke_sends_exactly_once() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| request.url == "http://inventory.local/query")
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, "[]")));

        let response = invoke(&transport, "http://inventory.local", &signed())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }
}
