//! HTTP client for the question-answering backend

use crate::{
    error::{Error, Result},
    stream::ByteStream,
};
use futures::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time allowed to establish a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of a query request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question, already trimmed
    pub question: String,
    /// Knowledge-base namespace to search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Number of passages the backend should retrieve
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl QueryRequest {
    /// Create a request carrying only a question
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            namespace: None,
            top_k: None,
        }
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Set the retrieval count
    pub fn with_top_k(mut self, top_k: Option<u32>) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Client for a streaming query endpoint
#[derive(Debug, Clone)]
pub struct QueryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl QueryClient {
    /// Create a client with default timeouts
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(endpoint, DEFAULT_CONNECT_TIMEOUT, None)
    }

    /// Create a client with explicit timeouts.
    ///
    /// `timeout` bounds the whole exchange, body included; a request that
    /// runs past it fails mid-stream.
    pub fn with_timeouts(
        endpoint: impl Into<String>,
        connect_timeout: Duration,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "endpoint '{}' must be an http:// or https:// URL",
                endpoint
            )));
        }

        let mut builder = reqwest::Client::builder().connect_timeout(connect_timeout);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    /// The endpoint questions are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a question and return the raw response body as a stream.
    ///
    /// Resolves once response headers arrive. A non-success status, or a
    /// success status that carries no body, is rejected here.
    pub async fn stream(&self, request: &QueryRequest) -> Result<ByteStream> {
        tracing::debug!(
            endpoint = %self.endpoint,
            namespace = ?request.namespace,
            "Dispatching question ({} chars)",
            request.question.chars().count()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/plain, */*")
            .json(request)
            .send()
            .await
            .map_err(Error::transport)?;

        let status = response.status();
        if !status.is_success() || status == StatusCode::NO_CONTENT {
            tracing::warn!("Query endpoint answered {}", status);
            return Err(Error::TransportRejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!("Query endpoint answered {}, streaming body", status);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(body_error));
        Ok(Box::pin(body))
    }
}

fn body_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout(format!("reading response: {}", error))
    } else {
        Error::stream(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamEvent, decode_stream};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn body_text(client: &QueryClient, request: &QueryRequest) -> String {
        let body = client.stream(request).await.expect("stream");
        let events: Vec<StreamEvent> = decode_stream(body).collect().await;
        assert!(matches!(events.last(), Some(StreamEvent::Done)));
        events
            .into_iter()
            .filter_map(|e| match e {
                StreamEvent::Fragment { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_request_omits_unset_options() {
        let json = serde_json::to_value(QueryRequest::new("What is 2+2?")).unwrap();
        assert_eq!(json, serde_json::json!({ "question": "What is 2+2?" }));
    }

    #[test]
    fn test_request_with_options() {
        let request = QueryRequest::new("Can I donate?")
            .with_namespace(Some("Blood Donation".into()))
            .with_top_k(Some(5));
        let json = serde_json::to_value(request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "question": "Can I donate?",
                "namespace": "Blood Donation",
                "top_k": 5
            })
        );
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let err = QueryClient::new("ftp://example.com/query").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_streams_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_json(serde_json::json!({ "question": "What is 2+2?" })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "The answer is 4.\n--- Sources ---\nmath:arith\n",
                "text/plain",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = QueryClient::new(format!("{}/query", server.uri())).unwrap();
        let text = body_text(&client, &QueryRequest::new("What is 2+2?")).await;
        assert_eq!(text, "The answer is 4.\n--- Sources ---\nmath:arith\n");
    }

    #[tokio::test]
    async fn test_sends_namespace_and_top_k() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_json(serde_json::json!({
                "question": "hi",
                "namespace": "Pregnancy",
                "top_k": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw("hello", "text/plain"))
            .expect(1)
            .mount(&server)
            .await;

        let client = QueryClient::new(format!("{}/query", server.uri())).unwrap();
        let request = QueryRequest::new("hi")
            .with_namespace(Some("Pregnancy".into()))
            .with_top_k(Some(3));
        assert_eq!(body_text(&client, &request).await, "hello");
    }

    #[tokio::test]
    async fn test_server_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = QueryClient::new(format!("{}/query", server.uri())).unwrap();
        match client.stream(&QueryRequest::new("q")).await {
            Err(Error::TransportRejected { status }) => assert_eq!(status, 500),
            Err(other) => panic!("expected rejection, got {:?}", other),
            Ok(_) => panic!("expected rejection, got a stream"),
        }
    }

    #[tokio::test]
    async fn test_no_content_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = QueryClient::new(server.uri()).unwrap();
        let err = client.stream(&QueryRequest::new("q")).await.err();
        assert!(matches!(err, Some(Error::TransportRejected { status: 204 })));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("too late", "text/plain")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = QueryClient::with_timeouts(
            server.uri(),
            DEFAULT_CONNECT_TIMEOUT,
            Some(Duration::from_millis(100)),
        )
        .unwrap();

        match client.stream(&QueryRequest::new("q")).await {
            Err(err) => {
                assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);
                assert_eq!(err.kind(), crate::error::ErrorKind::StreamFailure);
                assert!(err.to_string().contains("timed out"));
            }
            Ok(_) => panic!("expected a timeout"),
        }
    }
}
