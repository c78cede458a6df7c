//! Transport abstraction for dispatching questions

use async_trait::async_trait;
use rill_client::{ByteStream, QueryClient, QueryRequest, Result};

/// Something that can turn a question into a streamed response body.
///
/// Resolves once the response has started; a rejected request is an error
/// here, a failure while reading is an error item inside the stream.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, request: &QueryRequest) -> Result<ByteStream>;
}

/// Transport that posts questions to an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: QueryClient,
}

impl HttpTransport {
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Build a transport for an endpoint with default timeouts
    pub fn for_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self::new(QueryClient::new(endpoint)?))
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &QueryRequest) -> Result<ByteStream> {
        self.client.stream(request).await
    }
}
