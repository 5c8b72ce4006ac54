//! HTTP access to the d:swarm APIs
//!
//! One [`ApiClient`] per API base URI. Every call either yields a 2xx response
//! or fails; nothing is retried.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, TRANSFER_ENCODING};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method, RequestBuilder};
use tokio_util::io::ReaderStream;

use crate::config::HttpConfig;
use crate::{CoreError, Result};

const APPLICATION_JSON: &str = "application/json";
const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Name of the multipart part carrying the request envelope
pub const METADATA_PART: &str = "metadata";
/// Name of the multipart part carrying the raw content
pub const CONTENT_PART: &str = "content";

/// Status and body of a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Exactly HTTP 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Turn any non-2xx response into a [`CoreError::RemoteCall`].
    pub fn into_success(self, method: &Method, url: &str) -> Result<Self> {
        if (200..300).contains(&self.status) {
            return Ok(self);
        }
        tracing::error!(
            "{} {} failed (got response status = '{}')",
            method,
            url,
            self.status
        );
        Err(CoreError::RemoteCall {
            method: method.to_string(),
            url: url.to_string(),
            status: self.status,
            body: self.body,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_uri: String,
    chunk_size: usize,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_uri: impl Into<String>, config: &HttpConfig) -> Result<Self> {
        let base_uri = base_uri.into();
        let timeout = Duration::from_millis(config.request_timeout_ms);

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CoreError::configuration(base_uri.clone(), "http", "a usable HTTP client", e)
            })?;

        Ok(Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            chunk_size: config.chunk_size.max(1),
            client,
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Absolute URL of `path` below the base URI.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_uri, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse> {
        let url = self.url(path);
        let request = self.client.get(&url).query(query);
        self.send(Method::GET, url, request).await
    }

    /// POST a JSON document. Bodies above the chunk size are streamed.
    pub async fn post_json(&self, path: &str, body: String) -> Result<ApiResponse> {
        let url = self.url(path);
        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(self.body(body));
        self.send(Method::POST, url, request).await
    }

    /// POST a two-part multipart request: the JSON `envelope`, then the file at
    /// `content` streamed as an octet stream.
    pub async fn post_multipart(
        &self,
        path: &str,
        envelope: String,
        content: &Path,
    ) -> Result<ApiResponse> {
        let url = self.url(path);

        let file = tokio::fs::File::open(content)
            .await
            .map_err(|e| CoreError::io("open", content, e))?;
        let stream = ReaderStream::with_capacity(file, self.chunk_size);

        let metadata = Part::text(envelope)
            .mime_str(APPLICATION_JSON)
            .map_err(|cause| transport_error(&Method::POST, &url, cause))?;
        let payload = Part::stream(Body::wrap_stream(stream))
            .mime_str(APPLICATION_OCTET_STREAM)
            .map_err(|cause| transport_error(&Method::POST, &url, cause))?;
        let form = Form::new()
            .part(METADATA_PART, metadata)
            .part(CONTENT_PART, payload);

        let request = self
            .client
            .post(&url)
            .header(TRANSFER_ENCODING, "chunked")
            .multipart(form);
        self.send(Method::POST, url, request).await
    }

    fn body(&self, body: String) -> Body {
        if body.len() <= self.chunk_size {
            return Body::from(body);
        }

        let chunks: Vec<Vec<u8>> = body
            .as_bytes()
            .chunks(self.chunk_size)
            .map(<[u8]>::to_vec)
            .collect();
        Body::wrap_stream(futures::stream::iter(
            chunks.into_iter().map(Ok::<_, std::io::Error>),
        ))
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        request: RequestBuilder,
    ) -> Result<ApiResponse> {
        let response = request
            .header(ACCEPT, APPLICATION_JSON)
            .send()
            .await
            .map_err(|cause| transport_error(&method, &url, cause))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|cause| transport_error(&method, &url, cause))?;

        let response = ApiResponse {
            status: status.as_u16(),
            body,
        }
        .into_success(&method, &url)?;

        tracing::debug!("got a {} for {} {}", response.status, method, url);
        Ok(response)
    }
}

fn transport_error(method: &Method, url: &str, cause: reqwest::Error) -> CoreError {
    tracing::error!("{} {} could not be completed: {}", method, url, cause);
    CoreError::Transport {
        method: method.to_string(),
        url: url.to_string(),
        cause,
    }
}
