use async_trait::async_trait;
use reqwest::{StatusCode, Url, header};
use tracing::{debug, warn};

use super::error::TransportError;

/// What came back from a single request
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    /// `None` when the status line arrived but the body could not be read
    pub body: Option<Vec<u8>>,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }

    /// A reply whose body was cut short
    pub fn unreadable(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    /// A reply whose body is not needed
    pub fn status_only(status: StatusCode) -> Self {
        Self::new(status, Vec::new())
    }
}

/// The two requests the upload handshake needs
///
/// An `Err` means no response arrived at all. Once a status line is
/// received the call returns `Ok`, whatever happens to the body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`, sending `authorization` as the `Authorization` header if set
    async fn get(
        &self,
        url: &Url,
        authorization: Option<&str>,
    ) -> Result<Reply, TransportError>;

    /// PUT `body` to `url` with the given content type. Only the status matters.
    async fn put(
        &self,
        url: &Url,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<Reply, TransportError>;
}

/// Transport over HTTP(S)
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &Url,
        authorization: Option<&str>,
    ) -> Result<Reply, TransportError> {
        let mut request = self.client.get(url.clone());
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("GET {} -> {}", url.path(), status);

        // Error statuses are classified by status alone
        if !status.is_success() {
            return Ok(Reply::status_only(status));
        }

        match response.bytes().await {
            Ok(body) => Ok(Reply::new(status, body.to_vec())),
            Err(e) => {
                warn!("Failed to read body of GET {}: {}", url.path(), e);
                Ok(Reply::unreadable(status))
            }
        }
    }

    async fn put(
        &self,
        url: &Url,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<Reply, TransportError> {
        let response = self
            .client
            .put(url.clone())
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        debug!("PUT {} -> {}", url.path(), status);
        Ok(Reply::status_only(status))
    }
}
