//! File content downloads.

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use super::require;
use crate::{Body, EgnyteClient, HttpClient, Method, Request, ResponseEnvelope, Result};

const FILE_CONTENT_PATH: &str = "/pubapi/v1/fs-content/";

/// File system calls, see [`EgnyteClient::files`].
#[derive(Debug)]
pub struct Files<'a, C> {
    client: &'a EgnyteClient<C>,
}

impl<'a, C: HttpClient> Files<'a, C> {
    pub(crate) const fn new(client: &'a EgnyteClient<C>) -> Self {
        Self { client }
    }

    /// Download a file into memory.
    ///
    /// `path` is the file's cloud path, e.g. `/Shared/Documents/report.pdf`.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::InvalidArgument`] if `path` is blank,
    /// before anything is sent.
    pub async fn download(&self, path: &str) -> Result<ResponseEnvelope<Bytes>> {
        self.download_with_cancel(path, &CancellationToken::new())
            .await
    }

    /// [`Files::download`], abandoned when `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`Files::download`], plus [`crate::Error::Cancelled`].
    pub async fn download_with_cancel(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<Bytes>> {
        let request = self.content_request(path)?;
        self.client.dispatcher().send_bytes(request, cancel).await
    }

    /// Download a file as a stream of chunks.
    ///
    /// The call completes once headers arrive; the body is read as the
    /// returned [`Body`] is polled.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::InvalidArgument`] if `path` is blank,
    /// before anything is sent.
    pub async fn download_stream(&self, path: &str) -> Result<ResponseEnvelope<Body>> {
        self.download_stream_with_cancel(path, &CancellationToken::new())
            .await
    }

    /// [`Files::download_stream`], abandoned when `cancel` fires.
    ///
    /// Before headers arrive the call itself fails. Afterwards the returned
    /// [`Body`] yields one [`crate::Error::Cancelled`] and ends.
    ///
    /// # Errors
    ///
    /// As [`Files::download_stream`], plus [`crate::Error::Cancelled`].
    pub async fn download_stream_with_cancel(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<Body>> {
        let request = self.content_request(path)?;
        self.client.dispatcher().send_stream(request, cancel).await
    }

    fn content_request(&self, path: &str) -> Result<Request<Bytes>> {
        let path = require("path", path)?;
        let resource = format!("{FILE_CONTENT_PATH}{}", path.trim_start_matches('/'));
        let url = self.client.url::<&str, &str>(&resource, &[])?;

        Ok(Request::builder(Method::Get, url).build())
    }
}
