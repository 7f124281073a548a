//! HTTP response handling.
//!
//! - [`Body`] - a response body read lazily, chunk by chunk
//! - [`Response`] - status, headers and body as seen by the transport chain
//! - [`ResponseEnvelope`] - the decoded payload handed back to callers
//!
//! Headers are kept in an [`http::HeaderMap`]: insertion ordered,
//! multi-valued and case-insensitive.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::{StreamExt, stream};
use http::HeaderMap;

// ============================================================================
// Body
// ============================================================================

/// Boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send>>;

/// A response body, consumed as a stream of chunks.
///
/// The transport hands bodies over as soon as headers arrive, so large
/// downloads never have to sit in memory. Use [`Body::collect`] to buffer.
pub struct Body {
    stream: BodyStream,
}

impl Body {
    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_stream(stream::empty())
    }

    /// Wrap a stream of chunks.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = crate::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
        }
    }

    /// Read the whole body into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if reading any chunk fails.
    pub async fn collect(self) -> crate::Result<Bytes> {
        let mut stream = self.stream;
        let mut collected = BytesMut::new();

        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk?);
        }

        Ok(collected.freeze())
    }

    /// Consume into the underlying chunk stream.
    #[must_use]
    pub fn into_stream(self) -> BodyStream {
        self.stream
    }
}

impl Stream for Body {
    type Item = crate::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        Self::from_stream(stream::once(async move { Ok(bytes) }))
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from(Bytes::from_static(text.as_bytes()))
    }
}

// ============================================================================
// Response
// ============================================================================

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone)]
pub struct Response<B = Body> {
    status: u16,
    headers: HeaderMap,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// Declared `Content-Type`, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, HeaderMap, B) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Transform the body with a function.
    pub fn map_body<F, B2>(self, f: F) -> Response<B2>
    where
        F: FnOnce(B) -> B2,
    {
        Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
        }
    }
}

impl Response<Body> {
    /// Buffer the streamed body.
    ///
    /// # Errors
    ///
    /// Returns an error if reading any chunk fails.
    pub async fn collect(self) -> crate::Result<Response<Bytes>> {
        let body = self.body.collect().await?;
        Ok(Response {
            status: self.status,
            headers: self.headers,
            body,
        })
    }
}

impl Response<Bytes> {
    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::Error::Api`] carrying the raw body if
    /// deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> crate::Result<T> {
        crate::from_json(&self.body)
            .map_err(|cause| crate::Error::undecodable(self.status, self.body.clone(), cause))
    }

    /// Get the response body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }
}

// ============================================================================
// Response Envelope
// ============================================================================

/// A successful call: the decoded payload plus the response headers.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<T> {
    status: u16,
    headers: HeaderMap,
    payload: T,
}

impl<T> ResponseEnvelope<T> {
    /// Creates a new envelope.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, payload: T) -> Self {
        Self {
            status,
            headers,
            payload,
        }
    }

    /// HTTP status code of the successful response.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// Decoded payload.
    #[must_use]
    pub const fn payload(&self) -> &T {
        &self.payload
    }

    /// Consume into the payload, dropping headers.
    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Consume into (payload, headers).
    #[must_use]
    pub fn into_parts(self) -> (T, HeaderMap) {
        (self.payload, self.headers)
    }

    /// Transform the payload, keeping status and headers.
    pub fn map<F, U>(self, f: F) -> ResponseEnvelope<U>
    where
        F: FnOnce(T) -> U,
    {
        ResponseEnvelope {
            status: self.status,
            headers: self.headers,
            payload: f(self.payload),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    #[test]
    fn response_basic() {
        let response = Response::new(200, json_headers(), Bytes::from(r#"{"id":1}"#));

        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.content_type(), Some("application/json"));
        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
    }

    #[test]
    fn response_status_checks() {
        let response = Response::new(403, HeaderMap::new(), Bytes::new());
        assert!(response.is_client_error());

        let response = Response::new(503, HeaderMap::new(), Bytes::new());
        assert!(response.is_server_error());
    }

    #[test]
    fn response_json_failure_carries_raw_body() {
        #[derive(Debug, serde::Deserialize)]
        struct FileLock {
            #[allow(dead_code)]
            timeout: u64,
        }

        let response = Response::new(200, json_headers(), Bytes::from("not json"));
        let err = response.json::<FileLock>().expect_err("should fail");

        assert_eq!(err.status(), Some(200));
        assert_eq!(err.message(), Some("not json"));
    }

    #[test]
    fn response_text() {
        let response = Response::new(200, HeaderMap::new(), Bytes::from("token"));
        assert_eq!(response.text().expect("text"), "token");
    }

    #[tokio::test]
    async fn body_collects_chunks_in_order() {
        let chunks = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let body = Body::from_stream(stream::iter(chunks));

        let bytes = body.collect().await.expect("collect");
        assert_eq!(bytes.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn body_collect_propagates_chunk_error() {
        let chunks = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(crate::Error::connection("reset")),
        ];
        let body = Body::from_stream(stream::iter(chunks));

        let err = body.collect().await.expect_err("should fail");
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn response_collect_keeps_headers() {
        let response = Response::new(200, json_headers(), Body::from("{}"));
        let collected = response.collect().await.expect("collect");

        assert_eq!(collected.content_type(), Some("application/json"));
        assert_eq!(collected.body().as_ref(), b"{}");
    }

    #[test]
    fn envelope_keeps_multi_valued_headers() {
        let mut headers = HeaderMap::new();
        headers.append("x-trace", HeaderValue::from_static("a"));
        headers.append("X-Trace", HeaderValue::from_static("b"));

        let envelope = ResponseEnvelope::new(200, headers, 5_u32);
        let values: Vec<_> = envelope.headers().get_all("x-trace").iter().collect();

        assert_eq!(values, ["a", "b"]);
        assert_eq!(envelope.header("X-TRACE"), Some("a"));
        assert_eq!(*envelope.payload(), 5);
    }

    #[test]
    fn envelope_map() {
        let envelope = ResponseEnvelope::new(201, HeaderMap::new(), "42".to_string());
        let mapped = envelope.map(|s| s.len());

        assert_eq!(mapped.status(), 201);
        assert_eq!(mapped.into_payload(), 2);
    }
}
