//! Call logging middleware.
//!
//! Logs one line when a call starts and one when its response headers
//! arrive. Streamed bodies are still unread at that point, so the reported
//! latency is time to headers.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Error, Request, Response, Result};

/// Headers whose values never reach the log.
const REDACTED_HEADERS: &[&str] = &["authorization", "cookie"];

/// Layer that logs calls with `tracing`.
///
/// # Example
///
/// ```ignore
/// use egnyte::middleware::LoggingLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(LoggingLayer::debug())
///     .service(client);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Verbosity of [`LoggingLayer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Method, URL, headers (redacted) and outcome at `debug`.
    Debug,
    /// Method, URL and outcome at `info`.
    #[default]
    Info,
}

impl LoggingLayer {
    /// Log at `info`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log at `debug`, request headers included.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// Configured verbosity.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs calls with `tracing`.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Logging<S> {
    /// Wrap a service, logging at `info`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            level: LogLevel::Info,
        }
    }
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let method = request.method();
        let url = request.url().to_string();
        let level = self.level;

        let span = span!(Level::INFO, "http_request", %method, %url);

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();

                match level {
                    LogLevel::Debug => {
                        debug!(headers = ?redacted_headers(&request), "sending request");
                    }
                    LogLevel::Info => info!("sending request"),
                }

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.is_success() => {
                        info!(status = response.status(), elapsed_ms, "response received");
                    }
                    Ok(response) => {
                        warn!(status = response.status(), elapsed_ms, "error response");
                    }
                    Err(Error::Cancelled) => debug!(elapsed_ms, "call cancelled"),
                    Err(err) => warn!(error = %err, elapsed_ms, "call failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

fn redacted_headers(request: &Request<Bytes>) -> Vec<(String, String)> {
    let mut headers: Vec<_> = request
        .headers()
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS
                .iter()
                .any(|hidden| name.eq_ignore_ascii_case(hidden))
            {
                "<redacted>".to_string()
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect();
    headers.sort();
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    #[test]
    fn logging_layer_levels() {
        assert_eq!(LoggingLayer::new().level(), LogLevel::Info);
        assert_eq!(LoggingLayer::debug().level(), LogLevel::Debug);
    }

    #[test]
    fn authorization_is_redacted() {
        let url = url::Url::parse("https://acme.egnyte.com/pubapi/v1/userinfo").expect("url");
        let request = Request::<Bytes>::builder(Method::Get, url)
            .header("Authorization", "Bearer abc123")
            .header("Accept", "application/json")
            .build();

        let headers = redacted_headers(&request);

        assert_eq!(
            headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "<redacted>".to_string()),
            ]
        );
    }
}
