//! Over-QPS retry middleware.
//!
//! The API rejects requests above the developer key's queries-per-second
//! quota with `403 Forbidden` and `X-Mashery-Error-Code:
//! ERR_403_DEVELOPER_OVER_QPS`, optionally with `Retry-After` in seconds.
//! This layer waits and re-sends the identical request until a different
//! answer comes back. Every other response, including other 403s, passes
//! through untouched.
//!
//! The wait observes the [`CancellationToken`] found in the request
//! extensions and ends with [`Error::Cancelled`] when it fires.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service, ServiceExt};
use tracing::{debug, warn};

use crate::{Error, Request, Response, Result};

/// Header naming the cause of a gateway rejection.
pub const ERROR_CODE_HEADER: &str = "x-mashery-error-code";

/// Error code sent when the queries-per-second quota is exceeded.
pub const OVER_QPS_ERROR_CODE: &str = "ERR_403_DEVELOPER_OVER_QPS";

/// Wait used when `Retry-After` is absent or not a whole number of seconds.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Returns `true` if the response is an over-QPS rejection.
#[must_use]
pub fn is_over_qps(response: &Response) -> bool {
    response.status() == 403
        && response
            .headers()
            .get_all(ERROR_CODE_HEADER)
            .iter()
            .any(|value| value.to_str().is_ok_and(|v| v.trim() == OVER_QPS_ERROR_CODE))
}

/// Delay requested by the response's `Retry-After` header.
#[must_use]
pub fn retry_delay(response: &Response) -> Duration {
    response
        .header(http::header::RETRY_AFTER.as_str())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_DELAY, Duration::from_secs)
}

/// Layer that retries over-QPS rejections.
///
/// Retries are unbounded unless [`OverQpsRetryLayer::with_max_attempts`]
/// is used.
///
/// # Example
///
/// ```ignore
/// use egnyte::middleware::OverQpsRetryLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(OverQpsRetryLayer::new())
///     .service(client);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OverQpsRetryLayer {
    max_attempts: Option<u32>,
}

impl OverQpsRetryLayer {
    /// Retry for as long as the quota signal recurs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up after `max_attempts` sends and return the last rejection.
    ///
    /// A value of `0` is treated as `1`.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    /// The attempt cap, if any.
    #[must_use]
    pub const fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

impl<S> Layer<S> for OverQpsRetryLayer {
    type Service = OverQpsRetry<S>;

    fn layer(&self, inner: S) -> Self::Service {
        OverQpsRetry {
            inner,
            max_attempts: self.max_attempts,
        }
    }
}

/// Service that retries over-QPS rejections.
#[derive(Debug, Clone)]
pub struct OverQpsRetry<S> {
    inner: S,
    max_attempts: Option<u32>,
}

impl<S> OverQpsRetry<S> {
    /// Create an unbounded retrying service wrapping the given service.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            max_attempts: None,
        }
    }
}

impl<S> Service<Request<Bytes>> for OverQpsRetry<S>
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
        let mut inner = self.inner.clone();
        let max_attempts = self.max_attempts;

        Box::pin(async move {
            let cancel = request.extensions().get::<CancellationToken>().cloned();
            let mut attempt: u32 = 1;

            loop {
                let response = inner.ready().await?.call(request.clone()).await?;

                if !is_over_qps(&response) {
                    return Ok(response);
                }
                if max_attempts.is_some_and(|max| attempt >= max) {
                    warn!(attempt, "over QPS quota, giving up");
                    return Ok(response);
                }

                let delay = retry_delay(&response);
                warn!(
                    attempt,
                    delay_secs = delay.as_secs(),
                    url = %request.url(),
                    "over QPS quota, retrying"
                );
                drop(response);

                wait(delay, cancel.as_ref()).await?;
                attempt += 1;
            }
        })
    }
}

async fn wait(delay: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
    let Some(cancel) = cancel else {
        tokio::time::sleep(delay).await;
        return Ok(());
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("cancelled while waiting for QPS quota");
            Err(Error::Cancelled)
        }
        () = tokio::time::sleep(delay) => Ok(()),
    }
}
