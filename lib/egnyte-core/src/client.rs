//! HTTP transport trait.
//!
//! [`HttpClient`] is the seam between the request pipeline and the network.
//! The `egnyte` crate implements it with hyper and a tower middleware chain;
//! tests implement it with scripted responses.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// Implementations resolve as soon as the response status and headers are
/// known; the body is read lazily through [`crate::Body`]. Implementations
/// must be safe to share between concurrent calls.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - Cancellation
    fn execute(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response>> + Send;
}

impl<C: HttpClient> HttpClient for &C {
    fn execute(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response>> + Send {
        (**self).execute(request)
    }
}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn execute(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response>> + Send {
        (**self).execute(request)
    }
}
