//! HTTP verbs used by the public API.

use derive_more::Display;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// Read a resource.
    #[display("GET")]
    Get,
    /// Create a resource or trigger an action (lock, revoke, ...).
    #[display("POST")]
    Post,
    /// Replace a resource.
    #[display("PUT")]
    Put,
    /// Partially update a resource.
    #[display("PATCH")]
    Patch,
    /// Remove a resource.
    #[display("DELETE")]
    Delete,
    /// Read headers only (e.g. file metadata checks).
    #[display("HEAD")]
    Head,
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
            Method::Head => Self::HEAD,
        }
    }
}
