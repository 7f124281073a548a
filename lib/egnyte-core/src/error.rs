//! Error types for the Egnyte client.

use derive_more::{Display, Error, From};

// ============================================================================
// Decode Error
// ============================================================================

/// Why a successful (2xx) response body could not be turned into the
/// requested payload.
///
/// Carried as the `cause` of an [`Error::Api`].
#[derive(Debug, Display, Error)]
pub enum DecodeError {
    /// The body is not valid JSON for the target type.
    #[display("JSON deserialization error at '{path}': {message}")]
    Json {
        /// JSON path to the failing field (e.g. `user.address.city`).
        path: String,
        /// Deserializer message.
        message: String,
    },

    /// The body was expected to be text but is not valid UTF-8.
    #[display("response body is not valid UTF-8: {_0}")]
    Utf8(std::string::FromUtf8Error),
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for Egnyte API operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// A caller-supplied argument was rejected before any network activity.
    #[display("invalid argument: {_0}")]
    #[from(skip)]
    InvalidArgument(#[error(not(source))] String),

    /// The API answered with a non-2xx status, or a 2xx body could not be
    /// decoded into the expected payload.
    #[display("API error {status}: {message}")]
    #[from(skip)]
    Api {
        /// HTTP status code.
        status: u16,
        /// Normalized, human-readable message.
        message: String,
        /// Raw response body, if one was read.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
        /// Decoding failure behind a 2xx error.
        #[error(source)]
        cause: Option<DecodeError>,
    },

    /// The caller cancelled the request.
    #[display("request cancelled")]
    #[from(skip)]
    Cancelled,

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// The configured client timeout elapsed before the response arrived.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an invalid argument error for a required value that is blank.
    #[must_use]
    pub fn blank_argument(name: &str) -> Self {
        Self::InvalidArgument(format!("`{name}` must not be empty"))
    }

    /// Create an API error from status code and message.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            body: None,
            cause: None,
        }
    }

    /// Create an API error with the raw body attached.
    #[must_use]
    pub fn api_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Api {
            status,
            message: message.into(),
            body: Some(body),
            cause: None,
        }
    }

    /// Create an API error for a 2xx body that failed to decode.
    ///
    /// The message is the raw body, so schema drift can be diagnosed from
    /// the error alone.
    #[must_use]
    pub fn undecodable(status: u16, body: bytes::Bytes, cause: DecodeError) -> Self {
        Self::Api {
            status,
            message: String::from_utf8_lossy(&body).into_owned(),
            body: Some(body),
            cause: Some(cause),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Returns `true` if the request was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if a caller argument was rejected.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns the HTTP status code if this is an API error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the normalized message if this is an API error.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns the response body if this is an API error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the API error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not an API error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        match self {
            Self::Api {
                status,
                body: Some(body),
                ..
            } => Some(
                crate::from_json(body)
                    .map_err(|cause| Self::undecodable(*status, body.clone(), cause)),
            ),
            _ => None,
        }
    }
}
