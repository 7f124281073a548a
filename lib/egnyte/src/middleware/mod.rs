//! Tower middleware layers for the transport chain.
//!
//! - [`OverQpsRetryLayer`] - waits out over-QPS rejections and re-sends
//! - [`BearerAuthLayer`] - adds `Authorization: Bearer <token>`
//! - [`LoggingLayer`] - logs calls using `tracing`
//!
//! Every layer works on [`crate::Request`] and a streaming
//! [`crate::Response`], so custom layers can be added with
//! [`crate::HyperClientBuilder::layer`].
//!
//! # Example
//!
//! ```ignore
//! use egnyte::HyperClient;
//!
//! let client = HyperClient::builder()
//!     .with_bearer_auth("access-token")
//!     .with_logging()
//!     .build();
//! ```

mod bearer_auth;
mod logging;
mod over_qps_retry;

pub use bearer_auth::{BearerAuth, BearerAuthLayer};
pub use logging::{LogLevel, Logging, LoggingLayer};
pub use over_qps_retry::{
    DEFAULT_RETRY_DELAY, ERROR_CODE_HEADER, OVER_QPS_ERROR_CODE, OverQpsRetry, OverQpsRetryLayer,
    is_over_qps, retry_delay,
};

pub use tower::{Layer, ServiceBuilder};
