//! Async client for the Egnyte public API.
//!
//! Every call flows through the same pipeline:
//!
//! 1. [`UrlComposer`] builds the tenant URL, escaping `[` and `]`
//! 2. the [`HyperClient`] tower chain sends it, waiting out over-QPS
//!    rejections (`403` + `X-Mashery-Error-Code: ERR_403_DEVELOPER_OVER_QPS`)
//! 3. [`Dispatcher`] decodes a 2xx body in the requested [`PayloadShape`]
//!    or turns the error body into a readable [`Error::Api`] message
//!
//! Calls can be abandoned at any point with a [`CancellationToken`].
//!
//! # Example
//!
//! ```ignore
//! use egnyte::prelude::*;
//!
//! let client = EgnyteClient::builder("acme")
//!     .access_token("access-token")
//!     .build()?;
//!
//! let me = client.auth().user_info().await?.into_payload();
//! let report = client
//!     .files()
//!     .download("/Shared/Reports/2024 [final].pdf")
//!     .await?;
//! ```

pub mod api;
mod api_client;
mod client;
mod config;
mod connector;
mod dispatcher;
pub mod middleware;
pub mod prelude;

pub use api_client::{EgnyteClient, EgnyteClientBuilder};
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use dispatcher::Dispatcher;

pub use tokio_util::sync::CancellationToken;
pub use tower;

pub use egnyte_core::{
    Body, BodyStream, ContentType, DEFAULT_AUTHORITY_TEMPLATE, DecodeError, Error, ErrorEntry,
    ErrorPayload, HeaderMap, HttpClient, Method, Payload, PayloadShape, Request, RequestBuilder,
    Response, ResponseEnvelope, Result, StatusCode, UrlComposer, compose, escape_brackets,
    from_json, header, normalize, to_form, to_json,
};
