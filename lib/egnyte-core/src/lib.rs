//! Core types for the Egnyte public API client.
//!
//! This crate holds everything that does not touch the network:
//! - [`Method`], [`Request`] and [`RequestBuilder`] - the pending request
//! - [`Body`], [`Response`] and [`ResponseEnvelope`] - what comes back
//! - [`PayloadShape`] and [`Payload`] - how a successful body is interpreted
//! - [`UrlComposer`] - tenant-scoped URL composition and bracket escaping
//! - [`normalize`] - error body to human-readable message
//! - [`Error`] and [`Result`] - error handling
//! - [`HttpClient`] - the transport seam
//!
//! The `egnyte` crate builds the transport chain and the dispatcher on top.

mod body;
mod client;
mod error;
mod method;
mod normalize;
mod payload;
pub mod prelude;
mod request;
mod response;
mod url_composer;

pub use body::{ContentType, from_json, to_form, to_json};
pub use client::HttpClient;
pub use error::{DecodeError, Error, Result};
pub use method::Method;
pub use normalize::{ErrorEntry, ErrorPayload, normalize};
pub use payload::{Payload, PayloadShape};
pub use request::{Request, RequestBuilder};
pub use response::{Body, BodyStream, Response, ResponseEnvelope};
pub use url_composer::{DEFAULT_AUTHORITY_TEMPLATE, UrlComposer, compose, escape_brackets};

// Re-export http crate types for status codes and headers
pub use http::{HeaderMap, StatusCode, header};
