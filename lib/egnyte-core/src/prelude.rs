//! Prelude module for convenient imports.
//!
//! ```ignore
//! use egnyte_core::prelude::*;
//! ```

pub use crate::{
    Body, ContentType, Error, HttpClient, Method, Payload, PayloadShape, Request, RequestBuilder,
    Response, ResponseEnvelope, Result, UrlComposer, from_json, to_form, to_json,
};
