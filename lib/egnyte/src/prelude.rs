//! Prelude module for convenient imports.
//!
//! ```ignore
//! use egnyte::prelude::*;
//! ```

pub use crate::api::UserInfo;
pub use crate::{
    Body, CancellationToken, ClientConfig, Dispatcher, EgnyteClient, Error, HttpClient,
    HyperClient, Method, Payload, PayloadShape, Request, Response, ResponseEnvelope, Result,
    UrlComposer,
};
