//! Resource groups of the public API.
//!
//! Each group only supplies verb, path, query and body; sending, retrying
//! and decoding are left to the [`crate::Dispatcher`].

mod auth;
mod files;

pub use auth::{Auth, UserInfo};
pub use files::Files;

use crate::{Error, Result};

/// Reject a blank required argument.
fn require<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::blank_argument(name));
    }
    Ok(value)
}
