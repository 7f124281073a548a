//! Body serialization utilities.

use bytes::Bytes;

use crate::{DecodeError, Result};

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }

    /// Returns `true` if a `Content-Type` header value denotes this type.
    ///
    /// Only the media type is compared; parameters such as `charset` are
    /// ignored, and the comparison is case-insensitive.
    ///
    /// ```
    /// use egnyte_core::ContentType;
    ///
    /// assert!(ContentType::Json.matches("application/json; charset=utf-8"));
    /// assert!(!ContentType::Json.matches("text/plain"));
    /// ```
    #[must_use]
    pub fn matches(&self, header_value: &str) -> bool {
        let media_type = header_value.split(';').next().unwrap_or_default().trim();
        media_type.eq_ignore_ascii_case(self.as_str())
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use egnyte_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Lock { action: &'static str }
///
/// let bytes = to_json(&Lock { action: "lock" }).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"action":"lock"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// # Example
///
/// ```
/// use egnyte_core::to_form;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Revoke { token: String }
///
/// let bytes = to_form(&Revoke { token: "abc".to_string() }).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"token=abc");
/// ```
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// An empty body is read as JSON `null`, so `()` and `Option<T>` targets
/// accept `204 No Content` style answers.
///
/// # Example
///
/// ```
/// use egnyte_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct FileLock { timeout: u64 }
///
/// let lock: FileLock = from_json(br#"{"timeout":7199}"#).expect("deserialize");
/// assert_eq!(lock, FileLock { timeout: 7199 });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(
    bytes: &[u8],
) -> std::result::Result<T, DecodeError> {
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };

    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| DecodeError::Json {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(
            ContentType::FormUrlEncoded.as_str(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(ContentType::PlainText.as_str(), "text/plain");
        assert_eq!(
            ContentType::OctetStream.as_str(),
            "application/octet-stream"
        );
    }

    #[test]
    fn content_type_matches_ignores_parameters_and_case() {
        assert!(ContentType::Json.matches("application/json"));
        assert!(ContentType::Json.matches("Application/JSON ; charset=UTF-8"));
        assert!(!ContentType::Json.matches("application/problem+json"));
        assert!(!ContentType::Json.matches(""));
    }

    #[test]
    fn to_form_serialize() {
        #[derive(serde::Serialize)]
        struct Revoke {
            token: String,
        }

        let bytes = to_form(&Revoke {
            token: "a b&c".to_string(),
        })
        .expect("serialize");
        assert_eq!(bytes.as_ref(), b"token=a+b%26c");
    }

    #[test]
    fn from_json_deserialize() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct UserInfo {
            id: u64,
            username: String,
        }

        let user: UserInfo = from_json(br#"{"id":123,"username":"test"}"#).expect("deserialize");
        assert_eq!(
            user,
            UserInfo {
                id: 123,
                username: "test".to_string(),
            }
        );
    }

    #[test]
    fn from_json_empty_body_is_null() {
        let () = from_json(b"").expect("unit");

        let missing: Option<u32> = from_json(b"  \n").expect("option");
        assert_eq!(missing, None);
    }

    #[test]
    fn from_json_missing_field_error_with_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Name {
            #[allow(dead_code)]
            family_name: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            name: Name,
        }

        let err = from_json::<User>(br#"{"name":{}}"#).expect_err("should fail");
        let msg = err.to_string();
        assert!(msg.contains("name"), "Expected path 'name' in error: {msg}");
        assert!(
            msg.contains("family_name"),
            "Expected field 'family_name' mentioned in error: {msg}"
        );
    }
}
