//! Payload shapes: how a caller wants a successful body interpreted.

use bytes::Bytes;
use derive_more::Display;

use crate::Body;

/// The expected shape of a successful response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum PayloadShape {
    /// Decode the body as JSON into a typed value.
    #[display("structured")]
    Structured,
    /// Return the body text as-is (e.g. a bare token).
    #[display("raw-text")]
    RawText,
    /// Load the entire body into memory.
    #[display("raw-bytes")]
    RawBytes,
    /// Hand the body over as an incrementally readable stream.
    #[display("byte-stream")]
    ByteStream,
}

impl PayloadShape {
    /// Returns `true` if the body is handed over without buffering.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        matches!(self, Self::ByteStream)
    }
}

/// A decoded successful body, tagged by its [`PayloadShape`].
#[derive(Debug)]
pub enum Payload<T> {
    /// JSON decoded into `T`.
    Structured(T),
    /// Raw body text.
    RawText(String),
    /// Raw body bytes.
    RawBytes(Bytes),
    /// Unread body stream.
    ByteStream(Body),
}

impl<T> Payload<T> {
    /// The shape this payload was decoded as.
    #[must_use]
    pub const fn shape(&self) -> PayloadShape {
        match self {
            Self::Structured(_) => PayloadShape::Structured,
            Self::RawText(_) => PayloadShape::RawText,
            Self::RawBytes(_) => PayloadShape::RawBytes,
            Self::ByteStream(_) => PayloadShape::ByteStream,
        }
    }

    /// The structured value, if any.
    #[must_use]
    pub fn into_structured(self) -> Option<T> {
        match self {
            Self::Structured(value) => Some(value),
            _ => None,
        }
    }

    /// The raw text, if any.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::RawText(text) => Some(text),
            _ => None,
        }
    }

    /// The raw bytes, if any.
    #[must_use]
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Self::RawBytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The body stream, if any.
    #[must_use]
    pub fn into_stream(self) -> Option<Body> {
        match self {
            Self::ByteStream(body) => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_reports_its_shape() {
        assert_eq!(Payload::Structured(1).shape(), PayloadShape::Structured);
        assert_eq!(
            Payload::<()>::RawText(String::new()).shape(),
            PayloadShape::RawText
        );
        assert_eq!(
            Payload::<()>::RawBytes(Bytes::new()).shape(),
            PayloadShape::RawBytes
        );
        assert_eq!(
            Payload::<()>::ByteStream(Body::empty()).shape(),
            PayloadShape::ByteStream
        );
    }

    #[test]
    fn payload_accessors_only_match_their_variant() {
        assert_eq!(Payload::Structured(7).into_structured(), Some(7));
        assert_eq!(Payload::Structured(7).into_text(), None);
        assert_eq!(
            Payload::<()>::RawText("tok".to_string()).into_text().as_deref(),
            Some("tok")
        );
        assert!(Payload::<()>::RawBytes(Bytes::new()).into_stream().is_none());
    }

    #[test]
    fn shape_display() {
        assert_eq!(PayloadShape::ByteStream.to_string(), "byte-stream");
        assert!(PayloadShape::ByteStream.is_streaming());
        assert!(!PayloadShape::RawBytes.is_streaming());
    }
}
