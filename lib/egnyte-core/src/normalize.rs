//! Turning error response bodies into one human-readable message.
//!
//! The API reports failures in several shapes:
//!
//! - validation errors: `{"formErrors": [...], "inputErrors": {"field": [...]}}`
//! - single errors: `{"errorMessage": "..."}`, `{"message": "..."}` or `{"error": "..."}`
//! - anything else, including plain text and HTML from proxies
//!
//! [`normalize`] never fails: when a body cannot be understood, the raw text
//! is the message.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::ContentType;

/// Single-error fields, checked in this order.
const MESSAGE_FIELDS: [&str; 3] = ["errorMessage", "message", "error"];

/// One validation error entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorEntry {
    /// Machine-readable code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(rename = "msg", default)]
    pub message: String,
}

/// The validation-error payload: form-level and per-field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// Errors not tied to an input field.
    #[serde(default)]
    pub form_errors: Vec<ErrorEntry>,
    /// Errors per input field, in document order.
    #[serde(default)]
    pub input_errors: IndexMap<String, Vec<ErrorEntry>>,
}

impl ErrorPayload {
    /// Collapse into `"form; field: msg; ...".`
    ///
    /// Repeated parts are only reported once.
    #[must_use]
    pub fn to_message(&self) -> String {
        let form = self.form_errors.iter().map(|e| e.message.clone());
        let fields = self.input_errors.iter().flat_map(|(field, errors)| {
            errors
                .iter()
                .map(move |error| format!("{field}: {}", error.message))
        });

        let mut parts: Vec<String> = Vec::new();
        for part in form.chain(fields) {
            if !parts.contains(&part) {
                parts.push(part);
            }
        }

        format!("{}.", parts.join("; "))
    }
}

/// Produce the message for an error response.
///
/// - JSON bodies (by `content_type`) are checked for the validation payload,
///   then for `errorMessage`, `message` and `error` in that order.
/// - Other bodies are returned verbatim.
/// - Empty bodies fall back to the status' reason phrase.
///
/// ```
/// use egnyte_core::normalize;
///
/// let body = r#"{"formErrors":[{"code":"E1","msg":"Bad input"}],"inputErrors":{"name":[{"code":"E2","msg":"Required"}]}}"#;
/// assert_eq!(normalize(body, Some("application/json"), 400), "Bad input; name: Required.");
/// assert_eq!(normalize("Internal error", Some("text/plain"), 500), "Internal error");
/// ```
#[must_use]
pub fn normalize(raw_body: &str, content_type: Option<&str>, status: u16) -> String {
    if raw_body.trim().is_empty() {
        return status_fallback(status);
    }

    let is_json = content_type.is_some_and(|ct| ContentType::Json.matches(ct));
    if !is_json {
        return raw_body.to_string();
    }

    json_message(raw_body).unwrap_or_else(|| raw_body.to_string())
}

fn json_message(raw_body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(raw_body).ok()?;
    let object = json.as_object()?;

    if object.get("formErrors").is_some_and(|v| !v.is_null()) {
        let payload = ErrorPayload::deserialize(&json).ok()?;
        return Some(payload.to_message());
    }

    MESSAGE_FIELDS
        .iter()
        .filter_map(|field| object.get(*field))
        .find(|value| !value.is_null())
        .and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn status_fallback(status: u16) -> String {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map_or_else(|| format!("HTTP {status}"), ToString::to_string)
}
