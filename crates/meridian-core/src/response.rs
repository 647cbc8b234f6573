//! Normalized response wrapper for REST calls.
//!
//! Every call through the engine resolves to an [`ApiResponse`] pairing the
//! raw HTTP outcome with two derived fields: a success flag and a content
//! document that is always valid JSON. Transport failures never escape as
//! errors; they are synthesized into the same shape.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};

/// Response wrapper returned by [`crate::session::Session::rest_call`].
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// True iff the controller returned a status in the success set
    /// (200, 204, 301, 302).
    pub success: bool,

    /// Response content, guaranteed to be a structured document. Empty and
    /// non-JSON bodies are coerced (see [`ApiResponse::content`]).
    pub content: Value,

    /// HTTP status of the final attempt. `None` when the call never
    /// produced a response (transport failure).
    pub status: Option<StatusCode>,

    /// URL the request was issued against.
    pub url: String,

    /// Response headers of the final attempt; empty for synthesized
    /// failures.
    pub headers: HeaderMap,
}

impl ApiResponse {
    /// Build a response from a received HTTP status, headers, and body text.
    #[must_use]
    pub(crate) fn from_http(
        success: bool,
        status: StatusCode,
        url: String,
        headers: HeaderMap,
        body: &str,
    ) -> Self {
        Self {
            success,
            content: coerce_content(body),
            status: Some(status),
            url,
            headers,
        }
    }

    /// Synthesize a failure response for a call that never produced an HTTP
    /// response.
    #[must_use]
    pub(crate) fn from_transport_error(url: String, detail: &str) -> Self {
        Self {
            success: false,
            content: json!({
                "_error": [
                    {
                        "message": format!("REST request exception: {detail}"),
                        "data": {},
                    }
                ]
            }),
            status: None,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// First `_error` message in the content, if the content carries one.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.content
            .get("_error")?
            .get(0)?
            .get("message")?
            .as_str()
    }

    /// Pretty-printed content document.
    #[must_use]
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.content).unwrap_or_default()
    }
}

/// Coerce a raw body into a structured document.
///
/// Valid JSON parses through unchanged; an empty body becomes `{}`; anything
/// else becomes an `_error` record carrying the raw text.
pub(crate) fn coerce_content(raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => {
            if raw.is_empty() {
                Value::Object(Map::new())
            } else {
                json!({
                    "_error": [
                        {
                            "message": "Response not in JSON format.",
                            "data": raw,
                        }
                    ]
                })
            }
        }
    }
}
