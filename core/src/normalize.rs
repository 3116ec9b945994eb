//! Turns a raw `HttpResponse` into a JSON value or an `ApiError`.
//!
//! # Design
//! The backend answers inconsistently: JSON with and without a JSON content
//! type, empty bodies, plain text. Successful bodies are therefore decoded by
//! an ordered list of `DecodeStrategy` values, each yielding `Option<Value>`;
//! the first `Some` wins and the list always ends in `SuccessMarker`, so a
//! 2xx response never produces an error. Only the status code decides
//! failure.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::HttpResponse;

/// `{"success": true}`, returned wherever a successful body carries nothing
/// decodable.
pub fn success_marker() -> Value {
    json!({ "success": true })
}

/// True for the synthesized marker, with or without a `data` text envelope.
pub fn is_success_marker(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => {
            map.get("success") == Some(&Value::Bool(true))
                && map.keys().all(|k| k == "success" || k == "data")
        }
        None => false,
    }
}

/// One way of reading a successful body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Parse the raw bytes as JSON.
    JsonBody,
    /// A readable body that is empty or whitespace.
    EmptyText,
    /// Read the bytes as UTF-8 text, then parse that text as JSON.
    TextAsJson,
    /// Wrap readable, non-JSON text as `{"success": true, "data": text}`.
    RawTextEnvelope,
    /// Unconditional `{"success": true}`.
    SuccessMarker,
}

const JSON_PLAN: &[DecodeStrategy] = &[
    DecodeStrategy::JsonBody,
    DecodeStrategy::EmptyText,
    DecodeStrategy::TextAsJson,
    DecodeStrategy::SuccessMarker,
];

const TEXT_PLAN: &[DecodeStrategy] = &[
    DecodeStrategy::EmptyText,
    DecodeStrategy::TextAsJson,
    DecodeStrategy::RawTextEnvelope,
    DecodeStrategy::SuccessMarker,
];

impl DecodeStrategy {
    pub fn apply(self, response: &HttpResponse) -> Option<Value> {
        match self {
            DecodeStrategy::JsonBody => serde_json::from_slice(&response.body).ok(),
            DecodeStrategy::EmptyText => read_text(response)
                .filter(|text| text.trim().is_empty())
                .map(|_| success_marker()),
            DecodeStrategy::TextAsJson => {
                read_text(response).and_then(|text| serde_json::from_str(text).ok())
            }
            DecodeStrategy::RawTextEnvelope => {
                read_text(response).map(|text| json!({ "success": true, "data": text }))
            }
            DecodeStrategy::SuccessMarker => Some(success_marker()),
        }
    }
}

/// Strategies tried, in order, for a successful response.
pub fn decode_plan(response: &HttpResponse) -> &'static [DecodeStrategy] {
    if declares_json(response) {
        JSON_PLAN
    } else {
        TEXT_PLAN
    }
}

fn declares_json(response: &HttpResponse) -> bool {
    response
        .header("content-type")
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

fn read_text(response: &HttpResponse) -> Option<&str> {
    std::str::from_utf8(&response.body).ok()
}

/// Normalize a response: `Err` for a failure status, otherwise the decoded
/// body or a success marker.
pub fn normalize(response: &HttpResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        let message = error_message(response);
        debug!(status = response.status, %message, "backend returned failure status");
        return Err(ApiError::Http {
            status: response.status,
            message,
        });
    }

    if response.status == 204 || response.status == 205 {
        return Ok(success_marker());
    }

    let plan = decode_plan(response);
    for (attempt, strategy) in plan.iter().enumerate() {
        if let Some(value) = strategy.apply(response) {
            if attempt > 0 && *strategy != DecodeStrategy::EmptyText {
                warn!(
                    status = response.status,
                    ?strategy,
                    "response body decoded by fallback strategy"
                );
            }
            return Ok(value);
        }
    }
    Ok(success_marker())
}

/// Human-readable message for a failure response: JSON `message`, JSON
/// `title`, the JSON itself, the raw text, then the status line.
pub fn error_message(response: &HttpResponse) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(&response.body) {
        if !value.is_null() {
            return message_from_json(&value);
        }
    }
    match read_text(response) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("HTTP {}: {}", response.status, response.status_text),
    }
}

fn message_from_json(value: &Value) -> String {
    ["message", "title"]
        .iter()
        .filter_map(|key| value.get(key))
        .find_map(|field| match field {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null | Value::Bool(false) | Value::String(_) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, content_type: Option<&str>, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            status_text: match status {
                200 => "OK",
                204 => "No Content",
                400 => "Bad Request",
                500 => "Internal Server Error",
                _ => "",
            }
            .to_string(),
            headers: content_type
                .map(|ct| vec![("Content-Type".to_string(), ct.to_string())])
                .unwrap_or_default(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn no_content_ignores_unparsable_body() {
        let value = normalize(&response(204, Some("application/json"), &[0xff, 0xfe, b'{'])).unwrap();
        assert_eq!(value, json!({ "success": true }));
        let value = normalize(&response(205, None, b"garbage")).unwrap();
        assert_eq!(value, json!({ "success": true }));
    }

    #[test]
    fn json_body_is_returned_verbatim() {
        let value = normalize(&response(
            200,
            Some("application/json; charset=utf-8"),
            br#"{"id": 5, "title": "X"}"#,
        ))
        .unwrap();
        assert_eq!(value, json!({ "id": 5, "title": "X" }));
    }

    #[test]
    fn malformed_json_with_json_content_type_degrades_to_marker() {
        let value = normalize(&response(200, Some("application/json"), b"{not json")).unwrap();
        assert_eq!(value, success_marker());
    }

    #[test]
    fn empty_json_body_is_a_marker() {
        let value = normalize(&response(201, Some("application/json"), b"  ")).unwrap();
        assert_eq!(value, success_marker());
    }

    #[test]
    fn json_without_content_type_is_still_parsed() {
        let value = normalize(&response(200, Some("text/plain"), b"[1,2]")).unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn plain_text_is_wrapped_in_envelope() {
        let value = normalize(&response(200, None, b"Deleted")).unwrap();
        assert_eq!(value, json!({ "success": true, "data": "Deleted" }));
        assert!(is_success_marker(&value));
    }

    #[test]
    fn unreadable_text_body_degrades_to_marker() {
        let value = normalize(&response(200, None, &[0xc3, 0x28])).unwrap();
        assert_eq!(value, success_marker());
    }

    #[test]
    fn plan_depends_on_content_type() {
        assert_eq!(
            decode_plan(&response(200, Some("APPLICATION/JSON"), b"")),
            JSON_PLAN
        );
        assert_eq!(decode_plan(&response(200, Some("text/html"), b"")), TEXT_PLAN);
        assert_eq!(decode_plan(&response(200, None, b"")), TEXT_PLAN);
    }

    #[test]
    fn failure_uses_json_message() {
        let err = normalize(&response(400, Some("application/json"), br#"{"message":"Invalid input"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 400, .. }));
        assert_eq!(err.to_string(), "Invalid input");
    }

    #[test]
    fn failure_falls_back_to_json_title() {
        let body = br#"{"type":"https://tools.ietf.org/html/rfc9110","title":"One or more validation errors occurred.","status":400}"#;
        let err = normalize(&response(400, Some("application/problem+json"), body)).unwrap_err();
        assert_eq!(err.to_string(), "One or more validation errors occurred.");
    }

    #[test]
    fn falsy_message_falls_through_to_title() {
        let err = normalize(&response(400, None, br#"{"message":0,"title":"Bad rating"}"#)).unwrap_err();
        assert_eq!(err.to_string(), "Bad rating");

        let err = normalize(&response(400, None, br#"{"message":false,"title":""}"#)).unwrap_err();
        assert_eq!(err.to_string(), r#"{"message":false,"title":""}"#);

        let err = normalize(&response(400, None, br#"{"message":3}"#)).unwrap_err();
        assert_eq!(err.to_string(), "3");
    }

    #[test]
    fn failure_without_message_fields_serializes_json() {
        let err = normalize(&response(409, None, br#"{"code":7}"#)).unwrap_err();
        assert_eq!(err.to_string(), r#"{"code":7}"#);
    }

    #[test]
    fn failure_uses_raw_text() {
        let err = normalize(&response(400, None, b"Bad Request")).unwrap_err();
        assert_eq!(err.to_string(), "Bad Request");
    }

    #[test]
    fn failure_with_empty_body_uses_status_line() {
        let err = normalize(&response(500, None, b"")).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
        let err = normalize(&response(400, None, &[0xff])).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 400: Bad Request");
    }

    #[test]
    fn marker_detection_rejects_records() {
        assert!(is_success_marker(&success_marker()));
        assert!(!is_success_marker(&json!({ "success": true, "id": 1 })));
        assert!(!is_success_marker(&json!([])));
    }
}
