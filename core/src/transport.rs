//! Executes an `HttpRequest` and returns the buffered `HttpResponse`.
//!
//! # Design
//! `Transport` is the only place network I/O happens. Request building and
//! response parsing stay pure, so tests substitute a fake transport and
//! count calls. `UreqTransport` is the blocking implementation: it disables
//! ureq's status-as-error behavior so 4xx/5xx bodies reach the normalizer,
//! and it owns the multipart boundary.

use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::headers::CONTENT_TYPE;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    /// One round trip. Non-2xx statuses are returned as data, not `Err`.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

/// Blocking transport over a shared `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

/// Encoded payload plus the `Content-Type` the transport must add, if any.
fn encode_body(body: Option<Body>) -> (Option<Vec<u8>>, Option<String>) {
    match body {
        None => (None, None),
        Some(Body::Json(text)) => (Some(text.into_bytes()), None),
        Some(Body::Multipart(form)) => {
            let boundary = format!("----movie-admin-{}", Uuid::new_v4().simple());
            let content_type = format!("multipart/form-data; boundary={boundary}");
            (Some(form.encode(&boundary)), Some(content_type))
        }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            path,
            mut headers,
            body,
        } = request;
        let (payload, content_type) = encode_body(body);
        if let Some(content_type) = content_type {
            headers.push((CONTENT_TYPE.to_string(), content_type));
        }
        debug!(%method, %path, bytes = payload.as_ref().map_or(0, Vec::len), "sending request");

        let agent = &self.agent;
        let result = match (method, payload) {
            (HttpMethod::Get, _) => with_headers(agent.get(&path), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(agent.delete(&path), &headers).call(),
            (HttpMethod::Post, Some(bytes)) => {
                with_headers(agent.post(&path), &headers).send(&bytes[..])
            }
            (HttpMethod::Post, None) => with_headers(agent.post(&path), &headers).send_empty(),
            (HttpMethod::Put, Some(bytes)) => {
                with_headers(agent.put(&path), &headers).send(&bytes[..])
            }
            (HttpMethod::Put, None) => with_headers(agent.put(&path), &headers).send_empty(),
            (HttpMethod::Patch, Some(bytes)) => {
                with_headers(agent.patch(&path), &headers).send(&bytes[..])
            }
            (HttpMethod::Patch, None) => with_headers(agent.patch(&path), &headers).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: response_headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{FilePart, MultipartForm};

    #[test]
    fn json_body_needs_no_extra_content_type() {
        let (bytes, content_type) = encode_body(Some(Body::Json("{}".to_string())));
        assert_eq!(bytes.as_deref(), Some(&b"{}"[..]));
        assert!(content_type.is_none());
    }

    #[test]
    fn multipart_body_gets_boundary_content_type() {
        let mut form = MultipartForm::new();
        form.text("title", "Heat")
            .file("PosterURL", FilePart::new("p.png", "image/png", vec![1, 2, 3]));
        let (bytes, content_type) = encode_body(Some(Body::Multipart(form)));
        let content_type = content_type.unwrap();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        let text = String::from_utf8_lossy(bytes.as_deref().unwrap()).into_owned();
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let request = HttpRequest {
            method: HttpMethod::Get,
            path: "http://127.0.0.1:1/api/Genres".to_string(),
            headers: Vec::new(),
            body: None,
        };
        let err = UreqTransport::new().send(request).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
