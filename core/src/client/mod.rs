//! Request builders and response parsers for the movie-admin API.
//!
//! # Design
//! `AdminClient` holds the configuration and a `SessionContext` and carries
//! no other state. Every backend operation has a `build_*` method producing
//! an `HttpRequest`; responses go through the shared `parse_*` functions,
//! which normalize the body and coerce it into the operation's result type.
//! `AdminApi` pairs a client with a `Transport` and performs exactly one
//! round trip per operation.
//!
//! Operations are grouped per backend resource in the submodules.

mod auth;
mod catalog;
mod episodes;
mod movies;
mod reviews;
mod stats;
mod users;

pub use episodes::new_episode_form;
pub use movies::{movie_update_form, new_movie_form, MAX_RELEASE_YEAR, MIN_RELEASE_YEAR};
pub use stats::{
    average_rating, bar_percent, bar_scale_max, total_new_users, DEFAULT_DAYS, DEFAULT_LIMIT,
    DEFAULT_MONTHS,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::assets::resolve_static_url;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::headers::{json_headers, multipart_headers};
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse, MultipartForm};
use crate::normalize::{is_success_marker, normalize};
use crate::session::SessionContext;
use crate::transport::Transport;
use crate::types::Outcome;

/// Builds requests for the movie-admin backend without touching the network.
#[derive(Debug, Clone)]
pub struct AdminClient {
    config: ClientConfig,
    session: SessionContext,
}

impl AdminClient {
    pub fn new(config: ClientConfig, session: SessionContext) -> Self {
        Self { config, session }
    }

    /// Client against `base_url` with an empty in-memory session.
    pub fn with_base_url(base_url: &str) -> Self {
        let config = ClientConfig {
            api_base_url: base_url.trim_end_matches('/').to_string(),
            ..ClientConfig::default()
        };
        Self::new(config, SessionContext::in_memory())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Absolute URL for a backend media path, resolved against the CDN.
    pub fn static_url(&self, path: Option<&str>) -> Option<String> {
        resolve_static_url(&self.config.static_base_url, path)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base_url)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(path),
            headers: json_headers(self.session.token().as_deref()),
            body: None,
        }
    }

    fn json_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut request = self.request(method, path);
        request.body = Some(Body::Json(body));
        Ok(request)
    }

    fn multipart_request(
        &self,
        method: HttpMethod,
        path: &str,
        form: MultipartForm,
    ) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(path),
            headers: multipart_headers(self.session.token().as_deref()),
            body: Some(Body::Multipart(form)),
        }
    }
}

/// Decode a JSON array into records. Any other success body (empty, text,
/// an object) yields an empty list; a malformed row is still an error.
pub fn parse_list<T: DeserializeOwned>(response: HttpResponse) -> Result<Vec<T>, ApiError> {
    let value = normalize(&response)?;
    match value {
        Value::Array(_) => {
            serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
        }
        other if is_success_marker(&other) => Ok(Vec::new()),
        other => {
            warn!(got = kind(&other), "list endpoint answered without an array");
            Ok(Vec::new())
        }
    }
}

/// Decode a single record.
pub fn parse_record<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let value = normalize(&response)?;
    serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Decode a write result: the record when the body holds one, otherwise the
/// normalized acknowledgement.
pub fn parse_outcome<T: DeserializeOwned>(response: HttpResponse) -> Result<Outcome<T>, ApiError> {
    let value = normalize(&response)?;
    if is_success_marker(&value) {
        return Ok(Outcome::Ack(value));
    }
    match serde_json::from_value(value.clone()) {
        Ok(record) => Ok(Outcome::Record(record)),
        Err(e) => {
            warn!(error = %e, "write response is not a record; keeping raw acknowledgement");
            Ok(Outcome::Ack(value))
        }
    }
}

/// Normalize and return whatever the backend answered.
pub fn parse_ack(response: HttpResponse) -> Result<Value, ApiError> {
    normalize(&response)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A client bound to a transport; each method is one backend round trip.
#[derive(Debug, Clone)]
pub struct AdminApi<T> {
    client: AdminClient,
    transport: T,
}

impl<T: Transport> AdminApi<T> {
    pub fn new(client: AdminClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &AdminClient {
        &self.client
    }

    pub fn session(&self) -> &SessionContext {
        self.client.session()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, path = %request.path, "dispatching");
        self.transport.send(request)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;

    /// Records requests and replays one canned response per call.
    #[derive(Default)]
    pub struct ScriptedTransport {
        pub requests: RefCell<Vec<HttpRequest>>,
        pub responses: RefCell<Vec<HttpResponse>>,
    }

    impl ScriptedTransport {
        pub fn replying(responses: Vec<HttpResponse>) -> Self {
            Self {
                requests: RefCell::new(Vec::new()),
                responses: RefCell::new(responses),
            }
        }

        pub fn calls(&self) -> usize {
            self.requests.borrow().len()
        }

        pub fn last(&self) -> HttpRequest {
            self.requests.borrow().last().cloned().unwrap()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.borrow_mut().push(request);
            let mut responses = self.responses.borrow_mut();
            if responses.is_empty() {
                return Ok(json_response(204, "null"));
            }
            Ok(responses.remove(0))
        }
    }

    pub fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            status_text: String::new(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn text_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            status_text: String::new(),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    pub const BASE_URL: &str = "http://localhost:8080/api";

    pub fn client() -> AdminClient {
        AdminClient::with_base_url(BASE_URL)
    }

    pub fn api(responses: Vec<HttpResponse>) -> AdminApi<ScriptedTransport> {
        AdminApi::new(client(), ScriptedTransport::replying(responses))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::session::Session;
    use crate::types::Genre;

    #[test]
    fn trailing_slash_is_stripped() {
        let client = AdminClient::with_base_url("http://localhost:8080/api/");
        assert_eq!(client.build_get_genres().path, "http://localhost:8080/api/Genres");
    }

    #[test]
    fn requests_pick_up_the_current_token() {
        let client = client();
        assert!(client.build_get_genres().header("Authorization").is_none());

        client
            .session()
            .set_session(&Session {
                token: "abc".to_string(),
                user: None,
            })
            .unwrap();
        assert_eq!(client.build_get_genres().header("Authorization"), Some("Bearer abc"));
    }

    #[test]
    fn parse_list_accepts_arrays_and_empty_bodies() {
        let genres: Vec<Genre> =
            parse_list(json_response(200, r#"[{"id":1,"name":"Drama"}]"#)).unwrap();
        assert_eq!(genres.len(), 1);

        let genres: Vec<Genre> = parse_list(json_response(204, "")).unwrap();
        assert!(genres.is_empty());
    }

    #[test]
    fn parse_list_treats_non_arrays_as_empty() {
        let genres: Vec<Genre> = parse_list(json_response(200, r#"{"id":1}"#)).unwrap();
        assert!(genres.is_empty());

        let genres: Vec<Genre> = parse_list(json_response(200, "42")).unwrap();
        assert!(genres.is_empty());
    }

    #[test]
    fn parse_list_still_rejects_malformed_rows() {
        let err = parse_list::<Genre>(json_response(200, r#"[{"name":"no id"}]"#)).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_record_propagates_http_errors() {
        let err = parse_record::<Genre>(json_response(404, r#"{"title":"Not Found"}"#)).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn parse_outcome_distinguishes_records_from_acks() {
        let outcome: Outcome<Genre> =
            parse_outcome(json_response(201, r#"{"id":4,"name":"Noir"}"#)).unwrap();
        assert_eq!(outcome.record().map(|g| g.id), Some(4));

        let outcome: Outcome<Genre> = parse_outcome(text_response(200, "Created")).unwrap();
        assert_eq!(outcome, Outcome::Ack(serde_json::json!({ "success": true, "data": "Created" })));

        let outcome: Outcome<Genre> =
            parse_outcome(json_response(200, r#"{"message":"ok"}"#)).unwrap();
        assert!(!outcome.is_record());
    }

    #[test]
    fn static_url_uses_configured_cdn() {
        let client = client();
        assert_eq!(
            client.static_url(Some("posters//heat.png")).as_deref(),
            Some("https://d58vokudzsdux.cloudfront.net/posters/heat.png")
        );
        assert_eq!(client.static_url(None), None);
    }
}
