use tracing::info;

use super::{parse_record, AdminApi, AdminClient};
use crate::error::ApiError;
use crate::headers::{APPLICATION_JSON, CONTENT_TYPE};
use crate::http::{Body, HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::{LoginRequest, LoginResponse};

impl AdminClient {
    /// Login never carries a bearer token, even if a stale one is stored.
    pub fn build_login(&self, credentials: &LoginRequest) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(credentials)
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url("/Auth/login"),
            headers: vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())],
            body: Some(Body::Json(body)),
        })
    }
}

impl<T: Transport> AdminApi<T> {
    /// Authenticate and, when the backend issues a token, store it together
    /// with the user identity in the session.
    pub fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response = self.send(self.client.build_login(credentials)?)?;
        let login: LoginResponse = parse_record(response)?;
        if let Some(session) = login.session() {
            self.session().set_session(&session)?;
            info!(user_id = ?login.user_id, "signed in");
        }
        Ok(login)
    }

    /// Drop the token and user identity. No request is sent.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session().clear_session()?;
        info!("signed out");
        Ok(())
    }
}
