use serde_json::Value;

use super::{parse_ack, parse_list, AdminApi, AdminClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::{RoleUpdate, User};

impl AdminClient {
    pub fn build_get_users(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/users")
    }

    pub fn build_update_user_role(&self, user_id: i64, role: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/users/{user_id}/role"),
            &RoleUpdate {
                role: role.to_string(),
            },
        )
    }

    pub fn build_delete_user(&self, user_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/users/{user_id}"))
    }
}

impl<T: Transport> AdminApi<T> {
    pub fn get_users(&self) -> Result<Vec<User>, ApiError> {
        parse_list(self.send(self.client.build_get_users())?)
    }

    pub fn update_user_role(&self, user_id: i64, role: &str) -> Result<Value, ApiError> {
        parse_ack(self.send(self.client.build_update_user_role(user_id, role)?)?)
    }

    pub fn delete_user(&self, user_id: i64) -> Result<Value, ApiError> {
        parse_ack(self.send(self.client.build_delete_user(user_id))?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::http::Body;
    use crate::normalize::success_marker;

    #[test]
    fn build_update_user_role_patches_role() {
        let req = client().build_update_user_role(12, "Admin").unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, format!("{BASE_URL}/users/12/role"));
        assert_eq!(req.body, Some(Body::Json(r#"{"role":"Admin"}"#.to_string())));
    }

    #[test]
    fn get_users_decodes_list() {
        let api = api(vec![json_response(
            200,
            r#"[{"id":1,"username":"root","role":"Admin","isPremium":true},{"id":2,"email":"u@x.io"}]"#,
        )]);
        let users = api.get_users().unwrap();
        assert_eq!(users.len(), 2);
        assert!(users[0].is_admin());
        assert!(users[0].is_premium);
        assert!(!users[1].is_admin());
        assert_eq!(api.transport().last().path, format!("{BASE_URL}/users"));
    }

    #[test]
    fn delete_user_no_content_is_success() {
        let api = api(vec![json_response(204, "")]);
        assert_eq!(api.delete_user(5).unwrap(), success_marker());
        let req = api.transport().last();
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }
}
