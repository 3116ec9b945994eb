//! Header sets attached to outgoing requests.

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const APPLICATION_JSON: &str = "application/json";

/// `Content-Type: application/json` plus a bearer `Authorization` header when
/// a token is present.
pub fn json_headers(token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
    headers.extend(bearer(token));
    headers
}

/// Only the `Authorization` header. `Content-Type` is left to the transport,
/// which owns the multipart boundary.
pub fn multipart_headers(token: Option<&str>) -> Vec<(String, String)> {
    bearer(token).into_iter().collect()
}

fn bearer(token: Option<&str>) -> Option<(String, String)> {
    token
        .filter(|t| !t.is_empty())
        .map(|t| (AUTHORIZATION.to_string(), format!("Bearer {t}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_headers_with_token() {
        let headers = json_headers(Some("abc"));
        assert_eq!(
            headers,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "Bearer abc".to_string()),
            ]
        );
    }

    #[test]
    fn json_headers_without_token_omit_authorization() {
        let headers = json_headers(None);
        assert_eq!(headers.len(), 1);
        assert!(headers.iter().all(|(k, _)| k != AUTHORIZATION));
    }

    #[test]
    fn empty_token_counts_as_absent() {
        assert!(multipart_headers(Some("")).is_empty());
        assert_eq!(json_headers(Some("")).len(), 1);
    }

    #[test]
    fn whitespace_token_is_sent_verbatim() {
        assert_eq!(
            multipart_headers(Some("  ")),
            vec![(AUTHORIZATION.to_string(), "Bearer   ".to_string())]
        );
    }

    #[test]
    fn multipart_headers_never_set_content_type() {
        for token in [None, Some("t0k3n")] {
            let headers = multipart_headers(token);
            assert!(headers.iter().all(|(k, _)| !k.eq_ignore_ascii_case(CONTENT_TYPE)));
        }
        assert_eq!(
            multipart_headers(Some("t0k3n")),
            vec![("Authorization".to_string(), "Bearer t0k3n".to_string())]
        );
    }
}
