//! Client configuration: where the REST API and the media CDN live.

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_STATIC_BASE_URL: &str = "https://d58vokudzsdux.cloudfront.net";

pub const API_URL_ENV: &str = "MOVIE_ADMIN_API_URL";
pub const STATIC_URL_ENV: &str = "MOVIE_ADMIN_STATIC_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub static_base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL, DEFAULT_STATIC_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(api_base_url: &str, static_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            static_base_url: static_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Defaults overridden by `MOVIE_ADMIN_API_URL` / `MOVIE_ADMIN_STATIC_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self::new(
            &pick(API_URL_ENV, DEFAULT_API_BASE_URL),
            &pick(STATIC_URL_ENV, DEFAULT_STATIC_BASE_URL),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_stripped() {
        let config = ClientConfig::new("http://localhost:3000/api/", "https://cdn/");
        assert_eq!(config.api_base_url, "http://localhost:3000/api");
        assert_eq!(config.static_base_url, "https://cdn");
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = ClientConfig::from_lookup(|key| match key {
            API_URL_ENV => Some("https://admin.example.com/api/".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://admin.example.com/api");
        assert_eq!(config.static_base_url, DEFAULT_STATIC_BASE_URL);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(|_| Some("   ".to_string()));
        assert_eq!(config, ClientConfig::default());
    }
}
