//! Resolution of backend-relative media paths (posters, avatars, videos)
//! against the CDN.

/// `None` for a missing or empty path, absolute `http(s)` URLs unchanged,
/// otherwise `<cdn_base>/<path>` with the first `//` in `path` collapsed.
pub fn resolve_static_url(cdn_base: &str, path: Option<&str>) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }
    let clean = path.replacen("//", "/", 1);
    Some(format!("{}/{clean}", cdn_base.trim_end_matches('/')))
}
