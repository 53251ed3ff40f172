use crate::config::API_PREFIX;

const CACHEABLE_TYPE_PREFIXES: [&str; 5] = [
    "text/html",
    "text/css",
    "application/javascript",
    "image/",
    "font/",
];

/// Decides whether an origin response may be stored under `key`.
///
/// API paths are never stored, even if they carry an allow-listed content
/// type. A missing content type is treated as not cacheable. Origin
/// `Cache-Control` directives are not consulted.
pub fn is_cacheable(key: &str, content_type: Option<&str>) -> bool {
    if key.starts_with(API_PREFIX) {
        return false;
    }

    content_type.is_some_and(|content_type| {
        CACHEABLE_TYPE_PREFIXES
            .iter()
            .any(|prefix| content_type.starts_with(prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_paths_are_never_cacheable() {
        assert!(!is_cacheable("/api/x", Some("text/html")));
        assert!(!is_cacheable("/api/movies?page=2", Some("image/png")));
    }

    #[test]
    fn allow_listed_types() {
        assert!(is_cacheable("/x.png", Some("image/png")));
        assert!(is_cacheable("/index.html", Some("text/html; charset=UTF-8")));
        assert!(is_cacheable("/style.css", Some("text/css")));
        assert!(is_cacheable("/app.js", Some("application/javascript; charset=utf-8")));
        assert!(is_cacheable("/f.woff2", Some("font/woff2")));
    }

    #[test]
    fn other_types_are_not_cacheable() {
        assert!(!is_cacheable("/x.bin", Some("application/octet-stream")));
        assert!(!is_cacheable("/data.json", Some("application/json")));
        assert!(!is_cacheable("/readme.txt", Some("text/plain")));
        assert!(!is_cacheable("/index.html", None));
        assert!(!is_cacheable("/index.html", Some("")));
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        assert!(!is_cacheable("/index.html", Some("TEXT/HTML")));
    }
}
