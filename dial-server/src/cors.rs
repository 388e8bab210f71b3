//! Cross-origin headers for the `/apps` and `/ssdp` route groups.

use warp::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_REQUEST_HEADERS,
    ORIGIN, VARY,
};

use crate::config::CorsOrigins;

pub const ALLOWED_METHODS: &str = "GET,POST,DELETE,OPTIONS";

/// Route group a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorsScope {
    Apps,
    Ssdp,
}

/// Decide which CORS headers a request gets and add them to `response`.
///
/// Preflight responses additionally carry the allowed methods and echo the
/// requested headers.
pub fn apply_cors(
    scope: CorsScope,
    allowed: &CorsOrigins,
    request: &HeaderMap,
    response: &mut HeaderMap,
    preflight: bool,
) {
    let origin = request.get(ORIGIN).and_then(|v| v.to_str().ok());

    let allow_origin = match (scope, origin) {
        (CorsScope::Apps, None) => None,
        (CorsScope::Apps, Some(origin)) if !has_web_scheme(origin) => Some(origin.to_string()),
        (_, _) if *allowed == CorsOrigins::Any => Some("*".to_string()),
        (_, Some(origin)) if allowed.allows(origin) => Some(origin.to_string()),
        _ => None,
    };

    if matches!(allowed, CorsOrigins::List(_)) || allow_origin.as_deref().is_some_and(|o| o != "*") {
        response.insert(VARY, HeaderValue::from_static("Origin"));
    }

    let Some(allow_origin) = allow_origin else {
        return;
    };
    if let Ok(value) = HeaderValue::from_str(&allow_origin) {
        response.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    if scope == CorsScope::Ssdp {
        response.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("Location"));
    }
    if preflight {
        response.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
        if let Some(requested) = request.get(ACCESS_CONTROL_REQUEST_HEADERS) {
            response.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        }
    }
}

/// Whether `origin` uses `http`, `https` or `file`.
fn has_web_scheme(origin: &str) -> bool {
    origin
        .split_once(':')
        .map(|(scheme, _)| {
            ["http", "https", "file"]
                .iter()
                .any(|web| scheme.eq_ignore_ascii_case(web))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request(origin: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(origin) = origin {
            headers.insert(ORIGIN, HeaderValue::from_str(origin).unwrap());
        }
        headers
    }

    fn allow_origin(scope: CorsScope, allowed: &CorsOrigins, origin: Option<&str>) -> Option<String> {
        let mut response = HeaderMap::new();
        apply_cors(scope, allowed, &request(origin), &mut response, false);
        response
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[rstest]
    #[case::no_origin(CorsOrigins::Any, None, None)]
    #[case::app_scheme(CorsOrigins::None, Some("app://tv-remote"), Some("app://tv-remote"))]
    #[case::http_denied(CorsOrigins::None, Some("http://evil.example"), None)]
    #[case::file_denied(CorsOrigins::None, Some("file://"), None)]
    #[case::http_any(CorsOrigins::Any, Some("http://a.example"), Some("*"))]
    #[case::http_listed(
        CorsOrigins::List(vec!["https://a.example".to_string()]),
        Some("https://a.example"),
        Some("https://a.example")
    )]
    #[case::http_unlisted(
        CorsOrigins::List(vec!["https://a.example".to_string()]),
        Some("https://b.example"),
        None
    )]
    fn test_apps_scope(
        #[case] allowed: CorsOrigins,
        #[case] origin: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            allow_origin(CorsScope::Apps, &allowed, origin).as_deref(),
            expected
        );
    }

    #[test]
    fn test_ssdp_scope_exposes_location() {
        let mut response = HeaderMap::new();
        apply_cors(
            CorsScope::Ssdp,
            &CorsOrigins::Any,
            &request(Some("https://a.example")),
            &mut response,
            false,
        );
        assert_eq!(response.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert_eq!(response.get(ACCESS_CONTROL_EXPOSE_HEADERS).unwrap(), "Location");
    }

    #[test]
    fn test_ssdp_scope_ignores_scheme_rule() {
        assert_eq!(
            allow_origin(CorsScope::Ssdp, &CorsOrigins::None, Some("app://tv-remote")),
            None
        );
    }

    #[test]
    fn test_preflight_headers() {
        let mut headers = request(Some("app://tv-remote"));
        headers.insert(ACCESS_CONTROL_REQUEST_HEADERS, HeaderValue::from_static("content-type"));
        let mut response = HeaderMap::new();
        apply_cors(CorsScope::Apps, &CorsOrigins::None, &headers, &mut response, true);

        assert_eq!(response.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), ALLOWED_METHODS);
        assert_eq!(response.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "content-type");
        assert_eq!(response.get(VARY).unwrap(), "Origin");
    }
}
