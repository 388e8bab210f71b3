//! DIAL resource routing.
//!
//! [`DialRouter`] maps HTTP requests onto the application delegate and the
//! device descriptor. It does not depend on any HTTP server: requests come in as
//! [`DialRequest`] and leave as [`DialResponse`], and [`crate::http`] adapts that
//! to warp.

use std::sync::Arc;

use bytes::Bytes;
use dial_xml::{render_app_resource, render_device_descriptor, AppState, DeviceDescriptor, Icon};
use tracing::{debug, warn};
use warp::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, HOST, LOCATION};
use warp::http::{Method, StatusCode};

use crate::body::{BodyDecoder, DecodedBody};
use crate::config::{CorsOrigins, ServerConfig};
use crate::cors::{apply_cors, CorsScope};
use crate::delegate::AppDelegate;

pub const APPLICATION_URL: &str = "application-url";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// An HTTP request as the router needs it.
#[derive(Debug, Clone)]
pub struct DialRequest {
    pub method: Method,
    /// Path without query string
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl DialRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// The router's answer.
#[derive(Debug, Clone)]
pub struct DialResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl DialResponse {
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    fn xml(body: String) -> Self {
        let mut response = Self::status(StatusCode::OK);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
        response.body = body;
        response
    }

    fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(_) => warn!("Dropping invalid {} header value: {:?}", name, value),
        }
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl warp::Reply for DialResponse {
    fn into_response(self) -> warp::reply::Response {
        let mut response = warp::reply::Response::new(self.body.into());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Static facts the router needs about the device it serves.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub prefix: String,
    /// Effective HTTP port, used in every generated URL
    pub port: u16,
    pub host: Option<String>,
    pub uuid: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    pub icons: Vec<Icon>,
    pub max_content_length: usize,
    pub cors_allow_origins: CorsOrigins,
    pub body_decoder: BodyDecoder,
}

impl RouterSettings {
    /// Settings for a server listening on `port` with device `uuid`.
    pub fn from_config(config: &ServerConfig, port: u16, uuid: &str) -> Self {
        Self {
            prefix: config.prefix.clone(),
            port,
            host: config.host.clone(),
            uuid: uuid.to_string(),
            friendly_name: config.effective_friendly_name(),
            manufacturer: config.manufacturer.clone(),
            model_name: config.model_name.clone(),
            icons: config.icons.clone(),
            max_content_length: config.effective_max_content_length(),
            cors_allow_origins: config.cors_allow_origins.clone(),
            body_decoder: BodyDecoder::new(&config.body_content_types),
        }
    }
}

/// Maps DIAL requests onto an [`AppDelegate`].
pub struct DialRouter {
    settings: RouterSettings,
    delegate: Arc<dyn AppDelegate>,
}

impl DialRouter {
    pub fn new(settings: RouterSettings, delegate: Arc<dyn AppDelegate>) -> Self {
        Self { settings, delegate }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Answer one request.
    pub async fn handle(&self, request: DialRequest) -> DialResponse {
        let Some(route) = request.path.strip_prefix(self.settings.prefix.as_str()) else {
            return DialResponse::status(StatusCode::NOT_FOUND);
        };
        if !route.starts_with('/') {
            return DialResponse::status(StatusCode::NOT_FOUND);
        }

        let mut segments: Vec<&str> = route[1..].split('/').collect();
        if request.method != Method::DELETE && segments.len() > 1 && segments.last() == Some(&"") {
            segments.pop();
        }

        let scope = match segments.first() {
            Some(&"apps") => Some(CorsScope::Apps),
            Some(&"ssdp") => Some(CorsScope::Ssdp),
            _ => None,
        };

        let body = self.settings.body_decoder.decode(&request.headers, &request.body);
        debug!(
            "{} {} ({} body bytes)",
            request.method, request.path, body.length
        );

        let preflight = request.method == Method::OPTIONS && scope.is_some();
        let mut response = if preflight {
            DialResponse::status(StatusCode::NO_CONTENT)
        } else {
            self.dispatch(&request, &segments, body).await
        };

        if let Some(scope) = scope {
            apply_cors(
                scope,
                &self.settings.cors_allow_origins,
                &request.headers,
                &mut response.headers,
                preflight,
            );
        }
        response
    }

    async fn dispatch(&self, request: &DialRequest, segments: &[&str], body: DecodedBody) -> DialResponse {
        match (&request.method, segments) {
            (&Method::GET, ["apps"]) => DialResponse::status(StatusCode::NO_CONTENT),
            (&Method::GET, ["apps", name]) => self.get_app(name).await,
            (&Method::POST, ["apps", name]) => self.launch_app(request, name, body).await,
            (&Method::POST, ["apps", name, "dial_data"]) => self.dial_data(name, body).await,
            (&Method::DELETE, ["apps", name, pid]) => self.stop_app(name, pid).await,
            (&Method::GET, ["ssdp", "device-desc.xml"]) => self.device_description(request),
            _ => DialResponse::status(StatusCode::NOT_FOUND),
        }
    }

    async fn get_app(&self, name: &str) -> DialResponse {
        match self.delegate.get_app(name).await {
            Some(app) => DialResponse::xml(render_app_resource(&app.description(name))),
            None => DialResponse::status(StatusCode::NOT_FOUND),
        }
    }

    async fn launch_app(&self, request: &DialRequest, name: &str, body: DecodedBody) -> DialResponse {
        let Some(app) = self.delegate.get_app(name).await else {
            return DialResponse::status(StatusCode::NOT_FOUND);
        };
        if body.length > self.settings.max_content_length {
            return DialResponse::status(StatusCode::PAYLOAD_TOO_LARGE);
        }

        let status = if app.effective_state() == AppState::Stopped {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        };
        let payload = body.text.filter(|text| !text.is_empty());

        match self.delegate.launch_app(name, payload).await {
            Err(e) => {
                warn!("Launching {} failed: {}", name, e);
                DialResponse::status(StatusCode::SERVICE_UNAVAILABLE)
            }
            Ok(Some(pid)) if !pid.is_empty() => {
                let location = format!("{}/apps/{}/{}", self.base_url(&request.headers), name, pid);
                debug!("Launched {} as {}", name, location);
                DialResponse::status(status).with_header(LOCATION, &location)
            }
            Ok(_) => {
                debug!("Launched {} without a session token", name);
                DialResponse::status(status)
            }
        }
    }

    async fn dial_data(&self, name: &str, body: DecodedBody) -> DialResponse {
        if self.delegate.get_app(name).await.is_none() {
            return DialResponse::status(StatusCode::NOT_FOUND);
        }
        if body.length > self.settings.max_content_length {
            return DialResponse::status(StatusCode::PAYLOAD_TOO_LARGE);
        }
        DialResponse::status(StatusCode::NOT_IMPLEMENTED)
    }

    async fn stop_app(&self, name: &str, pid: &str) -> DialResponse {
        let Some(app) = self.delegate.get_app(name).await else {
            return DialResponse::status(StatusCode::NOT_FOUND);
        };
        if !app.allow_stop {
            return DialResponse::status(StatusCode::METHOD_NOT_ALLOWED);
        }
        if pid.is_empty() {
            return DialResponse::status(StatusCode::BAD_REQUEST);
        }
        if self.delegate.stop_app(name, pid).await {
            DialResponse::status(StatusCode::OK)
        } else {
            DialResponse::status(StatusCode::BAD_REQUEST)
        }
    }

    fn device_description(&self, request: &DialRequest) -> DialResponse {
        let base_url = self.base_url(&request.headers);
        let xml = render_device_descriptor(&DeviceDescriptor {
            uuid: self.settings.uuid.clone(),
            friendly_name: self.settings.friendly_name.clone(),
            manufacturer: self.settings.manufacturer.clone(),
            model_name: self.settings.model_name.clone(),
            url_base: base_url.clone(),
            icons: self.settings.icons.clone(),
        });
        DialResponse::xml(xml).with_header(
            HeaderName::from_static(APPLICATION_URL),
            &format!("{}/apps", base_url),
        )
    }

    /// `{scheme}://{host}:{port}{prefix}` as seen by the requesting client.
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        let scheme = match headers.get(X_FORWARDED_PROTO).and_then(|v| v.to_str().ok()) {
            Some(proto) if proto.split(',').next().map(str::trim) == Some("https") => "https",
            _ => "http",
        };
        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(host_without_port)
            .filter(|host| !host.is_empty())
            .or(self.settings.host.as_deref())
            .unwrap_or("localhost");

        format!("{}://{}:{}{}", scheme, host, self.settings.port, self.settings.prefix)
    }
}

/// Host part of a `Host` header, keeping IPv6 brackets.
fn host_without_port(host: &str) -> &str {
    let host = host.trim();
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, _)) => name,
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DelegateError;
    use async_trait::async_trait;
    use dial_xml::{parse_app_info, AppInfo, AppResource};
    use parking_lot::Mutex;
    use rstest::rstest;
    use std::collections::HashMap;

    /// Delegate backed by a map, recording launch payloads.
    #[derive(Default)]
    struct MapDelegate {
        apps: Mutex<HashMap<String, AppResource>>,
        launch_result: Mutex<Option<Result<Option<String>, DelegateError>>>,
        stop_result: Mutex<bool>,
        payloads: Mutex<Vec<Option<String>>>,
    }

    impl MapDelegate {
        fn with_app(app: AppResource) -> Self {
            let delegate = Self::default();
            delegate.apps.lock().insert(app.name.clone(), app);
            delegate
        }

        fn launching(self, result: Result<Option<String>, DelegateError>) -> Self {
            *self.launch_result.lock() = Some(result);
            self
        }

        fn stopping(self, stopped: bool) -> Self {
            *self.stop_result.lock() = stopped;
            self
        }
    }

    #[async_trait]
    impl AppDelegate for MapDelegate {
        async fn get_app(&self, name: &str) -> Option<AppResource> {
            self.apps.lock().get(name).cloned()
        }

        async fn launch_app(&self, _name: &str, payload: Option<String>) -> Result<Option<String>, DelegateError> {
            self.payloads.lock().push(payload);
            self.launch_result.lock().clone().unwrap_or(Ok(Some("run".to_string())))
        }

        async fn stop_app(&self, _name: &str, _pid: &str) -> bool {
            *self.stop_result.lock()
        }
    }

    fn youtube() -> AppResource {
        AppResource::new("YouTube")
    }

    fn router_with(delegate: MapDelegate, prefix: &str) -> (DialRouter, Arc<MapDelegate>) {
        let delegate = Arc::new(delegate);
        let config = ServerConfig::new()
            .with_prefix(prefix)
            .with_friendly_name("Test TV");
        let settings = RouterSettings::from_config(&config, 3000, "uuid-1234");
        (DialRouter::new(settings, delegate.clone()), delegate)
    }

    fn router(delegate: MapDelegate) -> DialRouter {
        router_with(delegate, "").0
    }

    #[tokio::test]
    async fn test_get_unknown_app_is_404() {
        let router = router(MapDelegate::default());
        let response = router.handle(DialRequest::new(Method::GET, "/apps/Unknown")).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_launch_is_413() {
        let router = router(MapDelegate::with_app(youtube()));
        let request = DialRequest::new(Method::POST, "/apps/YouTube")
            .with_header("content-type", "text/plain")
            .with_body(vec![b'a'; 5000]);
        let response = router.handle(request).await;
        assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_oversized_binary_launch_is_413() {
        let router = router(MapDelegate::with_app(youtube()));
        let request = DialRequest::new(Method::POST, "/apps/YouTube")
            .with_header("content-type", "application/octet-stream")
            .with_body(vec![0u8; 5000]);
        let response = router.handle(request).await;
        assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_launch_stopped_app_is_201_with_location() {
        let (router, delegate) = router_with(MapDelegate::with_app(youtube()), "/dial");
        let request = DialRequest::new(Method::POST, "/dial/apps/YouTube")
            .with_header("host", "192.168.1.20:3000")
            .with_header("content-type", "text/plain; charset=\"utf-8\"")
            .with_body("v=abc");
        let response = router.handle(request).await;

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(
            response.header("location"),
            Some("http://192.168.1.20:3000/dial/apps/YouTube/run")
        );
        assert_eq!(*delegate.payloads.lock(), vec![Some("v=abc".to_string())]);
    }

    #[tokio::test]
    async fn test_launch_running_app_is_200() {
        let app = AppResource {
            pid: Some("run".to_string()),
            ..youtube()
        };
        let router = router(MapDelegate::with_app(app));
        let response = router.handle(DialRequest::new(Method::POST, "/apps/YouTube")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.header("location").is_some());
    }

    #[tokio::test]
    async fn test_launch_without_token_has_no_location() {
        let router = router(MapDelegate::with_app(youtube()).launching(Ok(None)));
        let response = router.handle(DialRequest::new(Method::POST, "/apps/YouTube")).await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert!(response.header("location").is_none());
    }

    #[tokio::test]
    async fn test_launch_failure_is_503() {
        let router = router(
            MapDelegate::with_app(youtube())
                .launching(Err(DelegateError::LaunchFailed("no screen".to_string()))),
        );
        let response = router.handle(DialRequest::new(Method::POST, "/apps/YouTube")).await;
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unlisted_content_type_launches_without_payload() {
        let (router, delegate) = router_with(MapDelegate::with_app(youtube()), "");
        let request = DialRequest::new(Method::POST, "/apps/YouTube")
            .with_header("content-type", "application/octet-stream")
            .with_body("binary");
        router.handle(request).await;
        assert_eq!(*delegate.payloads.lock(), vec![None]);
    }

    #[rstest]
    #[case::stop_not_allowed(false, true, "/apps/YouTube/run", StatusCode::METHOD_NOT_ALLOWED)]
    #[case::stopped(true, true, "/apps/YouTube/run", StatusCode::OK)]
    #[case::not_stopped(true, false, "/apps/YouTube/run", StatusCode::BAD_REQUEST)]
    #[case::empty_pid(true, true, "/apps/YouTube/", StatusCode::BAD_REQUEST)]
    #[case::unknown_app(true, true, "/apps/Netflix/run", StatusCode::NOT_FOUND)]
    #[case::no_pid_segment(true, true, "/apps/YouTube", StatusCode::NOT_FOUND)]
    #[tokio::test]
    async fn test_delete(
        #[case] allow_stop: bool,
        #[case] stops: bool,
        #[case] path: &str,
        #[case] expected: StatusCode,
    ) {
        let app = AppResource {
            allow_stop,
            pid: Some("run".to_string()),
            ..youtube()
        };
        let router = router(MapDelegate::with_app(app).stopping(stops));
        let response = router.handle(DialRequest::new(Method::DELETE, path)).await;
        assert_eq!(response.status, expected);
    }

    #[rstest]
    #[case::no_apps(MapDelegate::default())]
    #[case::stopped_app(MapDelegate::with_app(youtube()))]
    #[case::running_app(MapDelegate::with_app(AppResource { pid: Some("run".to_string()), ..youtube() }))]
    #[tokio::test]
    async fn test_app_list_is_always_204(#[case] delegate: MapDelegate) {
        let router = router(delegate);
        let response = router.handle(DialRequest::new(Method::GET, "/apps")).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_get_app_renders_description() {
        let app = AppResource {
            pid: Some("run".to_string()),
            allow_stop: true,
            ..youtube()
        };
        let router = router(MapDelegate::with_app(app));
        let response = router.handle(DialRequest::new(Method::GET, "/apps/YouTube")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("application/xml"));
        let info = AppInfo::from_tree(&parse_app_info(&response.body).unwrap()).unwrap();
        assert_eq!(info.state, AppState::Running);
        assert_eq!(info.link_href.as_deref(), Some("run"));
        assert!(info.allow_stop);
    }

    #[tokio::test]
    async fn test_dial_data_is_501() {
        let router = router(MapDelegate::with_app(youtube()));
        let response = router
            .handle(DialRequest::new(Method::POST, "/apps/YouTube/dial_data"))
            .await;
        assert_eq!(response.status, StatusCode::NOT_IMPLEMENTED);

        let response = router
            .handle(DialRequest::new(Method::POST, "/apps/Netflix/dial_data"))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_device_description() {
        let (router, _) = router_with(MapDelegate::default(), "/dial");
        let request = DialRequest::new(Method::GET, "/dial/ssdp/device-desc.xml")
            .with_header("host", "tv.local:8080")
            .with_header("x-forwarded-proto", "https");
        let response = router.handle(request).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("application/xml"));
        assert_eq!(
            response.header("application-url"),
            Some("https://tv.local:3000/dial/apps")
        );
        assert!(response.body.contains("<friendlyName>Test TV</friendlyName>"));
        assert!(response.body.contains("<UDN>uuid:uuid-1234</UDN>"));
    }

    #[rstest]
    #[case::not_found_endpoint(Method::GET, "/ssdp/notfound")]
    #[case::outside_prefix(Method::GET, "/other/apps")]
    #[case::prefix_lookalike(Method::GET, "/dialx/apps")]
    #[case::wrong_method(Method::PUT, "/dial/apps/YouTube")]
    #[tokio::test]
    async fn test_unrouted_is_404(#[case] method: Method, #[case] path: &str) {
        let (router, _) = router_with(MapDelegate::with_app(youtube()), "/dial");
        let response = router.handle(DialRequest::new(method, path)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preflight_is_204_with_methods() {
        let router = router(MapDelegate::default());
        let request = DialRequest::new(Method::OPTIONS, "/apps/YouTube")
            .with_header("origin", "app://remote");
        let response = router.handle(request).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(response.header("access-control-allow-origin"), Some("app://remote"));
        assert_eq!(
            response.header("access-control-allow-methods"),
            Some("GET,POST,DELETE,OPTIONS")
        );
    }

    #[rstest]
    #[case("192.168.1.20:3000", "192.168.1.20")]
    #[case("tv.local", "tv.local")]
    #[case("[::1]:3000", "[::1]")]
    fn test_host_without_port(#[case] host: &str, #[case] expected: &str) {
        assert_eq!(host_without_port(host), expected);
    }

    #[test]
    fn test_base_url_fallbacks() {
        let (router, _) = router_with(MapDelegate::default(), "");
        assert_eq!(router.base_url(&HeaderMap::new()), "http://localhost:3000");
    }
}
