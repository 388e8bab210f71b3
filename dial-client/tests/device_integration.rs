//! DialDevice against a mocked DIAL server.

use dial_client::{ClientError, DialDevice};
use dial_xml::{render_app_resource, render_device_descriptor, AppResource, AppState, DeviceDescriptor, Icon};
use mockito::{Matcher, Server, ServerGuard};
use rstest::rstest;

fn descriptor_xml(url_base: &str) -> String {
    render_device_descriptor(&DeviceDescriptor {
        uuid: "2fac1234-31f8-11b4-a222-08002b34c003".to_string(),
        friendly_name: "Kitchen Display".to_string(),
        manufacturer: "ACME".to_string(),
        model_name: "Screen 3000".to_string(),
        url_base: url_base.to_string(),
        icons: vec![Icon {
            mime_type: Some("image/png".to_string()),
            width: Some(48),
            height: Some(48),
            depth: Some(24),
            url: Some("/icon.png".to_string()),
        }],
    })
}

async fn resolved_device(server: &mut ServerGuard) -> DialDevice {
    let apps = format!("{}/apps/", server.url());
    server
        .mock("GET", "/ssdp/device-desc.xml")
        .with_status(200)
        .with_header("application-url", &apps)
        .with_header("content-type", "application/xml")
        .with_body(descriptor_xml(&server.url()))
        .create_async()
        .await;

    DialDevice::resolve(
        &reqwest::Client::new(),
        &format!("{}/ssdp/device-desc.xml", server.url()),
    )
    .await
    .expect("Failed to resolve device")
}

#[tokio::test]
async fn test_resolve_device() {
    let mut server = Server::new_async().await;
    let device = resolved_device(&mut server).await;

    assert_eq!(device.application_url(), format!("{}/apps", server.url()));
    assert_eq!(device.friendly_name(), Some("Kitchen Display"));
    assert_eq!(device.manufacturer(), Some("ACME"));
    assert_eq!(device.model_name(), Some("Screen 3000"));
    assert_eq!(device.udn(), Some("uuid:2fac1234-31f8-11b4-a222-08002b34c003"));
    assert_eq!(device.device_type(), Some("urn:dial-multiscreen-org:device:dial:1"));

    let icons = device.icons();
    assert_eq!(icons.len(), 1);
    assert_eq!(icons[0].width, Some(48));
    assert_eq!(icons[0].url.as_deref(), Some("/icon.png"));
}

#[tokio::test]
async fn test_resolve_without_application_url() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ssdp/device-desc.xml")
        .with_status(200)
        .with_body(descriptor_xml(&server.url()))
        .create_async()
        .await;

    let err = DialDevice::resolve(
        &reqwest::Client::new(),
        &format!("{}/ssdp/device-desc.xml", server.url()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ClientError::DescriptorUnavailable { .. }));
    assert_eq!(err.status_code(), Some(200));
}

#[tokio::test]
async fn test_resolve_error_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ssdp/device-desc.xml")
        .with_status(500)
        .with_header("application-url", "http://127.0.0.1/apps")
        .create_async()
        .await;

    let err = DialDevice::resolve(
        &reqwest::Client::new(),
        &format!("{}/ssdp/device-desc.xml", server.url()),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), Some(500));
}

#[rstest]
#[case::malformed("<root><device>")]
#[case::no_device("<root xmlns=\"urn:schemas-upnp-org:device-1-0\"><URLBase>x</URLBase></root>")]
#[tokio::test]
async fn test_resolve_bad_descriptor(#[case] body: &str) {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ssdp/device-desc.xml")
        .with_status(200)
        .with_header("application-url", "http://127.0.0.1/apps")
        .with_body(body)
        .create_async()
        .await;

    let err = DialDevice::resolve(
        &reqwest::Client::new(),
        &format!("{}/ssdp/device-desc.xml", server.url()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ClientError::Parse(_)));
}

#[rstest]
#[case("")]
#[case("not a url")]
#[tokio::test]
async fn test_resolve_invalid_url(#[case] url: &str) {
    let err = DialDevice::resolve(&reqwest::Client::new(), url).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_get_app_info() {
    let mut server = Server::new_async().await;
    let device = resolved_device(&mut server).await;

    let app = AppResource {
        pid: Some("run".to_string()),
        allow_stop: true,
        additional_data: Some(vec![("dial:token".to_string(), "abc".to_string())]),
        namespaces: [("dial".to_string(), "urn:example".to_string())].into_iter().collect(),
        ..AppResource::new("YouTube")
    };
    server
        .mock("GET", "/apps/YouTube")
        .with_status(200)
        .with_body(render_app_resource(&app.description("YouTube")))
        .create_async()
        .await;

    let tree = device.get_app_info("YouTube").await.unwrap();
    assert_eq!(tree.text_at(&["state"]), Some("running"));
    assert_eq!(tree.text_at(&["additionalData", "token"]), Some("abc"));

    let info = device.get_app("YouTube").await.unwrap();
    assert_eq!(info.state, AppState::Running);
    assert!(info.allow_stop);
    assert_eq!(info.link_href.as_deref(), Some("run"));
}

#[tokio::test]
async fn test_get_app_info_unavailable() {
    let mut server = Server::new_async().await;
    let device = resolved_device(&mut server).await;
    server
        .mock("GET", "/apps/Missing")
        .with_status(404)
        .create_async()
        .await;

    let err = device.get_app_info_xml("Missing").await.unwrap_err();
    assert!(matches!(err, ClientError::AppInfoUnavailable { status_code: 404 }));
}

#[tokio::test]
async fn test_launch_app_sends_payload() {
    let mut server = Server::new_async().await;
    let device = resolved_device(&mut server).await;
    let launch = server
        .mock("POST", "/apps/YouTube")
        .match_header("content-type", "text/plain; charset=\"utf-8\"")
        .match_header("content-length", "7")
        .match_body("v=12345")
        .with_status(201)
        .with_header("location", "http://127.0.0.1/apps/YouTube/run")
        .with_body("launched")
        .create_async()
        .await;

    let body = device.launch_app("YouTube", Some("v=12345"), None).await.unwrap();
    assert_eq!(body, "launched");
    launch.assert_async().await;
}

#[tokio::test]
async fn test_launch_app_without_payload() {
    let mut server = Server::new_async().await;
    let device = resolved_device(&mut server).await;
    let launch = server
        .mock("POST", "/apps/YouTube")
        .match_header("content-type", "application/json")
        .match_header("content-length", "0")
        .with_status(200)
        .create_async()
        .await;

    device
        .launch_app("YouTube", None, Some("application/json"))
        .await
        .unwrap();
    launch.assert_async().await;
}

#[rstest]
#[case(404)]
#[case(413)]
#[case(503)]
#[tokio::test]
async fn test_launch_app_failure(#[case] status: usize) {
    let mut server = Server::new_async().await;
    let device = resolved_device(&mut server).await;
    server
        .mock("POST", "/apps/YouTube")
        .with_status(status)
        .create_async()
        .await;

    let err = device.launch_app("YouTube", Some("x"), None).await.unwrap_err();
    assert_eq!(err.status_code(), Some(status as u16));
}

#[rstest]
#[case(200)]
#[case(400)]
#[case(405)]
#[tokio::test]
async fn test_stop_app_reports_status(#[case] status: usize) {
    let mut server = Server::new_async().await;
    let device = resolved_device(&mut server).await;
    server
        .mock("DELETE", "/apps/YouTube/run")
        .with_status(status)
        .create_async()
        .await;

    assert_eq!(device.stop_app("YouTube", "run").await.unwrap(), status as u16);
}

#[tokio::test]
async fn test_empty_arguments_make_no_request() {
    let mut server = Server::new_async().await;
    let device = resolved_device(&mut server).await;
    let mut untouched = Vec::new();
    for method in ["GET", "POST", "DELETE"] {
        untouched.push(
            server
                .mock(method, Matcher::Regex("^/apps".to_string()))
                .expect(0)
                .create_async()
                .await,
        );
    }

    assert!(matches!(
        device.get_app_info_xml("").await,
        Err(ClientError::InvalidArgument(_))
    ));
    assert!(matches!(
        device.launch_app("", None, None).await,
        Err(ClientError::InvalidArgument(_))
    ));
    assert!(matches!(
        device.stop_app("YouTube", "").await,
        Err(ClientError::InvalidArgument(_))
    ));
    for mock in untouched {
        mock.assert_async().await;
    }
}
