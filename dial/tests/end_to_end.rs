//! A DIAL client driving a DIAL server over real HTTP.
//!
//! SSDP runs over in-memory transports: the server's announcement is handed to
//! the client as a search response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dial::discovery::testing::{MemoryTransport, Sent};
use dial::discovery::NETWORK_INTERFACE_ADDRESS_TOKEN;
use dial::{
    AdvertiserEvent, AppDelegate, AppResource, AppState, ClientConfig, ClientError, DelegateError,
    DialClient, DialServer, ObserverEvent, ServerConfig, DIAL_SERVICE_TYPE,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Default)]
struct Player {
    pid: Mutex<Option<String>>,
}

#[async_trait]
impl AppDelegate for Player {
    async fn get_app(&self, name: &str) -> Option<AppResource> {
        (name == "YouTube").then(|| AppResource {
            pid: self.pid.lock().clone(),
            allow_stop: true,
            additional_data: Some(vec![("screen".to_string(), "tv".to_string())]),
            ..AppResource::new(name)
        })
    }

    async fn launch_app(&self, _name: &str, _payload: Option<String>) -> Result<Option<String>, DelegateError> {
        *self.pid.lock() = Some("run".to_string());
        Ok(Some("run".to_string()))
    }

    async fn stop_app(&self, _name: &str, pid: &str) -> bool {
        let mut current = self.pid.lock();
        if current.as_deref() == Some(pid) {
            *current = None;
            true
        } else {
            false
        }
    }
}

#[tokio::test]
async fn test_discover_launch_and_stop() {
    // Server
    let server_transport = Arc::new(MemoryTransport::new());
    let (server_tx, mut server_events) = mpsc::unbounded_channel();
    let server = DialServer::new(
        ServerConfig::new().with_prefix("/dial").with_friendly_name("Living Room TV"),
        Arc::new(Player::default()),
        server_transport.clone(),
        server_tx,
    )
    .unwrap();
    server.start().await.unwrap();
    let ready = timeout(Duration::from_secs(1), server_events.recv()).await.unwrap();
    assert_eq!(ready, Some(AdvertiserEvent::Ready));

    let announced = server_transport
        .sent()
        .into_iter()
        .find_map(|sent| match sent {
            Sent::Alive(record) if record.service_type == DIAL_SERVICE_TYPE => Some(record),
            _ => None,
        })
        .expect("DIAL service was not announced");

    // Client
    let client_transport = Arc::new(MemoryTransport::new());
    let (client_tx, mut client_events) = mpsc::unbounded_channel();
    let client = DialClient::new(client_transport.clone(), client_tx, ClientConfig::default()).unwrap();
    client.start().await.unwrap();
    assert!(matches!(
        timeout(Duration::from_secs(1), client_events.recv()).await.unwrap(),
        Some(ObserverEvent::Ready)
    ));

    let mut record = announced.clone();
    record.location = record
        .location
        .map(|location| location.replace(NETWORK_INTERFACE_ADDRESS_TOKEN, "127.0.0.1"));
    client_transport.inject_found(record, "127.0.0.1:1900".parse().unwrap());

    let location = match timeout(Duration::from_secs(1), client_events.recv()).await.unwrap() {
        Some(ObserverEvent::Found { location, .. }) => location,
        other => panic!("expected a found device, got {:?}", other),
    };
    assert_eq!(
        location,
        format!("http://127.0.0.1:{}/dial/ssdp/device-desc.xml", server.port())
    );

    // HTTP
    let device = client.get_dial_device(&location).await.unwrap();
    assert_eq!(device.friendly_name(), Some("Living Room TV"));
    assert_eq!(
        device.application_url(),
        format!("http://127.0.0.1:{}/dial/apps", server.port())
    );

    let info = device.get_app("YouTube").await.unwrap();
    assert_eq!(info.state, AppState::Stopped);
    assert_eq!(info.additional_data, vec![("screen".to_string(), "tv".to_string())]);

    device
        .launch_app("YouTube", Some("v=YE7VzlLtp-4"), None)
        .await
        .unwrap();
    let info = device.get_app("YouTube").await.unwrap();
    assert_eq!(info.state, AppState::Running);
    assert_eq!(info.link_href.as_deref(), Some("run"));

    assert_eq!(device.stop_app("YouTube", "run").await.unwrap(), 200);
    assert_eq!(device.stop_app("YouTube", "run").await.unwrap(), 400);

    let missing = device.get_app_info_xml("Netflix").await.unwrap_err();
    assert!(matches!(missing, ClientError::AppInfoUnavailable { status_code: 404 }));

    // Shutdown
    client.stop().await.unwrap();
    server.stop().await.unwrap();
    assert_eq!(
        server_transport.completion_log().last().map(String::as_str),
        Some("close")
    );
}
