//! DIAL server exposing one in-memory "YouTube" application
//!
//! Launching only records the launch URL it would open; stopping clears it.
//! The server advertises itself over SSDP until Ctrl+C.
//!
//! Run with: DIAL_LOG_MODE=development cargo run -p dial --example dial_server

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dial::{
    AppDelegate, AppResource, AppState, CorsOrigins, DelegateError, DialError, DialServer,
    ServerConfig, UdpSsdpPeer,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

const PORT: u16 = 3000;

struct DemoApps {
    apps: Mutex<HashMap<String, AppResource>>,
}

impl DemoApps {
    fn new() -> Self {
        let youtube = AppResource {
            state: Some(AppState::Stopped),
            allow_stop: true,
            ..AppResource::new("YouTube")
        };
        Self {
            apps: Mutex::new(HashMap::from([(youtube.name.clone(), youtube)])),
        }
    }
}

#[async_trait]
impl AppDelegate for DemoApps {
    async fn get_app(&self, name: &str) -> Option<AppResource> {
        self.apps.lock().get(name).cloned()
    }

    async fn launch_app(&self, name: &str, payload: Option<String>) -> Result<Option<String>, DelegateError> {
        let mut apps = self.apps.lock();
        let app = apps
            .get_mut(name)
            .ok_or_else(|| DelegateError::Unavailable(name.to_string()))?;

        let url = format!("http://www.youtube.com/tv?{}", payload.unwrap_or_default());
        println!("Launching {} -> {}", name, url);

        app.pid = Some("run".to_string());
        app.state = Some(AppState::Running);
        Ok(app.pid.clone())
    }

    async fn stop_app(&self, name: &str, pid: &str) -> bool {
        let mut apps = self.apps.lock();
        match apps.get_mut(name) {
            Some(app) if app.pid.as_deref() == Some(pid) => {
                println!("Stopping {} ({})", name, pid);
                app.pid = None;
                app.state = Some(AppState::Stopped);
                true
            }
            _ => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), DialError> {
    dial::logging::init_logging_from_env()?;

    let mut config = ServerConfig::new()
        .with_port(PORT)
        .with_prefix("/dial")
        .with_friendly_name("My PC")
        .with_cors_allow_origins(CorsOrigins::Any);
    config.manufacturer = "Example Corp".to_string();
    config.model_name = "DIAL Demo Server".to_string();

    let (tx, mut events) = mpsc::unbounded_channel();
    let server = DialServer::new(
        config,
        Arc::new(DemoApps::new()),
        Arc::new(UdpSsdpPeer::default()),
        tx,
    )?;

    server.start().await?;
    println!("DIAL server running at {}", server.base_url());
    println!("Device description: {}/ssdp/device-desc.xml", server.base_url());
    println!("Press Ctrl+C to stop");

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("Advertiser: {:?}", event);
        }
    });

    let _ = tokio::signal::ctrl_c().await;
    println!("\nShutting down...");
    server.stop().await?;
    Ok(())
}
