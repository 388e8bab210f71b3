//! DIAL server: HTTP routes plus SSDP advertisement.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;

use dial_discovery::{device_location, Advertiser, AdvertiserConfig, AdvertiserEvent, SsdpTransport};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use warp::{Filter, Rejection};

use crate::config::ServerConfig;
use crate::delegate::AppDelegate;
use crate::error::{Result, ServerError};
use crate::http::dial_filter;
use crate::router::{DialResponse, DialRouter, RouterSettings};

struct Running {
    shutdown_tx: oneshot::Sender<()>,
    server_handle: JoinHandle<()>,
}

/// A DIAL server.
///
/// Owns the HTTP listener serving the DIAL routes and the [`Advertiser`]
/// announcing it.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use dial_discovery::UdpSsdpPeer;
/// use dial_server::{AppDelegate, DelegateError, DialServer, ServerConfig};
/// use dial_xml::AppResource;
///
/// struct Apps;
///
/// #[async_trait::async_trait]
/// impl AppDelegate for Apps {
///     async fn get_app(&self, name: &str) -> Option<AppResource> {
///         (name == "YouTube").then(|| AppResource::new(name))
///     }
///     async fn launch_app(&self, _: &str, _: Option<String>) -> Result<Option<String>, DelegateError> {
///         Ok(Some("run".to_string()))
///     }
///     async fn stop_app(&self, _: &str, _: &str) -> bool {
///         true
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> dial_server::Result<()> {
/// let (tx, _events) = mpsc::unbounded_channel();
/// let server = DialServer::new(
///     ServerConfig::new().with_port(3000).with_prefix("/dial"),
///     Arc::new(Apps),
///     Arc::new(UdpSsdpPeer::default()),
///     tx,
/// )?;
/// server.start().await?;
/// println!("Serving {}", server.base_url());
/// # Ok(())
/// # }
/// ```
pub struct DialServer {
    port: u16,
    uuid: String,
    prefix: String,
    host: Option<String>,
    router: Arc<DialRouter>,
    advertiser: Advertiser,
    running: Mutex<Option<Running>>,
}

impl DialServer {
    /// Validate `config` and prepare the server. Nothing is bound until [`start`](Self::start).
    ///
    /// With port 0 a free port is chosen now, so URLs are known before starting.
    pub fn new(
        config: ServerConfig,
        delegate: Arc<dyn AppDelegate>,
        transport: Arc<dyn SsdpTransport>,
        event_sender: UnboundedSender<AdvertiserEvent>,
    ) -> Result<Self> {
        config.validate()?;

        let port = match config.port {
            0 => find_available_port()
                .ok_or_else(|| ServerError::Bind("No free port available".to_string()))?,
            port => port,
        };
        let uuid = config
            .uuid
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let router = Arc::new(DialRouter::new(
            RouterSettings::from_config(&config, port, &uuid),
            delegate,
        ));
        let advertiser = Advertiser::new(
            transport,
            AdvertiserConfig {
                uuid: uuid.clone(),
                location: device_location(port, &config.prefix),
                extra_headers: config.scalar_extra_headers(),
            },
            event_sender,
        );

        Ok(Self {
            port,
            uuid,
            prefix: config.prefix,
            host: config.host,
            router,
            advertiser,
            running: Mutex::new(None),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Base URL of the DIAL routes, using the configured host or the local address.
    pub fn base_url(&self) -> String {
        let host = self
            .host
            .clone()
            .or_else(|| detect_local_ip().map(|ip| ip.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        format!("http://{}:{}{}", host, self.port, self.prefix)
    }

    /// The DIAL routes as a warp filter, for mounting into another warp server.
    pub fn routes(&self) -> impl Filter<Extract = (DialResponse,), Error = Rejection> + Clone {
        dial_filter(self.router.clone())
    }

    /// Bind the HTTP listener, then start advertising.
    pub async fn start(&self) -> Result<()> {
        if self.running.lock().is_some() {
            return Err(ServerError::AlreadyStarted);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port);
        let (addr, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(bind_addr, async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|e| ServerError::Bind(format!("{}: {}", bind_addr, e)))?;

        let server_handle = tokio::spawn(server);
        info!("DIAL server listening on {}", addr);

        if let Err(e) = self.advertiser.start().await {
            let _ = shutdown_tx.send(());
            let _ = server_handle.await;
            return Err(e.into());
        }

        *self.running.lock() = Some(Running {
            shutdown_tx,
            server_handle,
        });
        Ok(())
    }

    /// Say goodbye on every service type, then shut the HTTP listener down.
    pub async fn stop(&self) -> Result<()> {
        let running = self.running.lock().take().ok_or(ServerError::NotStarted)?;

        let advertised = self.advertiser.stop().await;
        if let Err(e) = &advertised {
            warn!("Advertiser shutdown failed: {}", e);
        }

        let _ = running.shutdown_tx.send(());
        let _ = running.server_handle.await;
        info!("DIAL server stopped");

        advertised.map_err(ServerError::from)
    }
}

/// Find a port the OS considers free right now.
fn find_available_port() -> Option<u16> {
    TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .ok()
}

/// Detect the local IP address used for outbound connections. No data is sent.
fn detect_local_ip() -> Option<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let local_addr = socket.local_addr().ok()?;
    Some(local_addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_available_port() {
        let port = find_available_port().unwrap();
        assert!(port > 0);
        assert!(TcpListener::bind(("0.0.0.0", port)).is_ok());
    }
}
