//! UDP multicast implementation of [`SsdpTransport`].
//!
//! The peer listens on the SSDP multicast group for NOTIFY and M-SEARCH
//! traffic and sends everything from a separate ephemeral socket, which is also
//! where unicast search replies arrive.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{DiscoveryError, Result};
use crate::message::{encode_notify, encode_response, encode_search, MessageKind, SsdpMessage};
use crate::transport::{SsdpTransport, TransportEvent};
use crate::types::{NotificationSubType, ServiceRecord, NETWORK_INTERFACE_ADDRESS_TOKEN};

/// Settings of the UDP transport.
#[derive(Debug, Clone)]
pub struct SsdpConfig {
    pub multicast_addr: Ipv4Addr,
    pub port: u16,
    /// Multicast hop limit
    pub ttl: u32,
    /// `MX` of outgoing searches
    pub mx: u8,
    /// `CACHE-CONTROL: max-age` of announcements and replies
    pub max_age: u32,
    /// `USER-AGENT` of outgoing searches
    pub user_agent: String,
}

impl Default for SsdpConfig {
    fn default() -> Self {
        Self {
            multicast_addr: Ipv4Addr::new(239, 255, 255, 250),
            port: 1900,
            ttl: 4,
            mx: 2,
            max_age: 1800,
            user_agent: format!("dial-rs/{} UPnP/1.1", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SsdpConfig {
    fn multicast_target(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(self.multicast_addr), self.port)
    }

    fn host_header(&self) -> String {
        format!("{}:{}", self.multicast_addr, self.port)
    }
}

struct PeerState {
    unicast: Arc<UdpSocket>,
    events: UnboundedSender<TransportEvent>,
    tasks: Vec<JoinHandle<()>>,
}

/// SSDP peer on the real network.
pub struct UdpSsdpPeer {
    config: SsdpConfig,
    state: Mutex<Option<PeerState>>,
}

impl UdpSsdpPeer {
    pub fn new(config: SsdpConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
        }
    }

    fn unicast(&self) -> Result<Arc<UdpSocket>> {
        self.state
            .lock()
            .as_ref()
            .map(|state| state.unicast.clone())
            .ok_or(DiscoveryError::NotStarted)
    }

    async fn send(&self, payload: String, target: SocketAddr) -> Result<()> {
        let socket = self.unicast()?;
        socket
            .send_to(payload.as_bytes(), target)
            .await
            .map_err(|e| DiscoveryError::Transport(format!("Failed to send to {}: {}", target, e)))?;
        Ok(())
    }

    async fn notify(&self, record: &ServiceRecord, nts: NotificationSubType) -> Result<()> {
        let target = self.config.multicast_target();
        let location = record.location.as_deref().map(|l| resolve_location(l, target));
        let message = encode_notify(
            record,
            nts,
            location.as_deref(),
            &self.config.host_header(),
            self.config.max_age,
        );
        self.send(message, target).await?;
        debug!("Sent NOTIFY {} for {}", nts, record.service_type);
        Ok(())
    }
}

impl Default for UdpSsdpPeer {
    fn default() -> Self {
        Self::new(SsdpConfig::default())
    }
}

#[async_trait]
impl SsdpTransport for UdpSsdpPeer {
    async fn start(&self, events: UnboundedSender<TransportEvent>) -> Result<()> {
        if self.state.lock().is_some() {
            return Err(DiscoveryError::AlreadyStarted);
        }

        let multicast = Arc::new(create_multicast_listener(&self.config)?);
        let unicast = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))
            .await
            .map_err(|e| DiscoveryError::Transport(format!("Failed to bind UDP socket: {}", e)))?;
        unicast
            .set_multicast_ttl_v4(self.config.ttl)
            .map_err(|e| DiscoveryError::Transport(format!("Failed to set multicast TTL: {}", e)))?;
        let unicast = Arc::new(unicast);

        let tasks = vec![
            tokio::spawn(receive_loop(multicast, events.clone())),
            tokio::spawn(receive_loop(unicast.clone(), events.clone())),
        ];

        *self.state.lock() = Some(PeerState {
            unicast,
            events: events.clone(),
            tasks,
        });

        info!("SSDP peer listening on {}", self.config.multicast_target());
        let _ = events.send(TransportEvent::Ready);
        Ok(())
    }

    async fn alive(&self, record: &ServiceRecord) -> Result<()> {
        self.notify(record, NotificationSubType::Alive).await
    }

    async fn byebye(&self, record: &ServiceRecord) -> Result<()> {
        self.notify(record, NotificationSubType::ByeBye).await
    }

    async fn search(&self, search_target: &str) -> Result<()> {
        let message = encode_search(
            search_target,
            &self.config.host_header(),
            self.config.mx,
            &self.config.user_agent,
        );
        self.send(message, self.config.multicast_target()).await?;
        debug!("Sent M-SEARCH for {}", search_target);
        Ok(())
    }

    async fn reply(&self, record: &ServiceRecord, address: SocketAddr) -> Result<()> {
        let location = record.location.as_deref().map(|l| resolve_location(l, address));
        let message = encode_response(record, location.as_deref(), self.config.max_age);
        self.send(message, address).await?;
        debug!("Sent search reply for {} to {}", record.service_type, address);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let state = self.state.lock().take().ok_or(DiscoveryError::NotStarted)?;
        for task in state.tasks {
            task.abort();
        }
        info!("SSDP peer closed");
        let _ = state.events.send(TransportEvent::Close);
        Ok(())
    }
}

/// Bind the shared SSDP port and join the multicast group.
fn create_multicast_listener(config: &SsdpConfig) -> Result<UdpSocket> {
    let transport_err = |e: std::io::Error| {
        DiscoveryError::Transport(format!("Failed to create multicast listener: {}", e))
    };

    let socket = socket2::Socket::new(
        socket2::Domain::IPV4,
        socket2::Type::DGRAM,
        Some(socket2::Protocol::UDP),
    )
    .map_err(transport_err)?;

    socket.set_reuse_address(true).map_err(transport_err)?;
    #[cfg(unix)]
    socket.set_reuse_port(true).map_err(transport_err)?;

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.port);
    socket.bind(&addr.into()).map_err(transport_err)?;
    socket
        .join_multicast_v4(&config.multicast_addr, &Ipv4Addr::UNSPECIFIED)
        .map_err(transport_err)?;
    socket.set_nonblocking(true).map_err(transport_err)?;

    let socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(socket).map_err(transport_err)
}

async fn receive_loop(socket: Arc<UdpSocket>, events: UnboundedSender<TransportEvent>) {
    let mut buffer = [0u8; 4096];
    loop {
        let (len, address) = match socket.recv_from(&mut buffer).await {
            Ok(received) => received,
            Err(e) => {
                warn!("SSDP receive failed: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let datagram = String::from_utf8_lossy(&buffer[..len]);
        let Some(event) = classify(&datagram, address) else {
            continue;
        };
        if events.send(event).is_err() {
            break;
        }
    }
}

/// Turn a datagram into the event it represents, if any.
fn classify(datagram: &str, address: SocketAddr) -> Option<TransportEvent> {
    let message = SsdpMessage::parse(datagram)?;
    match message.kind {
        MessageKind::Search => Some(TransportEvent::Search {
            search_target: message.search_target()?.to_string(),
            address,
        }),
        MessageKind::Notify => Some(TransportEvent::Notify {
            record: message.to_record()?,
            address,
        }),
        MessageKind::Response => Some(TransportEvent::Found {
            record: message.to_record()?,
            address,
        }),
    }
}

/// Replace the interface token with the local address used to reach `destination`.
fn resolve_location(location: &str, destination: SocketAddr) -> String {
    if !location.contains(NETWORK_INTERFACE_ADDRESS_TOKEN) {
        return location.to_string();
    }
    let address = outbound_address(destination).unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    location.replace(NETWORK_INTERFACE_ADDRESS_TOKEN, &address.to_string())
}

/// Local interface address the OS routes `destination` through. No data is sent.
fn outbound_address(destination: SocketAddr) -> Option<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(destination).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}
