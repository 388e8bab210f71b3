//! Transport seam between the discovery logic and the network.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Result;
use crate::types::ServiceRecord;

/// Events reported by a transport after [`SsdpTransport::start`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Sockets are open; sends will now succeed
    Ready,
    /// A unicast reply to one of our searches
    Found {
        record: ServiceRecord,
        address: SocketAddr,
    },
    /// A multicast NOTIFY from some device
    Notify {
        record: ServiceRecord,
        address: SocketAddr,
    },
    /// Someone searched the network
    Search {
        search_target: String,
        address: SocketAddr,
    },
    /// The transport shut down; no further events follow
    Close,
}

/// SSDP send/receive operations the advertiser and observer rely on.
///
/// Locations in outgoing records may contain
/// [`NETWORK_INTERFACE_ADDRESS_TOKEN`](crate::NETWORK_INTERFACE_ADDRESS_TOKEN),
/// which the transport resolves at send time.
#[async_trait]
pub trait SsdpTransport: Send + Sync + 'static {
    /// Open the transport. Events are delivered on `events` until `Close`.
    async fn start(&self, events: UnboundedSender<TransportEvent>) -> Result<()>;

    /// Multicast an `ssdp:alive` announcement.
    async fn alive(&self, record: &ServiceRecord) -> Result<()>;

    /// Multicast an `ssdp:byebye` announcement.
    async fn byebye(&self, record: &ServiceRecord) -> Result<()>;

    /// Multicast an M-SEARCH for `search_target`.
    async fn search(&self, search_target: &str) -> Result<()>;

    /// Unicast a search reply to `address`.
    async fn reply(&self, record: &ServiceRecord, address: SocketAddr) -> Result<()>;

    /// Stop receiving and emit [`TransportEvent::Close`].
    async fn close(&self) -> Result<()>;
}
