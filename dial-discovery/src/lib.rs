//! SSDP advertisement and discovery for DIAL.
//!
//! The [`Advertiser`] announces a DIAL server under its five service types and
//! answers searches for them. The [`DiscoveryObserver`] searches for DIAL devices
//! and tracks them by description URL. Both talk to the network only through the
//! [`SsdpTransport`] trait; [`UdpSsdpPeer`] is the multicast implementation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use dial_discovery::{DiscoveryObserver, ObserverEvent, UdpSsdpPeer};
//!
//! # #[tokio::main]
//! # async fn main() -> dial_discovery::Result<()> {
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let observer = DiscoveryObserver::new(Arc::new(UdpSsdpPeer::default()), tx);
//! observer.start().await?;
//!
//! while let Some(event) = rx.recv().await {
//!     if let ObserverEvent::Found { location, .. } = event {
//!         println!("DIAL device at {}", location);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod advertiser;
mod error;
pub mod message;
mod observer;
mod ssdp;
mod transport;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use advertiser::{Advertiser, AdvertiserConfig, AdvertiserEvent};
pub use error::{DiscoveryError, Result};
pub use observer::{DiscoveryCache, DiscoveryObserver, ObserverEvent};
pub use ssdp::{SsdpConfig, UdpSsdpPeer};
pub use transport::{SsdpTransport, TransportEvent};
pub use types::{
    advertised_service_types, device_location, merge_headers, scalar_headers, server_banner, usn,
    NotificationSubType, ServiceRecord, DIAL_DEVICE_TYPE, DIAL_SERVICE_TYPE,
    NETWORK_INTERFACE_ADDRESS_TOKEN, ROOT_DEVICE, SSDP_ALL, UPNP_BOOT_ID,
};
