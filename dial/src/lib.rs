//! # DIAL for Rust
//!
//! DIAL (Discovery and Launch) lets a second-screen client find devices on the
//! local network and start, query and stop named applications on them.
//!
//! This crate bundles both sides:
//!
//! - **Server**: [`DialServer`] exposes the applications of an [`AppDelegate`]
//!   over HTTP and advertises them over SSDP
//! - **Client**: [`DialClient`] discovers devices and resolves them into
//!   [`DialDevice`] handles
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use dial::{ClientConfig, DialClient, DialError, ObserverEvent, UdpSsdpPeer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DialError> {
//!     dial::logging::init_logging_from_env()?;
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     let client = DialClient::new(Arc::new(UdpSsdpPeer::default()), tx, ClientConfig::default())?;
//!     client.start().await?;
//!
//!     while let Some(event) = rx.recv().await {
//!         if let ObserverEvent::Found { location, .. } = event {
//!             let device = client.get_dial_device(&location).await?;
//!             println!("Found {:?} at {}", device.friendly_name(), device.application_url());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! dial (facade, logging)
//!     ↓
//! dial-server (router, warp, advertiser)    dial-client (device handle, observer)
//!     ↓                                         ↓
//! dial-discovery (SSDP transport, advertiser, observer)
//!     ↓
//! dial-xml (descriptors)
//! ```

mod error;
pub mod logging;

pub use error::DialError;

pub use dial_client::{ClientConfig, ClientError, DialClient, DialDevice};
pub use dial_discovery::{
    Advertiser, AdvertiserConfig, AdvertiserEvent, DiscoveryError, DiscoveryObserver,
    ObserverEvent, ServiceRecord, SsdpConfig, SsdpTransport, TransportEvent, UdpSsdpPeer,
    DIAL_DEVICE_TYPE, DIAL_SERVICE_TYPE,
};
pub use dial_server::{
    AppDelegate, CorsOrigins, DelegateError, DialRouter, DialServer, ServerConfig, ServerError,
};
pub use dial_xml::{AppInfo, AppResource, AppState, Icon, XmlError, XmlValue};

/// Crate re-exports for direct access to every layer.
pub mod xml {
    pub use dial_xml::*;
}

pub mod discovery {
    pub use dial_discovery::*;
}

pub mod server {
    pub use dial_server::*;
}

pub mod client {
    pub use dial_client::*;
}
