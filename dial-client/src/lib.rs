//! DIAL client.
//!
//! Finds DIAL devices over SSDP and drives their applications over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use dial_client::{ClientConfig, DialClient};
//! use dial_discovery::{ObserverEvent, UdpSsdpPeer};
//!
//! # #[tokio::main]
//! # async fn main() -> dial_client::Result<()> {
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let client = DialClient::new(Arc::new(UdpSsdpPeer::default()), tx, ClientConfig::default())?;
//! client.start().await?;
//!
//! while let Some(event) = rx.recv().await {
//!     if let ObserverEvent::Found { location, .. } = event {
//!         let device = client.get_dial_device(&location).await?;
//!         let app = device.get_app("YouTube").await?;
//!         println!("{:?}: YouTube is {}", device.friendly_name(), app.state);
//!         device.launch_app("YouTube", Some("v=YE7VzlLtp-4"), None).await?;
//!         break;
//!     }
//! }
//! client.stop().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod device;
mod error;

pub use client::DialClient;
pub use config::ClientConfig;
pub use device::DialDevice;
pub use error::{ClientError, Result};
