//! DIAL server.
//!
//! Serves the DIAL REST interface for the applications an [`AppDelegate`] owns:
//!
//! - `GET /ssdp/device-desc.xml` returns the UPnP device descriptor with an
//!   `Application-URL` header
//! - `GET /apps/{name}` describes an application
//! - `POST /apps/{name}` launches it, `DELETE /apps/{name}/{pid}` stops it
//!
//! and advertises itself over SSDP while running. All routes live under the
//! configured prefix.
//!
//! [`DialRouter`] holds the routing logic without any HTTP server, [`dial_filter`]
//! adapts it to warp and [`DialServer`] ties the listener to the
//! [`Advertiser`](dial_discovery::Advertiser).

pub mod body;
pub mod config;
pub mod cors;
mod delegate;
mod error;
pub mod http;
pub mod router;
mod server;

pub use config::{CorsOrigins, ServerConfig};
pub use delegate::AppDelegate;
pub use error::{DelegateError, Result, ServerError};
pub use http::dial_filter;
pub use router::{DialRequest, DialResponse, DialRouter, RouterSettings};
pub use server::DialServer;
