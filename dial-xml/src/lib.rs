//! # dial-xml
//!
//! Rendering and parsing of the two XML documents spoken by DIAL:
//!
//! - the UPnP device descriptor served at `/ssdp/device-desc.xml`
//! - the application description served at `/apps/{name}`
//!
//! Rendering works from the typed entity model; parsing produces a generic
//! [`XmlValue`] tree so vendor extensions are preserved.
//!
//! ## Usage
//!
//! ```rust
//! use dial_xml::{parse_app_info, render_app_resource, AppInfo, AppResource, AppState};
//!
//! let app = AppResource {
//!     state: Some(AppState::Running),
//!     pid: Some("run".to_string()),
//!     allow_stop: true,
//!     ..AppResource::new("YouTube")
//! };
//! let xml = render_app_resource(&app.description("YouTube"));
//!
//! let info = AppInfo::from_tree(&parse_app_info(&xml).unwrap()).unwrap();
//! assert_eq!(info.state, AppState::Running);
//! assert_eq!(info.link_href.as_deref(), Some("run"));
//! ```

pub mod error;
pub mod model;
pub mod render;
pub mod tree;

pub use error::{Result, XmlError};
pub use model::{AppDescription, AppInfo, AppResource, AppState, DeviceDescriptor, Icon, Link};
pub use render::{
    render_app_resource, render_device_descriptor, DIAL_DEVICE_TYPE, DIAL_SERVICE_TYPE,
    DIAL_VERSION, DIAL_XML_NAMESPACE, UPNP_DEVICE_NAMESPACE,
};
pub use tree::{parse_app_info, parse_device_descriptor, XmlValue, TEXT_KEY};
