//! Service records and the constants shared by advertiser and observer.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::DiscoveryError;

/// DIAL service type, also the second search issued by observers.
pub const DIAL_SERVICE_TYPE: &str = "urn:dial-multiscreen-org:service:dial:1";
/// DIAL device type, searched for first by observers.
pub const DIAL_DEVICE_TYPE: &str = "urn:dial-multiscreen-org:device:dial:1";
pub const ROOT_DEVICE: &str = "upnp:rootdevice";
pub const SSDP_ALL: &str = "ssdp:all";

/// Placeholder inside a record's location, replaced by the transport with the
/// address of the interface a datagram leaves through.
pub const NETWORK_INTERFACE_ADDRESS_TOKEN: &str = "{{networkInterfaceAddress}}";

/// Value of `CONFIGID.UPNP.ORG` and `BOOTID.UPNP.ORG` in search replies.
pub const UPNP_BOOT_ID: &str = "7337";

/// `NTS` header of a NOTIFY message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationSubType {
    Alive,
    ByeBye,
}

impl NotificationSubType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationSubType::Alive => "ssdp:alive",
            NotificationSubType::ByeBye => "ssdp:byebye",
        }
    }
}

impl fmt::Display for NotificationSubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationSubType {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("ssdp:alive") => Ok(NotificationSubType::Alive),
            v if v.eq_ignore_ascii_case("ssdp:byebye") => Ok(NotificationSubType::ByeBye),
            other => Err(DiscoveryError::Parse(format!("Unknown NTS value: {other}"))),
        }
    }
}

/// One advertised service of a device, or one received announcement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceRecord {
    /// `NT` on announcements, `ST` on search replies
    pub service_type: String,
    pub usn: String,
    /// Description URL, possibly containing [`NETWORK_INTERFACE_ADDRESS_TOKEN`]
    pub location: Option<String>,
    pub server: Option<String>,
    /// Set on received NOTIFY messages
    pub nts: Option<NotificationSubType>,
    pub config_id: Option<String>,
    pub boot_id: Option<String>,
    /// Additional headers; never override the base headers
    pub extra_headers: Vec<(String, String)>,
}

impl ServiceRecord {
    /// Record advertising `service_type` for the device `uuid`.
    pub fn advertised(uuid: &str, service_type: &str, location: &str) -> Self {
        Self {
            service_type: service_type.to_string(),
            usn: usn(uuid, service_type),
            location: Some(location.to_string()),
            server: Some(server_banner()),
            ..Default::default()
        }
    }

    /// Case-insensitive lookup of an extra header.
    pub fn extra_header(&self, name: &str) -> Option<&str> {
        self.extra_headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// `uuid:{uuid}::{service_type}`
pub fn usn(uuid: &str, service_type: &str) -> String {
    format!("uuid:{}::{}", uuid, service_type)
}

/// The five service types a DIAL server announces, in announcement order.
pub fn advertised_service_types(uuid: &str) -> Vec<String> {
    vec![
        DIAL_SERVICE_TYPE.to_string(),
        DIAL_DEVICE_TYPE.to_string(),
        ROOT_DEVICE.to_string(),
        SSDP_ALL.to_string(),
        format!("uuid:{}", uuid),
    ]
}

/// `SERVER` header value: `{os}/{arch} UPnP/1.1 dial-rs/{version}`
pub fn server_banner() -> String {
    format!(
        "{}/{} UPnP/1.1 dial-rs/{}",
        std::env::consts::OS,
        std::env::consts::ARCH,
        env!("CARGO_PKG_VERSION")
    )
}

/// Description URL announced for a server listening on `port` under `prefix`.
pub fn device_location(port: u16, prefix: &str) -> String {
    format!(
        "http://{}:{}{}/ssdp/device-desc.xml",
        NETWORK_INTERFACE_ADDRESS_TOKEN, port, prefix
    )
}

/// Keep the scalar entries of a JSON header map, rendered as header values.
///
/// Strings, numbers and booleans survive; arrays, objects and nulls are dropped.
pub fn scalar_headers<'a>(
    headers: impl IntoIterator<Item = (&'a String, &'a Value)>,
) -> Vec<(String, String)> {
    headers
        .into_iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

/// Append `extra` headers whose names are not already in `base`.
pub fn merge_headers(base: &mut Vec<(String, String)>, extra: &[(String, String)]) {
    for (key, value) in extra {
        if !base.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(key)) {
            base.push((key.clone(), value.clone()));
        }
    }
}
