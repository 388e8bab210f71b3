//! SSDP datagram encoding and parsing.
//!
//! Messages are HTTP-over-UDP: a start line, `NAME: value` headers and a blank
//! line, all separated by CRLF.

use crate::types::{merge_headers, NotificationSubType, ServiceRecord};

/// Kind of datagram, decided by its start line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// `NOTIFY * HTTP/1.1`
    Notify,
    /// `M-SEARCH * HTTP/1.1`
    Search,
    /// `HTTP/1.1 200 OK`
    Response,
}

/// A parsed SSDP datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct SsdpMessage {
    pub kind: MessageKind,
    /// Headers in wire order, names as received
    pub headers: Vec<(String, String)>,
}

/// Headers that describe the datagram itself rather than the service.
const TRANSPORT_HEADERS: &[&str] = &["HOST", "CACHE-CONTROL", "EXT", "MAN", "MX", "DATE", "USER-AGENT"];

impl SsdpMessage {
    /// Parse a datagram, returning `None` for anything that is not SSDP.
    pub fn parse(datagram: &str) -> Option<Self> {
        let mut lines = datagram.lines();
        let start_line = lines.next()?.trim();

        let kind = if start_line.starts_with("NOTIFY ") {
            MessageKind::Notify
        } else if start_line.starts_with("M-SEARCH ") {
            MessageKind::Search
        } else if start_line.starts_with("HTTP/1.") && start_line.split_whitespace().nth(1) == Some("200") {
            MessageKind::Response
        } else {
            return None;
        };

        let headers = lines
            .map(str::trim)
            .take_while(|line| !line.is_empty())
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Some(Self { kind, headers })
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Service record carried by a NOTIFY or search response.
    ///
    /// Requires a service type (`NT` or `ST`) and a `USN`.
    pub fn to_record(&self) -> Option<ServiceRecord> {
        let type_header = match self.kind {
            MessageKind::Notify => "NT",
            MessageKind::Response => "ST",
            MessageKind::Search => return None,
        };
        let service_type = self.header(type_header)?.to_string();
        let usn = self.header("USN")?.to_string();

        let base = [type_header, "USN", "LOCATION", "SERVER", "NTS", "CONFIGID.UPNP.ORG", "BOOTID.UPNP.ORG"];
        let extra_headers = self
            .headers
            .iter()
            .filter(|(key, _)| {
                !base.iter().chain(TRANSPORT_HEADERS).any(|known| key.eq_ignore_ascii_case(known))
            })
            .cloned()
            .collect();

        Some(ServiceRecord {
            service_type,
            usn,
            location: self.header("LOCATION").map(str::to_string),
            server: self.header("SERVER").map(str::to_string),
            nts: self.header("NTS").and_then(|nts| nts.parse().ok()),
            config_id: self.header("CONFIGID.UPNP.ORG").map(str::to_string),
            boot_id: self.header("BOOTID.UPNP.ORG").map(str::to_string),
            extra_headers,
        })
    }

    /// `ST` of an M-SEARCH request.
    pub fn search_target(&self) -> Option<&str> {
        match self.kind {
            MessageKind::Search => self.header("ST"),
            _ => None,
        }
    }
}

/// NOTIFY announcement for `record`, with its location already resolved.
///
/// `ssdp:byebye` keeps `LOCATION` so observers can match it to the alive.
pub fn encode_notify(
    record: &ServiceRecord,
    nts: NotificationSubType,
    location: Option<&str>,
    host: &str,
    max_age: u32,
) -> String {
    let mut headers = vec![("HOST".to_string(), host.to_string())];
    if nts == NotificationSubType::Alive {
        headers.push(("CACHE-CONTROL".to_string(), format!("max-age={}", max_age)));
    }
    if let Some(location) = location {
        headers.push(("LOCATION".to_string(), location.to_string()));
    }
    headers.push(("NT".to_string(), record.service_type.clone()));
    headers.push(("NTS".to_string(), nts.as_str().to_string()));
    if nts == NotificationSubType::Alive {
        if let Some(server) = &record.server {
            headers.push(("SERVER".to_string(), server.clone()));
        }
    }
    headers.push(("USN".to_string(), record.usn.clone()));
    merge_headers(&mut headers, &record.extra_headers);

    render("NOTIFY * HTTP/1.1", &headers)
}

/// M-SEARCH request for `search_target`.
pub fn encode_search(search_target: &str, host: &str, mx: u8, user_agent: &str) -> String {
    let headers = vec![
        ("HOST".to_string(), host.to_string()),
        ("MAN".to_string(), "\"ssdp:discover\"".to_string()),
        ("MX".to_string(), mx.to_string()),
        ("ST".to_string(), search_target.to_string()),
        ("USER-AGENT".to_string(), user_agent.to_string()),
    ];
    render("M-SEARCH * HTTP/1.1", &headers)
}

/// Unicast reply to an M-SEARCH, with its location already resolved.
pub fn encode_response(record: &ServiceRecord, location: Option<&str>, max_age: u32) -> String {
    let mut headers = vec![
        ("CACHE-CONTROL".to_string(), format!("max-age={}", max_age)),
        ("EXT".to_string(), String::new()),
    ];
    if let Some(location) = location {
        headers.push(("LOCATION".to_string(), location.to_string()));
    }
    if let Some(server) = &record.server {
        headers.push(("SERVER".to_string(), server.clone()));
    }
    headers.push(("ST".to_string(), record.service_type.clone()));
    headers.push(("USN".to_string(), record.usn.clone()));
    if let Some(config_id) = &record.config_id {
        headers.push(("CONFIGID.UPNP.ORG".to_string(), config_id.clone()));
    }
    if let Some(boot_id) = &record.boot_id {
        headers.push(("BOOTID.UPNP.ORG".to_string(), boot_id.clone()));
    }
    merge_headers(&mut headers, &record.extra_headers);

    render("HTTP/1.1 200 OK", &headers)
}

fn render(start_line: &str, headers: &[(String, String)]) -> String {
    let mut message = format!("{}\r\n", start_line);
    for (name, value) in headers {
        if value.is_empty() {
            message.push_str(&format!("{}:\r\n", name));
        } else {
            message.push_str(&format!("{}: {}\r\n", name, value));
        }
    }
    message.push_str("\r\n");
    message
}
