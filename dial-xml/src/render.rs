//! Rendering of the two DIAL XML documents.

use std::fmt::Write;

use quick_xml::escape::escape;

use crate::model::{AppDescription, DeviceDescriptor};

/// Device type announced in the device descriptor.
pub const DIAL_DEVICE_TYPE: &str = "urn:dial-multiscreen-org:device:dial:1";
/// DIAL service type listed in the device descriptor.
pub const DIAL_SERVICE_TYPE: &str = "urn:dial-multiscreen-org:service:dial:1";
/// Namespace of application description documents.
pub const DIAL_XML_NAMESPACE: &str = "urn:dial-multiscreen-org:schemas:dial";
/// Namespace of UPnP device descriptors.
pub const UPNP_DEVICE_NAMESPACE: &str = "urn:schemas-upnp-org:device-1-0";
/// DIAL protocol version advertised in application descriptions.
pub const DIAL_VERSION: &str = "1.7";

/// Render the UPnP device descriptor of a DIAL server.
pub fn render_device_descriptor(device: &DeviceDescriptor) -> String {
    let url_base = escape(&device.url_base);
    let not_found = format!("{}/ssdp/notfound", url_base);

    let mut icons = String::new();
    if !device.icons.is_empty() {
        icons.push_str("    <iconList>\n");
        for icon in &device.icons {
            icons.push_str("      <icon>\n");
            if let Some(mime_type) = &icon.mime_type {
                let _ = writeln!(icons, "        <mimetype>{}</mimetype>", escape(mime_type));
            }
            for (tag, value) in [("width", icon.width), ("height", icon.height), ("depth", icon.depth)] {
                if let Some(value) = value {
                    let _ = writeln!(icons, "        <{tag}>{value}</{tag}>");
                }
            }
            if let Some(url) = &icon.url {
                let _ = writeln!(icons, "        <url>{}</url>", escape(url));
            }
            icons.push_str("      </icon>\n");
        }
        icons.push_str("    </iconList>\n");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<root xmlns="{namespace}">
  <specVersion>
    <major>1</major>
    <minor>0</minor>
  </specVersion>
  <URLBase>{url_base}</URLBase>
  <device>
    <deviceType>{device_type}</deviceType>
    <friendlyName>{friendly_name}</friendlyName>
    <manufacturer>{manufacturer}</manufacturer>
    <modelName>{model_name}</modelName>
    <UDN>uuid:{uuid}</UDN>
{icons}    <serviceList>
      <service>
        <serviceType>{service_type}</serviceType>
        <serviceId>urn:dial-multiscreen-org:serviceId:dial</serviceId>
        <controlURL>{not_found}</controlURL>
        <eventSubURL>{not_found}</eventSubURL>
        <SCPDURL>{not_found}</SCPDURL>
      </service>
    </serviceList>
  </device>
</root>
"#,
        namespace = UPNP_DEVICE_NAMESPACE,
        url_base = url_base,
        device_type = DIAL_DEVICE_TYPE,
        friendly_name = escape(&device.friendly_name),
        manufacturer = escape(&device.manufacturer),
        model_name = escape(&device.model_name),
        uuid = escape(&device.uuid),
        icons = icons,
        service_type = DIAL_SERVICE_TYPE,
        not_found = not_found,
    )
}

/// Render an application description.
///
/// The `link` element is emitted only when both a relation and a non-empty href
/// are present. The `additionalData` block is emitted whenever additional data is
/// provided, even if empty; keys that are not valid XML names are skipped.
pub fn render_app_resource(app: &AppDescription<'_>) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    let _ = write!(xml, "<service xmlns=\"{}\"", DIAL_XML_NAMESPACE);
    for (prefix, uri) in app.namespaces {
        if is_xml_name(prefix) {
            let _ = write!(xml, " xmlns:{}=\"{}\"", prefix, escape(uri));
        }
    }
    let _ = writeln!(xml, " dialVer=\"{}\">", DIAL_VERSION);

    let _ = writeln!(xml, "  <name>{}</name>", escape(app.name));
    let _ = writeln!(xml, "  <options allowStop=\"{}\"/>", app.allow_stop);
    let _ = writeln!(xml, "  <state>{}</state>", app.state);

    if let Some(link) = app.link {
        if let (Some(rel), Some(href)) = (link.rel, link.href) {
            if !href.is_empty() {
                let _ = writeln!(xml, "  <link rel=\"{}\" href=\"{}\"/>", escape(rel), escape(href));
            }
        }
    }

    if let Some(additional_data) = app.additional_data {
        xml.push_str("  <additionalData>\n");
        for (key, value) in additional_data {
            if is_xml_name(key) {
                let _ = writeln!(xml, "    <{key}>{}</{key}>", escape(value));
            }
        }
        xml.push_str("  </additionalData>\n");
    }

    xml.push_str("</service>\n");
    xml
}

/// Conservative check for element and prefix names, allowing one `prefix:` part.
fn is_xml_name(name: &str) -> bool {
    let mut parts = name.split(':');
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    };
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), None, None) => valid_part(local),
        (Some(prefix), Some(local), None) => valid_part(prefix) && valid_part(local),
        _ => false,
    }
}
