//! Entity model shared by the DIAL server and client.
//!
//! The server never stores [`AppResource`] values itself. They are produced by the
//! application delegate on every request and rendered straight to XML.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::XmlError;
use crate::tree::XmlValue;

/// Lifecycle state of a DIAL application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Stopped,
    Starting,
    Running,
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Stopped => "stopped",
            AppState::Starting => "starting",
            AppState::Running => "running",
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppState {
    type Err = XmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "stopped" => Ok(AppState::Stopped),
            "starting" => Ok(AppState::Starting),
            "running" => Ok(AppState::Running),
            other => Err(XmlError::Parse(format!("Unknown application state: {other}"))),
        }
    }
}

/// An application as reported by the server-side delegate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppResource {
    /// Route key the application is addressed by
    pub name: String,
    /// Explicit state, if the delegate tracks one
    pub state: Option<AppState>,
    /// Opaque session token of the running instance
    pub pid: Option<String>,
    /// Whether DELETE requests may stop the application
    pub allow_stop: bool,
    /// Ordered key/value pairs rendered inside `additionalData`
    pub additional_data: Option<Vec<(String, String)>>,
    /// Namespace prefix to URI declarations for the additional data elements
    pub namespaces: BTreeMap<String, String>,
}

impl AppResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// State reported to clients.
    ///
    /// Falls back to `running` when only a pid is known and to `stopped` otherwise.
    pub fn effective_state(&self) -> AppState {
        match (self.state, &self.pid) {
            (Some(state), _) => state,
            (None, Some(_)) => AppState::Running,
            (None, None) => AppState::Stopped,
        }
    }

    /// Build the rendering view for this resource under the given route name.
    pub fn description<'a>(&'a self, name: &'a str) -> AppDescription<'a> {
        AppDescription {
            name,
            state: self.effective_state(),
            allow_stop: self.allow_stop,
            link: Some(Link {
                rel: Some("run"),
                href: self.pid.as_deref(),
            }),
            additional_data: self.additional_data.as_deref(),
            namespaces: &self.namespaces,
        }
    }
}

/// `link` element of an application description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link<'a> {
    pub rel: Option<&'a str>,
    pub href: Option<&'a str>,
}

/// Borrowed view consumed by [`render_app_resource`](crate::render_app_resource).
#[derive(Debug, Clone, Copy)]
pub struct AppDescription<'a> {
    pub name: &'a str,
    pub state: AppState,
    pub allow_stop: bool,
    pub link: Option<Link<'a>>,
    pub additional_data: Option<&'a [(String, String)]>,
    pub namespaces: &'a BTreeMap<String, String>,
}

/// Icon entry of a device descriptor's `iconList`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Icon {
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub depth: Option<u32>,
    pub url: Option<String>,
}

impl Icon {
    /// Read an icon from a parsed `icon` element.
    pub fn from_tree(value: &XmlValue) -> Self {
        let number = |key: &str| value.text_at(&[key]).and_then(|s| s.trim().parse().ok());
        Self {
            mime_type: value.text_at(&["mimetype"]).map(str::to_string),
            width: number("width"),
            height: number("height"),
            depth: number("depth"),
            url: value.text_at(&["url"]).map(str::to_string),
        }
    }

    /// All icons of a parsed `device` element, across every `iconList` it carries.
    pub fn list_from_device(device: &XmlValue) -> Vec<Self> {
        let Some(lists) = device.get("iconList") else {
            return Vec::new();
        };
        lists
            .items()
            .into_iter()
            .filter_map(|list| list.get("icon"))
            .flat_map(XmlValue::items)
            .map(Self::from_tree)
            .collect()
    }
}

/// Fields of the device descriptor served at `/ssdp/device-desc.xml`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceDescriptor {
    pub uuid: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    /// Base URL derived from the request being answered
    pub url_base: String,
    pub icons: Vec<Icon>,
}

/// Typed view over a parsed application description.
#[derive(Debug, Clone, PartialEq)]
pub struct AppInfo {
    pub name: String,
    pub state: AppState,
    pub allow_stop: bool,
    pub link_href: Option<String>,
    pub additional_data: Vec<(String, String)>,
}

impl AppInfo {
    /// Build from the tree returned by [`parse_app_info`](crate::parse_app_info).
    pub fn from_tree(value: &XmlValue) -> crate::Result<Self> {
        let name = value
            .text_at(&["name"])
            .ok_or_else(|| XmlError::MissingElement("name".to_string()))?
            .to_string();
        let state = value
            .text_at(&["state"])
            .ok_or_else(|| XmlError::MissingElement("state".to_string()))?
            .parse()?;
        let allow_stop = value
            .text_at(&["options", "allowStop"])
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let link_href = value
            .text_at(&["link", "href"])
            .filter(|href| !href.is_empty())
            .map(str::to_string);

        // Repeated keys come back as a list; keep one pair per occurrence.
        let additional_data = match value.get("additionalData") {
            Some(XmlValue::Element(entries)) => entries
                .iter()
                .flat_map(|(key, v)| {
                    v.items()
                        .into_iter()
                        .filter_map(move |item| item.as_text().map(|text| (key.clone(), text.to_string())))
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            name,
            state,
            allow_stop,
            link_href,
            additional_data,
        })
    }
}
