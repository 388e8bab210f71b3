//! Configuration types for the DIAL server
//!
//! [`ServerConfig`] can be built in code or deserialized (every field has a
//! default), then checked with [`ServerConfig::validate`] before the server is
//! created.

use std::collections::BTreeMap;

use dial_xml::Icon;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ServerError};

/// Smallest accepted launch payload limit, in bytes.
pub const MIN_CONTENT_LENGTH: usize = 4096;

/// Content types whose bodies are decoded to text before routing.
pub const DEFAULT_BODY_CONTENT_TYPES: &[&str] = &[
    "text/plain",
    "text/xml",
    "text/json",
    "application/xml",
    "application/json",
    "application/x-www-form-urlencoded",
];

/// Origins allowed to make cross-origin requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "CorsOriginsRepr")]
pub enum CorsOrigins {
    /// No origin is allowed
    #[default]
    None,
    /// Every origin is allowed (`*`)
    Any,
    /// Exactly these origins, e.g. `https://example.com`
    List(Vec<String>),
}

impl CorsOrigins {
    pub fn allows(&self, origin: &str) -> bool {
        match self {
            CorsOrigins::None => false,
            CorsOrigins::Any => true,
            CorsOrigins::List(origins) => origins.iter().any(|o| o.eq_ignore_ascii_case(origin)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CorsOriginsRepr {
    Flag(bool),
    Keyword(String),
    List(Vec<String>),
}

impl TryFrom<CorsOriginsRepr> for CorsOrigins {
    type Error = String;

    fn try_from(repr: CorsOriginsRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            CorsOriginsRepr::Flag(false) => Ok(CorsOrigins::None),
            CorsOriginsRepr::Flag(true) => Ok(CorsOrigins::Any),
            CorsOriginsRepr::Keyword(keyword) => match keyword.as_str() {
                "none" | "" => Ok(CorsOrigins::None),
                "any" | "*" => Ok(CorsOrigins::Any),
                origin if origin.contains("://") => Ok(CorsOrigins::List(vec![origin.to_string()])),
                other => Err(format!("unknown CORS origin setting: {other}")),
            },
            CorsOriginsRepr::List(origins) => Ok(CorsOrigins::List(origins)),
        }
    }
}

/// Configuration for a DIAL server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path prefix of every route, e.g. `/dial`. Empty for none.
    pub prefix: String,

    /// HTTP port; 0 picks a free port
    /// Default: 0
    pub port: u16,

    /// Host used in URLs when a request carries no `Host` header
    pub host: Option<String>,

    /// Device uuid; a random v4 uuid is generated when absent
    pub uuid: Option<String>,

    /// Default: `HOSTNAME` / `COMPUTERNAME` environment variable, else `unknown`
    pub friendly_name: Option<String>,

    /// Default: `unknown manufacturer`
    pub manufacturer: String,

    /// Default: `unknown model`
    pub model_name: String,

    /// Launch payload limit in bytes, never below [`MIN_CONTENT_LENGTH`]
    pub max_content_length: usize,

    /// Additional SSDP headers; only string, number and boolean values are sent
    pub extra_headers: BTreeMap<String, Value>,

    pub cors_allow_origins: CorsOrigins,

    /// Content types decoded to text for launch payloads
    pub body_content_types: Vec<String>,

    /// Icons listed in the device descriptor
    pub icons: Vec<Icon>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            port: 0,
            host: None,
            uuid: None,
            friendly_name: None,
            manufacturer: "unknown manufacturer".to_string(),
            model_name: "unknown model".to_string(),
            max_content_length: MIN_CONTENT_LENGTH,
            extra_headers: BTreeMap::new(),
            cors_allow_origins: CorsOrigins::None,
            body_content_types: DEFAULT_BODY_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
            icons: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload limit actually enforced.
    pub fn effective_max_content_length(&self) -> usize {
        self.max_content_length.max(MIN_CONTENT_LENGTH)
    }

    /// Friendly name actually announced.
    pub fn effective_friendly_name(&self) -> String {
        self.friendly_name
            .clone()
            .or_else(|| std::env::var("HOSTNAME").ok())
            .or_else(|| std::env::var("COMPUTERNAME").ok())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Extra SSDP headers with non-scalar values dropped.
    pub fn scalar_extra_headers(&self) -> Vec<(String, String)> {
        dial_discovery::scalar_headers(&self.extra_headers)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if !self.prefix.is_empty() && (!self.prefix.starts_with('/') || self.prefix.ends_with('/')) {
            return Err(ServerError::Configuration(format!(
                "Prefix must start with '/' and not end with '/': {}",
                self.prefix
            )));
        }

        if let Some(uuid) = &self.uuid {
            if uuid.trim().is_empty() || uuid.contains(char::is_whitespace) {
                return Err(ServerError::Configuration(format!("Invalid uuid: {:?}", uuid)));
            }
        }

        for name in self.extra_headers.keys() {
            if name.is_empty() || name.contains(|c: char| c == ':' || c.is_whitespace() || c.is_control()) {
                return Err(ServerError::Configuration(format!(
                    "Invalid extra header name: {:?}",
                    name
                )));
            }
        }

        if self.body_content_types.iter().any(|t| !t.contains('/')) {
            return Err(ServerError::Configuration(
                "Body content types must be MIME types like text/plain".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder pattern methods for fluent configuration

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    pub fn with_cors_allow_origins(mut self, origins: CorsOrigins) -> Self {
        self.cors_allow_origins = origins;
        self
    }

    pub fn with_max_content_length(mut self, max: usize) -> Self {
        self.max_content_length = max;
        self
    }
}
