//! Error types for the DIAL client

use dial_discovery::DiscoveryError;
use dial_xml::XmlError;
use thiserror::Error;

/// Errors that can occur while talking to a DIAL device
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required argument was empty; no request was made
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Transport(String),

    /// A descriptor could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The device description was not served or lacked an `Application-URL` header
    #[error("Cannot get device description from {url} or Application-URL header is not set")]
    DescriptorUnavailable { url: String, status_code: u16 },

    #[error("Application info unavailable: HTTP {status_code}")]
    AppInfoUnavailable { status_code: u16 },

    #[error("Launch failed: HTTP {status_code}")]
    LaunchFailed { status_code: u16 },

    /// SSDP discovery failed
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl ClientError {
    /// HTTP status returned by the device, for errors caused by one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::DescriptorUnavailable { status_code, .. }
            | ClientError::AppInfoUnavailable { status_code }
            | ClientError::LaunchFailed { status_code } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<XmlError> for ClientError {
    fn from(err: XmlError) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
