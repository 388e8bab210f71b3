//! Error types for the DIAL server.

use dial_discovery::DiscoveryError;
use thiserror::Error;

/// Errors raised while configuring, starting or stopping a [`DialServer`](crate::DialServer).
#[derive(Error, Debug)]
pub enum ServerError {
    /// The HTTP listener could not be bound
    #[error("Failed to bind HTTP server: {0}")]
    Bind(String),

    /// The configuration failed validation
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// SSDP advertisement failed
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Server already started")]
    AlreadyStarted,

    #[error("Server not started")]
    NotStarted,
}

/// Failure reported by an [`AppDelegate`](crate::AppDelegate) launch; answered with 503.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DelegateError {
    #[error("Application unavailable: {0}")]
    Unavailable(String),

    #[error("Launch failed: {0}")]
    LaunchFailed(String),
}

/// Convenience Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
