//! Error types for SSDP advertisement and discovery.

use thiserror::Error;

/// Errors raised by discovery transports, the advertiser and the observer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    /// Socket setup or datagram send failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// A datagram could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// The component has not been started yet
    #[error("Discovery component not started")]
    NotStarted,

    /// `start()` was called twice
    #[error("Discovery component already started")]
    AlreadyStarted,
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
