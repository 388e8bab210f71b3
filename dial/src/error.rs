use thiserror::Error;

#[derive(Error, Debug)]
pub enum DialError {
    #[error("Server error: {0}")]
    Server(#[from] dial_server::ServerError),

    #[error("Client error: {0}")]
    Client(#[from] dial_client::ClientError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] dial_discovery::DiscoveryError),

    #[error("Descriptor error: {0}")]
    Xml(#[from] dial_xml::XmlError),

    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),
}
