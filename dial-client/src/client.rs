//! Discovery plus device resolution in one handle.

use std::sync::Arc;

use dial_discovery::{DiscoveryObserver, ObserverEvent, SsdpTransport};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::ClientConfig;
use crate::device::DialDevice;
use crate::error::Result;

/// DIAL client.
///
/// Searches for DIAL devices through its [`DiscoveryObserver`], reporting them as
/// [`ObserverEvent`]s, and resolves description URLs into [`DialDevice`]s sharing
/// one HTTP client.
pub struct DialClient {
    observer: DiscoveryObserver,
    http: reqwest::Client,
}

impl DialClient {
    pub fn new(
        transport: Arc<dyn SsdpTransport>,
        events: UnboundedSender<ObserverEvent>,
        config: ClientConfig,
    ) -> Result<Self> {
        Ok(Self {
            observer: DiscoveryObserver::new(transport, events),
            http: config.build_http_client()?,
        })
    }

    /// Start searching.
    pub async fn start(&self) -> Result<()> {
        Ok(self.observer.start().await?)
    }

    /// Forget every known device and search again.
    pub async fn refresh(&self) -> Result<()> {
        Ok(self.observer.refresh().await?)
    }

    pub async fn stop(&self) -> Result<()> {
        Ok(self.observer.stop().await?)
    }

    /// Description URLs of the devices currently known.
    pub fn locations(&self) -> Vec<String> {
        self.observer.locations()
    }

    pub async fn get_dial_device(&self, description_url: &str) -> Result<DialDevice> {
        DialDevice::resolve(&self.http, description_url).await
    }
}
