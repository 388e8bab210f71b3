//! Server-side announcement of a DIAL device.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{DiscoveryError, Result};
use crate::transport::{SsdpTransport, TransportEvent};
use crate::types::{advertised_service_types, ServiceRecord, UPNP_BOOT_ID};

/// Lifecycle signals of an [`Advertiser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiserEvent {
    /// All alive announcements were sent
    Ready,
    /// The transport closed after shutdown
    Stopped,
}

/// What the advertiser announces.
#[derive(Debug, Clone)]
pub struct AdvertiserConfig {
    pub uuid: String,
    /// Description URL, usually built with [`device_location`](crate::device_location)
    pub location: String,
    pub extra_headers: Vec<(String, String)>,
}

struct AdvertiserInner {
    transport: Arc<dyn SsdpTransport>,
    config: AdvertiserConfig,
    service_types: Vec<String>,
    events: UnboundedSender<AdvertiserEvent>,
}

impl AdvertiserInner {
    fn record(&self, service_type: &str) -> ServiceRecord {
        ServiceRecord {
            extra_headers: self.config.extra_headers.clone(),
            ..ServiceRecord::advertised(&self.config.uuid, service_type, &self.config.location)
        }
    }

    async fn announce(&self) {
        for service_type in &self.service_types {
            if let Err(e) = self.transport.alive(&self.record(service_type)).await {
                warn!("Failed to announce {}: {}", service_type, e);
            }
        }
        info!("Announced {} service types for uuid:{}", self.service_types.len(), self.config.uuid);
        let _ = self.events.send(AdvertiserEvent::Ready);
    }

    async fn answer(&self, search_target: &str, address: SocketAddr) {
        if !self.service_types.iter().any(|st| st == search_target) {
            return;
        }
        let record = ServiceRecord {
            config_id: Some(UPNP_BOOT_ID.to_string()),
            boot_id: Some(UPNP_BOOT_ID.to_string()),
            ..self.record(search_target)
        };
        match self.transport.reply(&record, address).await {
            Ok(()) => debug!("Answered search for {} from {}", search_target, address),
            Err(e) => warn!("Failed to answer search from {}: {}", address, e),
        }
    }

    async fn run(self: Arc<Self>, mut transport_events: UnboundedReceiver<TransportEvent>) {
        while let Some(event) = transport_events.recv().await {
            match event {
                TransportEvent::Ready => self.announce().await,
                TransportEvent::Search {
                    search_target,
                    address,
                } => self.answer(&search_target, address).await,
                TransportEvent::Close => {
                    info!("Advertiser stopped");
                    let _ = self.events.send(AdvertiserEvent::Stopped);
                    break;
                }
                TransportEvent::Found { .. } | TransportEvent::Notify { .. } => {}
            }
        }
    }
}

/// Announces one device under the five DIAL service types and answers searches.
pub struct Advertiser {
    inner: Arc<AdvertiserInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Advertiser {
    pub fn new(
        transport: Arc<dyn SsdpTransport>,
        config: AdvertiserConfig,
        events: UnboundedSender<AdvertiserEvent>,
    ) -> Self {
        let service_types = advertised_service_types(&config.uuid);
        Self {
            inner: Arc::new(AdvertiserInner {
                transport,
                config,
                service_types,
                events,
            }),
            task: Mutex::new(None),
        }
    }

    /// Records sent in `alive` and `byebye` announcements, in announcement order.
    pub fn records(&self) -> Vec<ServiceRecord> {
        self.inner
            .service_types
            .iter()
            .map(|st| self.inner.record(st))
            .collect()
    }

    /// Start the transport. Announcements go out once it reports ready.
    pub async fn start(&self) -> Result<()> {
        if self.task.lock().is_some() {
            return Err(DiscoveryError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.task.lock() = Some(tokio::spawn(self.inner.clone().run(rx)));

        if let Err(e) = self.inner.transport.start(tx).await {
            if let Some(task) = self.task.lock().take() {
                task.abort();
            }
            return Err(e);
        }
        Ok(())
    }

    /// Send every byebye concurrently, wait for all of them, then close the transport.
    ///
    /// A failed byebye is logged and does not hold up the shutdown.
    pub async fn stop(&self) -> Result<()> {
        let task = self.task.lock().take().ok_or(DiscoveryError::NotStarted)?;

        let records = self.records();
        let results = join_all(records.iter().map(|record| self.inner.transport.byebye(record))).await;
        for (record, result) in records.iter().zip(results) {
            if let Err(e) = result {
                warn!("Failed to send byebye for {}: {}", record.service_type, e);
            }
        }

        self.inner.transport.close().await?;
        let _ = task.await;
        Ok(())
    }
}
