//! Client-side discovery of DIAL devices.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{DiscoveryError, Result};
use crate::transport::{SsdpTransport, TransportEvent};
use crate::types::{NotificationSubType, ServiceRecord, DIAL_DEVICE_TYPE, DIAL_SERVICE_TYPE};

/// Signals emitted by a [`DiscoveryObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    /// Initial searches were sent
    Ready,
    /// A description URL was seen for the first time
    Found {
        location: String,
        record: ServiceRecord,
    },
    /// A known device said goodbye
    Disappeared {
        location: String,
        record: ServiceRecord,
    },
    /// The transport closed
    Stopped,
}

/// Known devices keyed by description URL.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    entries: HashMap<String, ServiceRecord>,
}

impl DiscoveryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one transport event into the cache, returning the signal it causes.
    ///
    /// Only NOTIFY messages for the DIAL device and service types are considered;
    /// search replies are accepted whatever their type. Records without a
    /// location are ignored, except a byebye, which falls back to its `USN`.
    pub fn apply(&mut self, event: &TransportEvent) -> Option<ObserverEvent> {
        match event {
            TransportEvent::Found { record, .. } => self.insert(record),
            TransportEvent::Notify { record, .. } => {
                if record.service_type != DIAL_DEVICE_TYPE && record.service_type != DIAL_SERVICE_TYPE {
                    return None;
                }
                match record.nts? {
                    NotificationSubType::Alive => self.insert(record),
                    NotificationSubType::ByeBye => {
                        let location = match &record.location {
                            Some(location) => location.clone(),
                            None => self
                                .entries
                                .iter()
                                .find(|(_, known)| known.usn == record.usn)
                                .map(|(location, _)| location.clone())?,
                        };
                        let last = self.entries.remove(&location)?;
                        Some(ObserverEvent::Disappeared { location, record: last })
                    }
                }
            }
            _ => None,
        }
    }

    fn insert(&mut self, record: &ServiceRecord) -> Option<ObserverEvent> {
        let location = record.location.as_ref()?;
        if self.entries.contains_key(location) {
            return None;
        }
        self.entries.insert(location.clone(), record.clone());
        Some(ObserverEvent::Found {
            location: location.clone(),
            record: record.clone(),
        })
    }

    pub fn get(&self, location: &str) -> Option<&ServiceRecord> {
        self.entries.get(location)
    }

    pub fn contains(&self, location: &str) -> bool {
        self.entries.contains_key(location)
    }

    pub fn locations(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

struct ObserverInner {
    transport: Arc<dyn SsdpTransport>,
    cache: Mutex<DiscoveryCache>,
    events: UnboundedSender<ObserverEvent>,
}

impl ObserverInner {
    async fn search(&self) {
        for target in [DIAL_DEVICE_TYPE, DIAL_SERVICE_TYPE] {
            if let Err(e) = self.transport.search(target).await {
                warn!("Failed to search for {}: {}", target, e);
            }
        }
    }

    async fn run(self: Arc<Self>, mut transport_events: UnboundedReceiver<TransportEvent>) {
        while let Some(event) = transport_events.recv().await {
            match event {
                TransportEvent::Ready => {
                    self.search().await;
                    info!("Discovery observer ready");
                    let _ = self.events.send(ObserverEvent::Ready);
                }
                TransportEvent::Close => {
                    info!("Discovery observer stopped");
                    let _ = self.events.send(ObserverEvent::Stopped);
                    break;
                }
                other => {
                    let signal = self.cache.lock().apply(&other);
                    if let Some(signal) = signal {
                        debug!("Discovery update: {:?}", signal);
                        let _ = self.events.send(signal);
                    }
                }
            }
        }
    }
}

/// Finds DIAL devices and tracks their comings and goings.
pub struct DiscoveryObserver {
    inner: Arc<ObserverInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DiscoveryObserver {
    pub fn new(transport: Arc<dyn SsdpTransport>, events: UnboundedSender<ObserverEvent>) -> Self {
        Self {
            inner: Arc::new(ObserverInner {
                transport,
                cache: Mutex::new(DiscoveryCache::new()),
                events,
            }),
            task: Mutex::new(None),
        }
    }

    /// Start the transport. Searches go out once it reports ready.
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

    /// Forget every known device and search again.
    pub async fn refresh(&self) -> Result<()> {
        if self.task.lock().is_none() {
            return Err(DiscoveryError::NotStarted);
        }
        self.inner.cache.lock().clear();
        self.inner.search().await;
        Ok(())
    }

    /// Close the transport; [`ObserverEvent::Stopped`] follows.
    pub async fn stop(&self) -> Result<()> {
        let task = self.task.lock().take().ok_or(DiscoveryError::NotStarted)?;
        self.inner.transport.close().await?;
        let _ = task.await;
        Ok(())
    }

    /// Description URLs currently known.
    pub fn locations(&self) -> Vec<String> {
        self.inner.cache.lock().locations()
    }
}
