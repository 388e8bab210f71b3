//! In-memory transport for tests.
//!
//! [`MemoryTransport`] records everything it is asked to send and lets a test
//! inject the events a real network would produce.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Notify;

use crate::error::{DiscoveryError, Result};
use crate::transport::{SsdpTransport, TransportEvent};
use crate::types::{NotificationSubType, ServiceRecord};

/// One operation performed on the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Alive(ServiceRecord),
    ByeBye(ServiceRecord),
    Search(String),
    Reply(ServiceRecord, SocketAddr),
    Close,
}

/// Transport that never touches the network.
pub struct MemoryTransport {
    events: Mutex<Option<UnboundedSender<TransportEvent>>>,
    sent: Mutex<Vec<Sent>>,
    completion_log: Mutex<Vec<String>>,
    byebye_delays: Vec<Duration>,
    byebye_calls: AtomicUsize,
    failing_byebye: Mutex<Vec<String>>,
    auto_ready: AtomicBool,
    changed: Notify,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::with_byebye_delays(Vec::new())
    }

    /// Byebye number `n` (in call order) completes after `delays[n]`.
    pub fn with_byebye_delays(delays: Vec<Duration>) -> Self {
        Self {
            events: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            completion_log: Mutex::new(Vec::new()),
            byebye_delays: delays,
            byebye_calls: AtomicUsize::new(0),
            failing_byebye: Mutex::new(Vec::new()),
            auto_ready: AtomicBool::new(true),
            changed: Notify::new(),
        }
    }

    /// Do not report `Ready` from `start`; use [`inject_ready`](Self::inject_ready).
    pub fn without_auto_ready(self) -> Self {
        self.auto_ready.store(false, Ordering::SeqCst);
        self
    }

    /// Make the byebye for `service_type` fail.
    pub fn fail_byebye_for(&self, service_type: &str) {
        self.failing_byebye.lock().push(service_type.to_string());
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|sent| match sent {
                Sent::Search(target) => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn replies(&self) -> Vec<(ServiceRecord, SocketAddr)> {
        self.sent
            .lock()
            .iter()
            .filter_map(|sent| match sent {
                Sent::Reply(record, address) => Some((record.clone(), *address)),
                _ => None,
            })
            .collect()
    }

    /// Completed byebye sends (`byebye {type}`) and `close`, in completion order.
    pub fn completion_log(&self) -> Vec<String> {
        self.completion_log.lock().clone()
    }

    pub fn is_started(&self) -> bool {
        self.events.lock().is_some()
    }

    /// Wait until at least `count` replies were sent.
    pub async fn wait_for_replies(&self, count: usize) -> Vec<(ServiceRecord, SocketAddr)> {
        self.wait_until(|sent| sent.iter().filter(|s| matches!(s, Sent::Reply(..))).count() >= count)
            .await;
        self.replies()
    }

    /// Wait until at least `count` searches were sent.
    pub async fn wait_for_searches(&self, count: usize) -> Vec<String> {
        self.wait_until(|sent| sent.iter().filter(|s| matches!(s, Sent::Search(_))).count() >= count)
            .await;
        self.searches()
    }

    async fn wait_until(&self, condition: impl Fn(&[Sent]) -> bool) {
        loop {
            let notified = self.changed.notified();
            if condition(&self.sent.lock()) {
                return;
            }
            notified.await;
        }
    }

    pub fn inject(&self, event: TransportEvent) {
        if let Some(events) = self.events.lock().as_ref() {
            let _ = events.send(event);
        }
    }

    pub fn inject_ready(&self) {
        self.inject(TransportEvent::Ready);
    }

    pub fn inject_search(&self, search_target: &str, address: SocketAddr) {
        self.inject(TransportEvent::Search {
            search_target: search_target.to_string(),
            address,
        });
    }

    pub fn inject_found(&self, record: ServiceRecord, address: SocketAddr) {
        self.inject(TransportEvent::Found { record, address });
    }

    pub fn inject_notify(&self, record: ServiceRecord, address: SocketAddr) {
        self.inject(TransportEvent::Notify { record, address });
    }

    fn record_sent(&self, sent: Sent) {
        self.sent.lock().push(sent);
        self.changed.notify_one();
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Record with `service_type` and `location`, as another device would announce it.
pub fn remote_record(
    service_type: &str,
    location: Option<&str>,
    nts: Option<NotificationSubType>,
) -> ServiceRecord {
    ServiceRecord {
        service_type: service_type.to_string(),
        usn: format!("uuid:remote::{}", service_type),
        location: location.map(str::to_string),
        nts,
        ..Default::default()
    }
}

#[async_trait]
impl SsdpTransport for MemoryTransport {
    async fn start(&self, events: UnboundedSender<TransportEvent>) -> Result<()> {
        let mut slot = self.events.lock();
        if slot.is_some() {
            return Err(DiscoveryError::AlreadyStarted);
        }
        if self.auto_ready.load(Ordering::SeqCst) {
            let _ = events.send(TransportEvent::Ready);
        }
        *slot = Some(events);
        Ok(())
    }

    async fn alive(&self, record: &ServiceRecord) -> Result<()> {
        self.record_sent(Sent::Alive(record.clone()));
        Ok(())
    }

    async fn byebye(&self, record: &ServiceRecord) -> Result<()> {
        let call = self.byebye_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.byebye_delays.get(call) {
            tokio::time::sleep(*delay).await;
        }
        self.completion_log
            .lock()
            .push(format!("byebye {}", record.service_type));
        self.record_sent(Sent::ByeBye(record.clone()));

        if self.failing_byebye.lock().contains(&record.service_type) {
            return Err(DiscoveryError::Transport("simulated byebye failure".to_string()));
        }
        Ok(())
    }

    async fn search(&self, search_target: &str) -> Result<()> {
        self.record_sent(Sent::Search(search_target.to_string()));
        Ok(())
    }

    async fn reply(&self, record: &ServiceRecord, address: SocketAddr) -> Result<()> {
        self.record_sent(Sent::Reply(record.clone(), address));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let events = self.events.lock().take().ok_or(DiscoveryError::NotStarted)?;
        self.completion_log.lock().push("close".to_string());
        self.record_sent(Sent::Close);
        let _ = events.send(TransportEvent::Close);
        Ok(())
    }
}
