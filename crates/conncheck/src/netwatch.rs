//! Network availability watching.
//!
//! Bridges asynchronous availability callbacks to a blocking bounded wait:
//! register a filter with a [`NetworkMonitor`], then poll the event channel
//! until an entry matches or the deadline passes. The registration handle
//! releases itself on drop, so delivery stops no matter how the wait ends.

use std::collections::HashMap;
use std::process::Command;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Physical medium of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Cellular,
    Wifi,
    Ethernet,
}

/// Functional guarantee required of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetCapability {
    /// General internet reachability.
    Internet,
}

/// Describes the network a watch is interested in. A filter has no identity
/// beyond its field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkRequestFilter {
    pub transport: Transport,
    pub capability: NetCapability,
}

impl NetworkRequestFilter {
    /// Cellular network with general internet reachability: the filter the
    /// mobile-data check registers.
    pub fn cellular_internet() -> Self {
        Self {
            transport: Transport::Cellular,
            capability: NetCapability::Internet,
        }
    }
}

/// Lifecycle event for a network matching a registered filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEntry {
    /// A matching network became usable.
    Available { network: String },
    /// A matching network is about to disconnect.
    Losing { network: String },
    /// A matching network disconnected.
    Lost { network: String },
    /// No network can satisfy the filter.
    Unavailable,
}

impl CallbackEntry {
    pub fn is_available(&self) -> bool {
        matches!(self, CallbackEntry::Available { .. })
    }
}

/// Token identifying one registration with a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(pub u64);

/// Connectivity service interface: delivers [`CallbackEntry`] events for
/// networks matching a filter until the registration is released.
pub trait NetworkMonitor {
    /// Start delivering events for `filter` on `events`, in delivery order.
    fn register(&self, filter: NetworkRequestFilter, events: Sender<CallbackEntry>)
        -> RegistrationId;

    /// Stop delivering events for a registration. Must be called exactly
    /// once per registration; [`NetworkWatch`] takes care of that.
    fn unregister(&self, id: RegistrationId);
}

/// A live registration with a monitor.
///
/// Dropping the watch releases the registration, whether the wait matched,
/// timed out, or an error unwound past it.
pub struct NetworkWatch<'a> {
    monitor: &'a dyn NetworkMonitor,
    id: RegistrationId,
    events: Receiver<CallbackEntry>,
}

impl<'a> NetworkWatch<'a> {
    /// Register `filter` with `monitor` and return the live watch.
    pub fn register(monitor: &'a dyn NetworkMonitor, filter: NetworkRequestFilter) -> Self {
        let (tx, rx) = mpsc::channel();
        let id = monitor.register(filter, tx);
        debug!("registered network watch {:?} for {:?}", id, filter);
        Self {
            monitor,
            id,
            events: rx,
        }
    }

    /// Block until an entry satisfying `pred` arrives, consuming entries in
    /// delivery order and discarding the ones that do not match. Returns
    /// `None` if the deadline passes, or the monitor stops delivering, first.
    pub fn wait_for<F>(&self, timeout: Duration, pred: F) -> Option<CallbackEntry>
    where
        F: Fn(&CallbackEntry) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.events.recv_timeout(remaining) {
                Ok(entry) if pred(&entry) => return Some(entry),
                Ok(entry) => debug!("discarding non-matching entry {:?}", entry),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }

    /// Block until a matching network reports [`CallbackEntry::Available`].
    pub fn wait_for_available(&self, timeout: Duration) -> Option<CallbackEntry> {
        self.wait_for(timeout, CallbackEntry::is_available)
    }
}

impl Drop for NetworkWatch<'_> {
    fn drop(&mut self) {
        self.monitor.unregister(self.id);
    }
}

/// Monitor backed by NetworkManager.
///
/// Each registration runs a background thread that polls `nmcli` for an
/// active connection matching the filter and emits transitions as events.
/// `unregister` stops the thread via a shared flag.
pub struct NetworkManagerMonitor {
    poll_interval: Duration,
    next_id: AtomicU64,
    active: Mutex<HashMap<RegistrationId, Arc<AtomicBool>>>,
}

impl NetworkManagerMonitor {
    /// `None` when NetworkManager is not answering on this host.
    pub fn detect(poll_interval: Duration) -> Option<Self> {
        let output = Command::new("nmcli")
            .args(["-t", "-f", "RUNNING", "general"])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(Self {
            poll_interval,
            next_id: AtomicU64::new(1),
            active: Mutex::new(HashMap::new()),
        })
    }

    fn poll_matching_connection(filter: NetworkRequestFilter) -> Option<String> {
        let output = Command::new("nmcli")
            .args(["-t", "-f", "DEVICE,TYPE,STATE,CONNECTION", "device"])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        connection_matching(&stdout, filter)
    }
}

impl NetworkMonitor for NetworkManagerMonitor {
    fn register(
        &self,
        filter: NetworkRequestFilter,
        events: Sender<CallbackEntry>,
    ) -> RegistrationId {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let stop = Arc::new(AtomicBool::new(false));
        self.active
            .lock()
            .unwrap()
            .insert(id, Arc::clone(&stop));

        let interval = self.poll_interval;
        thread::spawn(move || {
            let mut last: Option<String> = None;
            while !stop.load(Ordering::Relaxed) {
                let current = Self::poll_matching_connection(filter);
                let event = match (&last, &current) {
                    (None, Some(network)) => Some(CallbackEntry::Available {
                        network: network.clone(),
                    }),
                    (Some(network), None) => Some(CallbackEntry::Lost {
                        network: network.clone(),
                    }),
                    _ => None,
                };
                if let Some(event) = event {
                    if events.send(event).is_err() {
                        // Receiver gone: the watch was dropped.
                        break;
                    }
                }
                last = current;
                thread::sleep(interval);
            }
        });
        id
    }

    fn unregister(&self, id: RegistrationId) {
        match self.active.lock().unwrap().remove(&id) {
            Some(stop) => stop.store(true, Ordering::Relaxed),
            None => warn!("unregister for unknown watch {:?}", id),
        }
    }
}

/// Find the profile name of a connected device matching the filter in
/// `nmcli -t -f DEVICE,TYPE,STATE,CONNECTION device` output.
///
/// `connected` is NetworkManager's fully-activated state (addressing done),
/// which is the availability signal the internet capability maps to.
fn connection_matching(raw: &str, filter: NetworkRequestFilter) -> Option<String> {
    raw.lines().find_map(|line| {
        let mut fields = line.splitn(4, ':');
        let _device = fields.next()?;
        let dev_type = fields.next()?;
        let state = fields.next()?;
        let connection = fields.next()?;
        let transport_matches = match filter.transport {
            Transport::Cellular => dev_type == "gsm" || dev_type == "cdma",
            Transport::Wifi => dev_type == "wifi",
            Transport::Ethernet => dev_type == "ethernet",
        };
        (transport_matches && state.starts_with("connected") && !connection.is_empty())
            .then(|| connection.to_string())
    })
}
