//! Fake collaborators for deterministic tests.
//!
//! Production code wires the sysfs / ModemManager / NetworkManager adapters;
//! tests use these fakes instead: pre-configured responses, recorded calls,
//! no system calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Mutex;

use crate::capability::{Capability, CapabilityProber};
use crate::error::CheckError;
use crate::netwatch::{CallbackEntry, NetworkMonitor, NetworkRequestFilter, RegistrationId};
use crate::telephony::{SimState, TelephonyService};
use crate::wifi::WifiConnector;

/// Capability prober answering from a fixed set, counting queries.
pub struct FakeCapabilities {
    wifi: bool,
    telephony: bool,
    queries: AtomicUsize,
}

impl FakeCapabilities {
    pub fn new(wifi: bool, telephony: bool) -> Self {
        Self {
            wifi,
            telephony,
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of capability queries made so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl CapabilityProber for FakeCapabilities {
    fn has_capability(&self, capability: Capability) -> bool {
        self.queries.fetch_add(1, Ordering::Relaxed);
        match capability {
            Capability::Wifi => self.wifi,
            Capability::Telephony => self.telephony,
        }
    }
}

/// Telephony service with canned answers, counting calls.
pub struct FakeTelephony {
    sim_state: SimState,
    data_possible: bool,
    calls: AtomicUsize,
}

impl FakeTelephony {
    pub fn new(sim_state: SimState, data_possible: bool) -> Self {
        Self {
            sim_state,
            data_possible,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of status queries made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl TelephonyService for FakeTelephony {
    fn sim_state(&self) -> SimState {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.sim_state
    }

    fn is_data_connectivity_possible(&self) -> bool {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.data_possible
    }
}

/// Wi-Fi connector that succeeds or fails on demand, recording attempts.
pub struct FakeWifi {
    fail_with: Option<String>,
    attempts: AtomicUsize,
}

impl FakeWifi {
    /// Connector whose device is already connected.
    pub fn connected() -> Self {
        Self {
            fail_with: None,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Connector that fails every attempt with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of connection attempts made so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl WifiConnector for FakeWifi {
    fn ensure_connected(&self) -> Result<(), CheckError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        match &self.fail_with {
            Some(message) => Err(CheckError::precondition(message.clone())),
            None => Ok(()),
        }
    }
}

/// Monitor that plays back a scripted event sequence on registration and
/// records register/unregister traffic.
pub struct FakeNetworkMonitor {
    script: Vec<CallbackEntry>,
    registered: AtomicUsize,
    unregistered: AtomicUsize,
    last_filter: Mutex<Option<NetworkRequestFilter>>,
}

impl FakeNetworkMonitor {
    pub fn new(script: Vec<CallbackEntry>) -> Self {
        Self {
            script,
            registered: AtomicUsize::new(0),
            unregistered: AtomicUsize::new(0),
            last_filter: Mutex::new(None),
        }
    }

    /// Monitor that never delivers an event (the wait will time out).
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    pub fn registrations(&self) -> usize {
        self.registered.load(Ordering::Relaxed)
    }

    pub fn unregistrations(&self) -> usize {
        self.unregistered.load(Ordering::Relaxed)
    }

    pub fn last_filter(&self) -> Option<NetworkRequestFilter> {
        *self.last_filter.lock().unwrap()
    }
}

impl NetworkMonitor for FakeNetworkMonitor {
    fn register(
        &self,
        filter: NetworkRequestFilter,
        events: Sender<CallbackEntry>,
    ) -> RegistrationId {
        let count = self.registered.fetch_add(1, Ordering::Relaxed) + 1;
        *self.last_filter.lock().unwrap() = Some(filter);
        // The channel buffers the whole script; the waiter still observes
        // the entries one at a time, in delivery order.
        for entry in &self.script {
            let _ = events.send(entry.clone());
        }
        RegistrationId(count as u64)
    }

    fn unregister(&self, _id: RegistrationId) {
        self.unregistered.fetch_add(1, Ordering::Relaxed);
    }
}
