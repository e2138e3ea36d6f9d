//! Conncheck - test bench connectivity preflight
//!
//! Verifies a bench device's Wi-Fi and cellular-data setup once, before a
//! test suite runs against it. Platform services are consumed through trait
//! seams, so the check logic stays deterministic under test.

pub mod capability;
pub mod check;
pub mod config;
pub mod error;
pub mod netwatch;
pub mod telephony;
pub mod testing;
pub mod wifi;

pub use capability::{Capability, CapabilityProber, SysfsCapabilityProber};
pub use check::{CheckReport, DeviceServices, DeviceSetupCheck, StepOutcome};
pub use config::CheckConfig;
pub use error::{CheckError, REMEDIATION_HINT};
pub use netwatch::{
    CallbackEntry, NetworkManagerMonitor, NetworkMonitor, NetworkRequestFilter, NetworkWatch,
};
pub use telephony::{ModemManagerTelephony, SimState, TelephonyService};
pub use wifi::{NetworkManagerWifi, WifiConnector};
