//! Device setup check orchestration.
//!
//! Runs the Wi-Fi check and the telephony check in sequence. A check whose
//! hardware capability is absent is skipped outright; the first failure
//! aborts the run with a diagnostic naming the unmet precondition.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::capability::{Capability, CapabilityProber};
use crate::config::CheckConfig;
use crate::error::CheckError;
use crate::netwatch::{NetworkMonitor, NetworkRequestFilter, NetworkWatch};
use crate::telephony::{SimState, TelephonyService};
use crate::wifi::WifiConnector;

/// How a single check step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Skipped,
    Passed,
}

/// Summary of a completed run. Failures are the `Err` side of
/// [`DeviceSetupCheck::run`], not a report field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub wifi: StepOutcome,
    pub telephony: StepOutcome,
    /// ISO 8601 completion timestamp
    pub completed_at: String,
    pub duration_ms: u64,
}

/// The platform collaborators a run consumes.
///
/// `None` for the telephony service or connectivity monitor means the
/// platform service could not be obtained; that only fails the run if the
/// telephony check actually needs it (a Wi-Fi-only bench has no modem stack).
pub struct DeviceServices<'a> {
    pub capabilities: &'a dyn CapabilityProber,
    pub wifi: &'a dyn WifiConnector,
    pub telephony: Option<&'a dyn TelephonyService>,
    pub monitor: Option<&'a dyn NetworkMonitor>,
}

/// One-shot connectivity check for a bench device.
pub struct DeviceSetupCheck<'a> {
    services: DeviceServices<'a>,
    config: &'a CheckConfig,
}

impl<'a> DeviceSetupCheck<'a> {
    pub fn new(services: DeviceServices<'a>, config: &'a CheckConfig) -> Self {
        Self { services, config }
    }

    /// Run the full check: Wi-Fi, then telephony.
    pub fn run(&self) -> Result<CheckReport, CheckError> {
        let start = Instant::now();
        let wifi = self.check_wifi()?;
        let telephony = self.check_telephony()?;
        info!(
            "device setup check passed (wifi: {:?}, telephony: {:?})",
            wifi, telephony
        );
        Ok(CheckReport {
            wifi,
            telephony,
            completed_at: chrono::Utc::now().to_rfc3339(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn check_wifi(&self) -> Result<StepOutcome, CheckError> {
        if !self
            .services
            .capabilities
            .has_capability(Capability::Wifi)
        {
            debug!("no Wi-Fi hardware, skipping Wi-Fi check");
            return Ok(StepOutcome::Skipped);
        }
        self.services.wifi.ensure_connected()?;
        Ok(StepOutcome::Passed)
    }

    fn check_telephony(&self) -> Result<StepOutcome, CheckError> {
        if !self
            .services
            .capabilities
            .has_capability(Capability::Telephony)
        {
            debug!("no telephony hardware, skipping telephony check");
            return Ok(StepOutcome::Skipped);
        }
        let telephony = self
            .services
            .telephony
            .ok_or(CheckError::SetupUnavailable("telephony"))?;

        // Ordered short-circuit; each message must stay distinguishable so
        // the operator knows which remediation step applies.
        let sim_state = telephony.sim_state();
        if sim_state == SimState::Absent {
            return Err(CheckError::precondition(
                "The device has no SIM card inserted.",
            ));
        }
        if sim_state != SimState::Ready {
            return Err(CheckError::precondition(format!(
                "The device is not set up with a usable SIM card. Sim state was {}.",
                sim_state
            )));
        }
        if !telephony.is_data_connectivity_possible() {
            return Err(CheckError::precondition(
                "The device is not set up with a SIM card that supports data connectivity.",
            ));
        }

        let monitor = self
            .services
            .monitor
            .ok_or(CheckError::SetupUnavailable("connectivity"))?;
        let watch = NetworkWatch::register(monitor, NetworkRequestFilter::cellular_internet());
        match watch.wait_for_available(self.config.mobile_data_timeout()) {
            Some(entry) => {
                debug!("mobile data available: {:?}", entry);
                Ok(StepOutcome::Passed)
            }
            None => Err(CheckError::precondition(
                "The device does not have mobile data available. Check that it is set up \
                 with a SIM card that has a working data plan, and that the APN \
                 configuration is valid.",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netwatch::CallbackEntry;
    use crate::testing::{FakeCapabilities, FakeNetworkMonitor, FakeTelephony, FakeWifi};

    fn fast_config() -> CheckConfig {
        CheckConfig {
            mobile_data_timeout_secs: 1,
            ..Default::default()
        }
    }

    fn run_check(
        capabilities: &FakeCapabilities,
        wifi: &FakeWifi,
        telephony: &FakeTelephony,
        monitor: &FakeNetworkMonitor,
        config: &CheckConfig,
    ) -> Result<CheckReport, CheckError> {
        let services = DeviceServices {
            capabilities,
            wifi,
            telephony: Some(telephony),
            monitor: Some(monitor),
        };
        DeviceSetupCheck::new(services, config).run()
    }

    #[test]
    fn test_absent_wifi_capability_skips_the_connector() {
        let capabilities = FakeCapabilities::new(false, false);
        let wifi = FakeWifi::failing("should never run");
        let telephony = FakeTelephony::new(SimState::Ready, true);
        let monitor = FakeNetworkMonitor::silent();
        let config = fast_config();

        let report = run_check(&capabilities, &wifi, &telephony, &monitor, &config).unwrap();
        assert_eq!(report.wifi, StepOutcome::Skipped);
        assert_eq!(wifi.attempts(), 0);
    }

    #[test]
    fn test_wifi_failure_aborts_before_telephony() {
        let capabilities = FakeCapabilities::new(true, true);
        let wifi = FakeWifi::failing("The device could not connect to Wi-Fi.");
        let telephony = FakeTelephony::new(SimState::Ready, true);
        let monitor = FakeNetworkMonitor::silent();
        let config = fast_config();

        let err = run_check(&capabilities, &wifi, &telephony, &monitor, &config).unwrap_err();
        assert!(err.to_string().contains("Wi-Fi"));
        assert_eq!(telephony.calls(), 0);
        assert_eq!(monitor.registrations(), 0);
    }

    #[test]
    fn test_absent_telephony_capability_skips_all_queries() {
        let capabilities = FakeCapabilities::new(false, false);
        let wifi = FakeWifi::connected();
        let telephony = FakeTelephony::new(SimState::Absent, false);
        let monitor = FakeNetworkMonitor::silent();
        let config = fast_config();

        let report = run_check(&capabilities, &wifi, &telephony, &monitor, &config).unwrap();
        assert_eq!(report.telephony, StepOutcome::Skipped);
        assert_eq!(telephony.calls(), 0);
    }

    #[test]
    fn test_sim_failures_are_mutually_distinguishable() {
        let config = fast_config();
        let cases = [
            (SimState::Absent, true, "no SIM card"),
            (SimState::Locked, true, "Sim state was locked"),
            (SimState::Ready, false, "data connectivity"),
        ];
        let mut messages = Vec::new();
        for (sim_state, data_possible, marker) in cases {
            let capabilities = FakeCapabilities::new(false, true);
            let wifi = FakeWifi::connected();
            let telephony = FakeTelephony::new(sim_state, data_possible);
            let monitor = FakeNetworkMonitor::silent();
            let err = run_check(&capabilities, &wifi, &telephony, &monitor, &config).unwrap_err();
            let message = err.to_string();
            assert!(
                message.contains(marker),
                "message {:?} should contain {:?}",
                message,
                marker
            );
            messages.push(message);
        }
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn test_missing_telephony_service_is_a_setup_error() {
        let capabilities = FakeCapabilities::new(false, true);
        let wifi = FakeWifi::connected();
        let monitor = FakeNetworkMonitor::silent();
        let config = fast_config();
        let services = DeviceServices {
            capabilities: &capabilities,
            wifi: &wifi,
            telephony: None,
            monitor: Some(&monitor),
        };

        let err = DeviceSetupCheck::new(services, &config).run().unwrap_err();
        assert_eq!(err.to_string(), "Could not get telephony service");
    }

    #[test]
    fn test_missing_connectivity_service_is_a_setup_error() {
        let capabilities = FakeCapabilities::new(false, true);
        let wifi = FakeWifi::connected();
        let telephony = FakeTelephony::new(SimState::Ready, true);
        let config = fast_config();
        let services = DeviceServices {
            capabilities: &capabilities,
            wifi: &wifi,
            telephony: Some(&telephony),
            monitor: None,
        };

        let err = DeviceSetupCheck::new(services, &config).run().unwrap_err();
        assert_eq!(err.to_string(), "Could not get connectivity service");
    }

    #[test]
    fn test_available_event_passes_the_telephony_check() {
        let capabilities = FakeCapabilities::new(false, true);
        let wifi = FakeWifi::connected();
        let telephony = FakeTelephony::new(SimState::Ready, true);
        let monitor = FakeNetworkMonitor::new(vec![CallbackEntry::Available {
            network: "cellular-0".to_string(),
        }]);
        let config = fast_config();

        let report = run_check(&capabilities, &wifi, &telephony, &monitor, &config).unwrap();
        assert_eq!(report.telephony, StepOutcome::Passed);
        assert_eq!(monitor.unregistrations(), 1);
    }
}
