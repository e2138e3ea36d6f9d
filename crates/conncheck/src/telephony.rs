//! SIM and cellular subscription status.
//!
//! ModemManager is the source of truth for modem and SIM state on the bench
//! hosts; the adapter here shells out to `mmcli` and maps its key-value
//! output onto [`SimState`].

use std::fmt;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

const MODEM_PATH_PREFIX: &str = "/org/freedesktop/ModemManager1/Modem/";

/// State of the cellular subscription module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimState {
    Unknown,
    Absent,
    Locked,
    NotReady,
    PermDisabled,
    CardError,
    Ready,
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimState::Unknown => "unknown",
            SimState::Absent => "absent",
            SimState::Locked => "locked",
            SimState::NotReady => "not-ready",
            SimState::PermDisabled => "perm-disabled",
            SimState::CardError => "card-error",
            SimState::Ready => "ready",
        };
        write!(f, "{}", name)
    }
}

/// Telephony status interface.
pub trait TelephonyService {
    /// Current SIM state, read live from the device.
    fn sim_state(&self) -> SimState;

    /// Whether the current radio/subscription configuration permits data
    /// sessions at all. Independent of [`sim_state`](Self::sim_state): a
    /// ready SIM on a voice-only plan reports `false` here.
    fn is_data_connectivity_possible(&self) -> bool;
}

/// Telephony reader backed by ModemManager.
pub struct ModemManagerTelephony {
    modem_index: u32,
}

impl ModemManagerTelephony {
    /// Detect the first modem ModemManager knows about. `None` means the
    /// telephony service is unavailable on this host (no ModemManager, or no
    /// modem enumerated).
    pub fn detect() -> Option<Self> {
        let output = Command::new("mmcli")
            .args(["-L", "--output-keyvalue"])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let modem_index = modem_index_from_list(&stdout)?;
        debug!("found modem {}", modem_index);
        Some(Self { modem_index })
    }

    fn modem_keyvalues(&self) -> Option<String> {
        let output = Command::new("mmcli")
            .args(["-m", &self.modem_index.to_string(), "--output-keyvalue"])
            .output()
            .ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TelephonyService for ModemManagerTelephony {
    fn sim_state(&self) -> SimState {
        self.modem_keyvalues()
            .map(|raw| sim_state_from_keyvalues(&raw))
            .unwrap_or(SimState::Unknown)
    }

    fn is_data_connectivity_possible(&self) -> bool {
        self.modem_keyvalues()
            .map(|raw| data_possible_from_keyvalues(&raw))
            .unwrap_or(false)
    }
}

/// Extract the first modem index from `mmcli -L --output-keyvalue` output.
fn modem_index_from_list(raw: &str) -> Option<u32> {
    for line in raw.lines() {
        let Some((_, value)) = line.split_once(':') else {
            continue;
        };
        if let Some(index) = value.trim().strip_prefix(MODEM_PATH_PREFIX) {
            return index.parse().ok();
        }
    }
    None
}

fn keyvalue<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    raw.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        (k.trim() == key).then(|| v.trim())
    })
}

/// Map `modem.generic.state` (and the failed-reason detail) to a SIM state.
fn sim_state_from_keyvalues(raw: &str) -> SimState {
    match keyvalue(raw, "modem.generic.state").unwrap_or("") {
        "failed" => match keyvalue(raw, "modem.generic.state-failed-reason") {
            Some("sim-missing") => SimState::Absent,
            Some("sim-error") => SimState::CardError,
            _ => SimState::Unknown,
        },
        "locked" => SimState::Locked,
        "initializing" | "disabled" | "disabling" | "enabling" => SimState::NotReady,
        // Past the enable barrier the SIM itself is usable, even if the
        // modem is still hunting for a network.
        "enabled" | "searching" | "registered" | "connecting" | "connected" => SimState::Ready,
        _ => SimState::Unknown,
    }
}

/// Data sessions are possible once the modem is registered on a network.
fn data_possible_from_keyvalues(raw: &str) -> bool {
    matches!(
        keyvalue(raw, "modem.3gpp.registration-state"),
        Some("home") | Some("roaming")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEM_LIST: &str =
        "modem-list.length   : 1\nmodem-list.value[1] : /org/freedesktop/ModemManager1/Modem/3\n";

    const MODEM_READY: &str = "\
modem.generic.state                : registered
modem.generic.power-state          : on
modem.3gpp.registration-state      : home
modem.3gpp.operator-name           : BenchNet
";

    const MODEM_SEARCHING: &str = "\
modem.generic.state                : searching
modem.3gpp.registration-state      : searching
";

    const MODEM_NO_SIM: &str = "\
modem.generic.state                : failed
modem.generic.state-failed-reason  : sim-missing
";

    const MODEM_LOCKED: &str = "\
modem.generic.state                : locked
modem.generic.unlock-required      : sim-pin
";

    #[test]
    fn test_modem_index_from_list() {
        assert_eq!(modem_index_from_list(MODEM_LIST), Some(3));
        assert_eq!(modem_index_from_list("modem-list.length : 0\n"), None);
    }

    #[test]
    fn test_registered_modem_is_ready_with_data() {
        assert_eq!(sim_state_from_keyvalues(MODEM_READY), SimState::Ready);
        assert!(data_possible_from_keyvalues(MODEM_READY));
    }

    #[test]
    fn test_searching_modem_has_usable_sim_but_no_data() {
        assert_eq!(sim_state_from_keyvalues(MODEM_SEARCHING), SimState::Ready);
        assert!(!data_possible_from_keyvalues(MODEM_SEARCHING));
    }

    #[test]
    fn test_missing_sim_maps_to_absent() {
        assert_eq!(sim_state_from_keyvalues(MODEM_NO_SIM), SimState::Absent);
        assert!(!data_possible_from_keyvalues(MODEM_NO_SIM));
    }

    #[test]
    fn test_locked_modem_maps_to_locked() {
        assert_eq!(sim_state_from_keyvalues(MODEM_LOCKED), SimState::Locked);
    }

    #[test]
    fn test_sim_state_display_is_operator_readable() {
        assert_eq!(SimState::Locked.to_string(), "locked");
        assert_eq!(SimState::NotReady.to_string(), "not-ready");
    }
}
