//! Hardware capability probing.
//!
//! Answers "does this device have a Wi-Fi radio / a cellular modem" without
//! touching the radios themselves. Pure queries: an absent capability is a
//! normal `false`, never an error.

use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Hardware capabilities the setup check cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Wifi,
    Telephony,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Wifi => write!(f, "wifi"),
            Capability::Telephony => write!(f, "telephony"),
        }
    }
}

/// Capability query interface.
pub trait CapabilityProber {
    fn has_capability(&self, capability: Capability) -> bool;
}

/// Prober backed by `/sys/class`.
///
/// Wi-Fi: an interface under `class/net` with a `wireless` subdirectory.
/// Telephony: a device in the kernel `wwan` class, or a `wwan*` interface.
pub struct SysfsCapabilityProber {
    sys_root: PathBuf,
}

impl SysfsCapabilityProber {
    pub fn new() -> Self {
        Self::with_root("/sys")
    }

    /// Root override for tests.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            sys_root: root.into(),
        }
    }

    fn net_interfaces(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = fs::read_dir(self.sys_root.join("class/net")) {
            for entry in entries.flatten() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names
    }

    fn has_wireless_interface(&self) -> bool {
        self.net_interfaces().iter().any(|name| {
            self.sys_root
                .join("class/net")
                .join(name)
                .join("wireless")
                .exists()
        })
    }

    fn has_modem(&self) -> bool {
        if let Ok(mut entries) = fs::read_dir(self.sys_root.join("class/wwan")) {
            if entries.next().is_some() {
                return true;
            }
        }
        self.net_interfaces()
            .iter()
            .any(|name| name.starts_with("wwan"))
    }
}

impl Default for SysfsCapabilityProber {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityProber for SysfsCapabilityProber {
    fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Wifi => self.has_wireless_interface(),
            Capability::Telephony => self.has_modem(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sysfs_has_no_capabilities() {
        let root = tempfile::tempdir().unwrap();
        let prober = SysfsCapabilityProber::with_root(root.path());
        assert!(!prober.has_capability(Capability::Wifi));
        assert!(!prober.has_capability(Capability::Telephony));
    }

    #[test]
    fn test_detects_wireless_interface() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("class/net/wlan0/wireless")).unwrap();
        fs::create_dir_all(root.path().join("class/net/eth0")).unwrap();
        let prober = SysfsCapabilityProber::with_root(root.path());
        assert!(prober.has_capability(Capability::Wifi));
        assert!(!prober.has_capability(Capability::Telephony));
    }

    #[test]
    fn test_detects_wwan_interface() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("class/net/wwan0")).unwrap();
        let prober = SysfsCapabilityProber::with_root(root.path());
        assert!(prober.has_capability(Capability::Telephony));
        assert!(!prober.has_capability(Capability::Wifi));
    }

    #[test]
    fn test_detects_wwan_class_device() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("class/wwan/wwan0")).unwrap();
        let prober = SysfsCapabilityProber::with_root(root.path());
        assert!(prober.has_capability(Capability::Telephony));
    }
}
