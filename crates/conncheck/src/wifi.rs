//! Wi-Fi connection helper.

use std::process::Command;
use std::time::Duration;

use tracing::info;

use crate::error::CheckError;

/// Brings the device's Wi-Fi link up, or verifies that it already is.
pub trait WifiConnector {
    fn ensure_connected(&self) -> Result<(), CheckError>;
}

/// Connector backed by NetworkManager.
///
/// If the Wi-Fi device is already in the `connected` state this is a no-op;
/// otherwise one `nmcli device connect` attempt is made with a bounded wait.
pub struct NetworkManagerWifi {
    connect_wait: Duration,
}

impl NetworkManagerWifi {
    pub fn new(connect_wait: Duration) -> Self {
        Self { connect_wait }
    }

    fn wifi_device(&self) -> Result<(String, String), CheckError> {
        let output = Command::new("nmcli")
            .args(["-t", "-f", "DEVICE,TYPE,STATE", "device"])
            .output()
            .map_err(|_| CheckError::SetupUnavailable("Wi-Fi"))?;
        if !output.status.success() {
            return Err(CheckError::SetupUnavailable("Wi-Fi"));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        wifi_device_line(&stdout).ok_or(CheckError::SetupUnavailable("Wi-Fi"))
    }
}

impl WifiConnector for NetworkManagerWifi {
    fn ensure_connected(&self) -> Result<(), CheckError> {
        let (device, state) = self.wifi_device()?;
        if state.starts_with("connected") {
            return Ok(());
        }

        info!("Wi-Fi device {} is {}, attempting to connect", device, state);
        let wait_secs = self.connect_wait.as_secs().max(1).to_string();
        let output = Command::new("nmcli")
            .args(["--wait", &wait_secs, "device", "connect", &device])
            .output()
            .map_err(|_| CheckError::SetupUnavailable("Wi-Fi"))?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(CheckError::precondition(format!(
            "The device could not connect to Wi-Fi ({}).",
            stderr.trim()
        )))
    }
}

/// First Wi-Fi device and its state in `nmcli -t -f DEVICE,TYPE,STATE device`
/// output.
fn wifi_device_line(raw: &str) -> Option<(String, String)> {
    raw.lines().find_map(|line| {
        let mut fields = line.splitn(3, ':');
        let device = fields.next()?;
        let dev_type = fields.next()?;
        let state = fields.next()?;
        (dev_type == "wifi").then(|| (device.to_string(), state.to_string()))
    })
}
