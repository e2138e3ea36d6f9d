//! Error types for the device setup check.

use thiserror::Error;

/// Remediation hint appended to every precondition failure.
pub const REMEDIATION_HINT: &str = "Check the test bench. To run anyway for \
quick & dirty local testing, re-run with --skip-device-check or set \
CONNCHECK_SKIP=1.";

/// Fatal conditions that abort a check run.
///
/// Messages are phrased as bench misconfiguration, never as expected/actual
/// test output, so an operator does not mistake them for a code regression.
#[derive(Error, Debug)]
pub enum CheckError {
    /// A required platform service could not be obtained.
    #[error("Could not get {0} service")]
    SetupUnavailable(&'static str),

    /// The device does not satisfy a check prerequisite.
    #[error("{message}")]
    PreconditionNotMet { message: String },
}

impl CheckError {
    /// Precondition failure with the remediation hint appended.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionNotMet {
            message: format!("{} {}", message.into(), REMEDIATION_HINT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_carries_hint() {
        let err = CheckError::precondition("The device has no SIM card inserted.");
        let message = err.to_string();
        assert!(message.starts_with("The device has no SIM card inserted."));
        assert!(message.contains("--skip-device-check"));
        assert!(message.contains("CONNCHECK_SKIP"));
    }

    #[test]
    fn test_setup_unavailable_names_the_service() {
        let err = CheckError::SetupUnavailable("telephony");
        assert_eq!(err.to_string(), "Could not get telephony service");
    }
}
