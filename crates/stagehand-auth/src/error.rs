//! Access denied error type.

use crate::Capability;
use stagehand_types::ErrorCode;
use thiserror::Error;

/// Error returned when an operation's capability is not in the effective set.
///
/// # Example
///
/// ```
/// use stagehand_auth::{AccessDenied, Capability};
/// use stagehand_types::ErrorCode;
///
/// let err = AccessDenied::CapabilityDenied {
///     operation: "audio.play".to_string(),
///     required: Capability::AUDIO,
///     available: Capability::IMAGE,
/// };
///
/// assert!(err.to_string().contains("audio.play"));
/// assert_eq!(err.code(), "PERMISSION_DENIED");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// Operation requires a capability the session does not have.
    #[error("permission denied: '{operation}' requires {required}, available: {available}")]
    CapabilityDenied {
        /// The operation that was attempted.
        operation: String,
        /// The capability required for the operation.
        required: Capability,
        /// The effective capabilities of the session.
        available: Capability,
    },
}

impl AccessDenied {
    /// Returns the capabilities that would have to be granted for the
    /// operation to pass.
    #[must_use]
    pub fn missing(&self) -> Capability {
        match self {
            Self::CapabilityDenied {
                required,
                available,
                ..
            } => *required - *available,
        }
    }

    /// Returns a user-facing hint naming what to grant.
    #[must_use]
    pub fn hint(&self) -> String {
        let names: Vec<String> = self
            .missing()
            .names()
            .into_iter()
            .map(str::to_lowercase)
            .collect();
        format!(
            "grant '{}' in settings to allow this operation",
            names.join("', '")
        )
    }
}

impl ErrorCode for AccessDenied {
    fn code(&self) -> &'static str {
        "PERMISSION_DENIED"
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denied() -> AccessDenied {
        AccessDenied::CapabilityDenied {
            operation: "audio.play".to_string(),
            required: Capability::AUDIO,
            available: Capability::IMAGE | Capability::VIDEO,
        }
    }

    #[test]
    fn capability_denied_display() {
        let msg = denied().to_string();
        assert!(msg.contains("audio.play"), "got: {msg}");
        assert!(msg.contains("requires AUDIO"), "got: {msg}");
        assert!(msg.contains("IMAGE | VIDEO"), "got: {msg}");
    }

    #[test]
    fn missing_and_hint() {
        let err = denied();
        assert_eq!(err.missing(), Capability::AUDIO);
        assert_eq!(err.hint(), "grant 'audio' in settings to allow this operation");
    }

    #[test]
    fn never_recoverable() {
        let err = denied();
        assert_eq!(err.code(), "PERMISSION_DENIED");
        assert!(!err.is_recoverable());
    }
}
