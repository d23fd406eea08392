//! Permission checking.
//!
//! [`require`] is the gate evaluated at the top of every gated operation.
//! It has no side effects beyond audit logging, so a denial leaves nothing
//! behind: no selection has happened, no handle exists, no executor ran.
//!
//! # Audit Logging
//!
//! - Allowed operations: debug level
//! - Denied operations: warn level

use crate::{AccessDenied, Capability, EffectivePermissions};

/// Checks that `effective` contains `required` for `operation`.
///
/// # Errors
///
/// Returns [`AccessDenied::CapabilityDenied`] naming the operation, the
/// required capability and what was available.
///
/// # Example
///
/// ```
/// use stagehand_auth::{checker, Capability, PermissionResolver};
///
/// let effective = PermissionResolver::resolve(Capability::ALL, Capability::IMAGE);
/// assert!(checker::require("image.show", Capability::IMAGE, &effective).is_ok());
/// assert!(checker::require("audio.play", Capability::AUDIO, &effective).is_err());
/// ```
pub fn require(
    operation: &str,
    required: Capability,
    effective: &EffectivePermissions,
) -> Result<(), AccessDenied> {
    if effective.allows(required) {
        tracing::debug!(
            operation = operation,
            required = %required,
            "operation allowed"
        );
        Ok(())
    } else {
        tracing::warn!(
            operation = operation,
            required = %required,
            available = %effective,
            "operation denied: capability not granted"
        );
        Err(AccessDenied::CapabilityDenied {
            operation: operation.to_string(),
            required,
            available: effective.capabilities(),
        })
    }
}
