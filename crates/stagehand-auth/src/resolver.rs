//! Permission resolution.
//!
//! [`PermissionResolver::resolve`] is the only way to obtain a non-empty
//! [`EffectivePermissions`]. The inner set is private, so nothing outside
//! this module can union extra capabilities into an effective set or patch
//! one in place: a change to pack or grants means calling `resolve` again.

use crate::Capability;
use serde::Serialize;

/// The capability set a session enforces.
///
/// Always `pack_required ∩ user_granted` for the inputs it was resolved from.
///
/// # Example
///
/// ```
/// use stagehand_auth::{Capability, EffectivePermissions, PermissionResolver};
///
/// let effective = PermissionResolver::resolve(
///     Capability::IMAGE | Capability::AUDIO,
///     Capability::IMAGE | Capability::VIDEO,
/// );
/// assert!(effective.allows(Capability::IMAGE));
/// assert!(!effective.allows(Capability::AUDIO));
///
/// assert!(EffectivePermissions::none().is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EffectivePermissions(Capability);

impl EffectivePermissions {
    /// An effective set allowing nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self(Capability::empty())
    }

    /// Returns the underlying capability set.
    #[must_use]
    pub const fn capabilities(&self) -> Capability {
        self.0
    }

    /// Returns `true` if every flag in `required` is present.
    #[must_use]
    pub fn allows(&self, required: Capability) -> bool {
        self.0.contains(required)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EffectivePermissions {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Display for EffectivePermissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Computes effective permissions from pack requirements and user grants.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    /// Returns exactly `pack_required ∩ user_granted`.
    ///
    /// Pure and total: an empty result is valid.
    #[must_use]
    pub fn resolve(pack_required: Capability, user_granted: Capability) -> EffectivePermissions {
        EffectivePermissions(pack_required & user_granted)
    }

    /// Returns capabilities the pack requires but the user has not granted.
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand_auth::{Capability, PermissionResolver};
    ///
    /// let missing = PermissionResolver::find_missing(
    ///     Capability::IMAGE | Capability::AUDIO,
    ///     Capability::IMAGE,
    /// );
    /// assert_eq!(missing, Capability::AUDIO);
    /// ```
    #[must_use]
    pub fn find_missing(pack_required: Capability, user_granted: Capability) -> Capability {
        pack_required - user_granted
    }
}
