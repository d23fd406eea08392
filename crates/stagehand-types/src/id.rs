//! Identifier types.
//!
//! Handle ids are plain integers allocated from a monotonic counter owned by
//! the handle registry. A value is never handed out twice within a process,
//! so a stale id held by a script can only ever address its original object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a host-managed object (a window or a media stream).
///
/// Scripts see the raw number; the host never interprets it beyond lookup.
///
/// # Example
///
/// ```
/// use stagehand_types::HandleId;
///
/// let a = HandleId::from_raw(1);
/// let b = HandleId::from_raw(2);
/// assert!(a < b);
/// assert_eq!(a.as_u64(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(u64);

impl HandleId {
    /// Wraps a raw id.
    ///
    /// Only the registry allocates fresh ids; this constructor exists for
    /// ids coming back from scripts and for tests.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_hash_prefix() {
        assert_eq!(HandleId::from_raw(42).to_string(), "#42");
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&HandleId::from_raw(9)).expect("serialize");
        assert_eq!(json, "9");
        let parsed: HandleId = serde_json::from_str("9").expect("deserialize");
        assert_eq!(parsed, HandleId::from_raw(9));
    }

    #[test]
    fn ordering_follows_allocation_order() {
        let mut ids = vec![
            HandleId::from_raw(3),
            HandleId::from_raw(1),
            HandleId::from_raw(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                HandleId::from_raw(1),
                HandleId::from_raw(2),
                HandleId::from_raw(3)
            ]
        );
    }
}
