//! Handles: opaque references to live host objects.
//!
//! A "show" or "play" operation creates a handle; follow-up operations
//! address it by [`HandleId`](stagehand_types::HandleId). See
//! [`HandleRegistry`] for the lifecycle and locking rules.

mod attrs;
mod registry;

pub use attrs::{Attr, AttrDelta, AttrError, HandleAttrs, Position, Size};
pub use registry::{ActiveHandle, HandleError, HandleRegistry, HandleSnapshot, HandleState};

pub(crate) use attrs::{check_size, check_unit};
