//! Permission primitives for stagehand.
//!
//! Every effect a script can cause is gated by a [`Capability`]. The set a
//! session actually enforces is computed, never stored independently:
//!
//! ```text
//! EffectivePermissions = Pack.required ∩ UserGrants.granted
//! ```
//!
//! | Piece | Type | Role |
//! |-------|------|------|
//! | [`Capability`] | Bitflags | The finite set of grantable abilities |
//! | [`PermissionResolver`] | Unit struct | Computes the intersection |
//! | [`EffectivePermissions`] | Newtype | The enforced set; only `resolve` produces one |
//! | [`checker::require`] | Function | Gate evaluated first on every operation |
//! | [`AccessDenied`] | Error | What a failed gate reports |
//!
//! # Crate Architecture
//!
//! ```text
//! stagehand-types  (HandleId, Category, ErrorCode)
//!     ↑
//! stagehand-auth   ◄── THIS CRATE
//!     ↑
//! stagehand-runtime (SessionContext, Dispatcher)
//! ```
//!
//! # Design Principles
//!
//! - **Recompute, never patch**: a change to either input rebuilds the
//!   effective set from scratch
//! - **Deny wins**: a capability missing from either side is denied
//! - **Check first**: the checker runs before any selection or effect

pub mod capability;
pub mod checker;
pub mod error;
pub mod resolver;

pub use capability::Capability;
pub use checker::require;
pub use error::AccessDenied;
pub use resolver::{EffectivePermissions, PermissionResolver};
