//! Unified error interface.
//!
//! Every error that can reach a script, or the conversational context behind
//! it, implements [`ErrorCode`] so callers can branch on a stable code
//! instead of parsing messages.
//!
//! # Example
//!
//! ```
//! use stagehand_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum PlayerError {
//!     DeviceBusy,
//!     Corrupt,
//! }
//!
//! impl ErrorCode for PlayerError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::DeviceBusy => "PLAYER_DEVICE_BUSY",
//!             Self::Corrupt => "PLAYER_CORRUPT",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::DeviceBusy)
//!     }
//! }
//!
//! assert_eq!(PlayerError::DeviceBusy.code(), "PLAYER_DEVICE_BUSY");
//! assert!(!PlayerError::Corrupt.is_recoverable());
//! ```

/// Machine-readable error code interface.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, e.g. `"PERMISSION_DENIED"`
/// - **Stable**: a code is part of the script-facing contract
///
/// # Recoverability
///
/// An error is recoverable when the same script may reasonably try again
/// (a different argument, a different path). Permission denials are not:
/// only the user can change grants.
pub trait ErrorCode {
    /// Returns the stable machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying with different input may succeed.
    fn is_recoverable(&self) -> bool;
}
