//! Errors returned across the script boundary.

use stagehand_auth::AccessDenied;
use stagehand_types::{Category, ErrorCode, HandleId};
use thiserror::Error;

/// A rejected operation call.
///
/// Every variant is returned synchronously to the calling script; none of
/// them ends the turn by itself.
///
/// | Variant | Code | Side effects before failure |
/// |---------|------|-----------------------------|
/// | `PermissionDenied` | `PERMISSION_DENIED` | none |
/// | `InvalidHandle` | `INVALID_HANDLE` | none |
/// | `AssetNotFound` | `ASSET_NOT_FOUND` | none |
/// | `HostOperation` | `HOST_OPERATION_FAILED` | executor attempted; registry untouched |
/// | `InvalidArguments` | `INVALID_ARGUMENTS` | none |
/// | `UnknownMood` | `UNKNOWN_MOOD` | none |
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    PermissionDenied(#[from] AccessDenied),

    #[error("invalid handle {id}: unknown, closed or of another kind")]
    InvalidHandle { id: HandleId },

    #[error("no {category} content available in this pack")]
    AssetNotFound { category: Category },

    #[error("'{operation}' failed on the host: {message}")]
    HostOperation { operation: String, message: String },

    #[error("invalid arguments for '{operation}': {message}")]
    InvalidArguments { operation: String, message: String },

    #[error("unknown mood: {0}")]
    UnknownMood(String),
}

impl DispatchError {
    pub fn host(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn invalid_arguments(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidArguments {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

impl ErrorCode for DispatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(e) => e.code(),
            Self::InvalidHandle { .. } => "INVALID_HANDLE",
            Self::AssetNotFound { .. } => "ASSET_NOT_FOUND",
            Self::HostOperation { .. } => "HOST_OPERATION_FAILED",
            Self::InvalidArguments { .. } => "INVALID_ARGUMENTS",
            Self::UnknownMood(_) => "UNKNOWN_MOOD",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::PermissionDenied(e) => e.is_recoverable(),
            Self::AssetNotFound { .. } => false,
            Self::InvalidHandle { .. }
            | Self::HostOperation { .. }
            | Self::InvalidArguments { .. }
            | Self::UnknownMood(_) => true,
        }
    }
}
