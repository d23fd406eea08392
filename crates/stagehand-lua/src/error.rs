//! Error types for compiling and running scripts.

use stagehand_runtime::DispatchError;
use stagehand_types::ErrorCode;
use thiserror::Error;

/// The script did not compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("compile error: {message}")]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&mlua::Error> for CompileError {
    fn from(err: &mlua::Error) -> Self {
        match err {
            mlua::Error::SyntaxError { message, .. } => Self::new(message.clone()),
            other => Self::new(other.to_string()),
        }
    }
}

/// A compiled script that failed while running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptFailure {
    /// A host call failed and the script did not handle it.
    #[error("unhandled host error: {0}")]
    Host(DispatchError),

    /// The script raised an error of its own.
    #[error("runtime error: {message}")]
    Exception { message: String },

    #[error("instruction limit exceeded ({limit})")]
    InstructionLimit { limit: u32 },
}

impl ScriptFailure {
    pub fn exception(message: impl Into<String>) -> Self {
        Self::Exception {
            message: message.into(),
        }
    }

    /// Code of the host error, if that is what ended the script.
    #[must_use]
    pub fn host_code(&self) -> Option<&'static str> {
        match self {
            Self::Host(e) => Some(e.code()),
            Self::Exception { .. } | Self::InstructionLimit { .. } => None,
        }
    }

    /// What the user would have to change for the call to pass, for
    /// failures that have such a remedy.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Host(DispatchError::PermissionDenied(denied)) => Some(denied.hint()),
            _ => None,
        }
    }
}

/// Failure setting up the Lua VM.
#[derive(Debug, Error)]
pub enum LuaError {
    #[error("lua error: {0}")]
    Runtime(#[from] mlua::Error),

    #[error("failed to start script thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl From<LuaError> for ScriptFailure {
    fn from(err: LuaError) -> Self {
        Self::exception(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_auth::{AccessDenied, Capability};

    #[test]
    fn host_code_only_for_host_failures() {
        let host = ScriptFailure::Host(DispatchError::UnknownMood("x".into()));
        assert_eq!(host.host_code(), Some("UNKNOWN_MOOD"));
        assert_eq!(ScriptFailure::exception("boom").host_code(), None);
        assert_eq!(
            ScriptFailure::InstructionLimit { limit: 10 }.to_string(),
            "instruction limit exceeded (10)"
        );
    }

    #[test]
    fn hint_only_for_denials() {
        let denied = ScriptFailure::Host(DispatchError::from(AccessDenied::CapabilityDenied {
            operation: "audio.play".into(),
            required: Capability::AUDIO,
            available: Capability::IMAGE,
        }));
        assert_eq!(
            denied.hint().as_deref(),
            Some("grant 'audio' in settings to allow this operation")
        );
        assert_eq!(ScriptFailure::Host(DispatchError::UnknownMood("x".into())).hint(), None);
        assert_eq!(ScriptFailure::exception("boom").hint(), None);
    }

    #[test]
    fn compile_error_display() {
        let err = CompileError::new("unexpected symbol near 'then'");
        assert_eq!(err.to_string(), "compile error: unexpected symbol near 'then'");
    }
}
