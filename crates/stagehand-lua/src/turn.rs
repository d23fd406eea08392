//! The bounded-retry compile/execute loop behind one conversational turn.
//!
//! ```text
//! AwaitScript ──source error──────────┐
//!     │                               │
//!     ▼                               │
//!  Compile ──CompileError─────────────┤
//!     │                               ▼
//!     ▼                     record, attempts += 1
//!  Execute ──ScriptFailure──► attempts < max ? AwaitScript : Abort
//!     │
//!     ▼
//!  Complete
//! ```
//!
//! The attempt bound is shared by every kind of failure in the turn. On
//! abort the loop stops; handles created by failed attempts stay active
//! until they are closed explicitly or the session is torn down.

use crate::bridge::{HostBridge, DEFAULT_CAPACITY};
use crate::engine::ScriptEngine;
use crate::error::{LuaError, ScriptFailure};
use crate::feedback::FeedbackLog;
use crate::source::ScriptSource;
use stagehand_runtime::{DispatchOutput, Dispatcher, HandleInfo};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

/// Default attempts per turn.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default feedback history length.
pub const DEFAULT_FEEDBACK_HISTORY: usize = 50;

const ABORT_NOTICE: &str =
    "attempt limit reached for this turn; try a different approach instead of repeating the failing script";

/// Where an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStage {
    Source,
    Compile,
    Execute,
}

impl fmt::Display for AttemptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Compile => "compile",
            Self::Execute => "execute",
        })
    }
}

/// One failed attempt, as reported to the script source and the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    /// 1-based attempt number.
    pub attempt: u32,
    pub stage: AttemptStage,
    /// Code of an unhandled host error, if that ended the script.
    pub code: Option<&'static str>,
    pub message: String,
    /// Handles the attempt created before failing; they stay active.
    pub handles: Vec<HandleInfo>,
}

impl AttemptFailure {
    fn new(attempt: u32, stage: AttemptStage, message: impl Into<String>) -> Self {
        Self {
            attempt,
            stage,
            code: None,
            message: message.into(),
            handles: Vec::new(),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt {} ({}): {}", self.attempt, self.stage, self.message)
    }
}

/// A completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Attempts used, including the successful one.
    pub attempts: u32,
    /// Host calls made by the successful script.
    pub calls: u64,
    /// Captured `print` output.
    pub output: Vec<String>,
    pub truncated: bool,
    /// Handles created by the successful script.
    pub handles: Vec<HandleInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("turn aborted after {attempts} failed attempts")]
    Aborted {
        attempts: u32,
        failures: Vec<AttemptFailure>,
    },
}

impl TurnError {
    #[must_use]
    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            Self::Aborted { failures, .. } => failures,
        }
    }
}

/// Drives turns against one dispatcher.
///
/// `run_turn` takes `&mut self`, so turns on one loop never overlap.
pub struct TurnLoop<E: ScriptEngine> {
    engine: Arc<E>,
    dispatcher: Arc<Dispatcher>,
    max_attempts: u32,
    capacity: usize,
    feedback: FeedbackLog,
}

impl<E: ScriptEngine> fmt::Debug for TurnLoop<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnLoop")
            .field("max_attempts", &self.max_attempts)
            .field("feedback", &self.feedback.len())
            .finish_non_exhaustive()
    }
}

impl<E: ScriptEngine> TurnLoop<E> {
    #[must_use]
    pub fn new(engine: E, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            engine: Arc::new(engine),
            dispatcher,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            capacity: DEFAULT_CAPACITY,
            feedback: FeedbackLog::new(DEFAULT_FEEDBACK_HISTORY),
        }
    }

    /// Attempts per turn; at least one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_feedback_history(mut self, capacity: usize) -> Self {
        self.feedback = FeedbackLog::new(capacity);
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Failure messages from recent turns, for the conversation context.
    #[must_use]
    pub fn feedback(&self) -> &FeedbackLog {
        &self.feedback
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Runs one turn.
    ///
    /// # Errors
    ///
    /// [`TurnError::Aborted`] once `max_attempts` attempts have failed.
    pub async fn run_turn<S>(&mut self, source: &mut S) -> Result<TurnReport, TurnError>
    where
        S: ScriptSource + ?Sized,
    {
        let mut failures = Vec::new();
        for attempt in 1..=self.max_attempts {
            match self.attempt(attempt, source).await {
                Ok(report) => {
                    tracing::info!(
                        attempt,
                        calls = report.calls,
                        handles = report.handles.len(),
                        "turn complete"
                    );
                    return Ok(report);
                }
                Err(failure) => {
                    tracing::warn!(
                        attempt,
                        stage = %failure.stage,
                        code = ?failure.code,
                        error = %failure.message,
                        "attempt failed"
                    );
                    self.feedback.push(failure.to_string());
                    source.record_failure(&failure).await;
                    failures.push(failure);
                }
            }
        }

        self.feedback.push(ABORT_NOTICE);
        tracing::error!(attempts = self.max_attempts, "turn aborted");
        Err(TurnError::Aborted {
            attempts: self.max_attempts,
            failures,
        })
    }

    async fn attempt<S>(&self, attempt: u32, source: &mut S) -> Result<TurnReport, AttemptFailure>
    where
        S: ScriptSource + ?Sized,
    {
        let script = source
            .next_script(attempt)
            .await
            .map_err(|e| AttemptFailure::new(attempt, AttemptStage::Source, e.to_string()))?;
        let unit = self
            .engine
            .compile(&script)
            .map_err(|e| AttemptFailure::new(attempt, AttemptStage::Compile, e.to_string()))?;

        let (bridge, mut requests) = HostBridge::channel(self.capacity);
        let (done_tx, done_rx) = oneshot::channel();
        let engine = Arc::clone(&self.engine);
        std::thread::Builder::new()
            .name("stagehand-script".into())
            .spawn(move || {
                let result = engine.execute(unit, bridge);
                if done_tx.send(result).is_err() {
                    tracing::debug!("turn loop went away before the script finished");
                }
            })
            .map_err(|e| {
                AttemptFailure::new(attempt, AttemptStage::Execute, LuaError::Spawn(e).to_string())
            })?;

        let mut calls = 0;
        let mut handles = Vec::new();
        while let Some(request) = requests.recv().await {
            calls += 1;
            let result = self.dispatcher.dispatch(&request.call);
            if let Ok(DispatchOutput::Handle(info)) = &result {
                handles.push(*info);
            }
            request.respond(result);
        }

        let outcome = done_rx
            .await
            .unwrap_or_else(|_| Err(ScriptFailure::exception("script thread panicked")));
        match outcome {
            Ok(output) => Ok(TurnReport {
                attempts: attempt,
                calls,
                output: output.lines,
                truncated: output.truncated,
                handles,
            }),
            Err(failure) => {
                let message = match failure.hint() {
                    Some(hint) => format!("{failure} ({hint})"),
                    None => failure.to_string(),
                };
                Err(AttemptFailure {
                    attempt,
                    stage: AttemptStage::Execute,
                    code: failure.host_code(),
                    message,
                    handles,
                })
            }
        }
    }
}
