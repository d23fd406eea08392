//! Executors: the host side that actually renders and plays things.
//!
//! The dispatcher never touches windows or audio devices itself. After a
//! call has passed the permission gate and selection, it hands an
//! [`Effect`] to the [`Executor`] registered for the call's category.
//!
//! ```text
//! Dispatcher ──Effect──► ExecutorSet ──► image executor   (window backend)
//!                                   ├──► audio executor   (media engine)
//!                                   └──► ...
//! ```
//!
//! Executors may run on their own threads; they must be `Send + Sync`.

use crate::catalog::ContentRef;
use crate::handle::HandleAttrs;
use crate::operation::OperationId;
use crate::options::TextStyle;
use parking_lot::Mutex;
use serde::Serialize;
use stagehand_types::{Category, HandleId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by an executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExecutorError {
    pub message: String,
}

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type EffectResult = Result<(), ExecutorError>;

/// One request to the host.
///
/// `attrs` is the full snapshot the object should have after the effect;
/// for a close it is the last known snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Effect<'a> {
    pub operation: OperationId,
    pub handle: Option<HandleId>,
    pub attrs: &'a HandleAttrs,
    /// Resolved content; `None` for prompts and handle mutations.
    pub content: Option<&'a ContentRef>,
    /// Prompt text.
    pub text: Option<&'a str>,
    pub style: Option<&'a TextStyle>,
    /// Auto-close delay.
    pub duration: Option<Duration>,
}

/// Host backend for one or more categories.
pub trait Executor: Send + Sync {
    /// Performs the effect.
    ///
    /// # Errors
    ///
    /// Any host-side failure; the dispatcher reports it to the script as a
    /// failed call and leaves the registry untouched.
    fn invoke(&self, effect: &Effect<'_>) -> EffectResult;
}

/// Executors by category.
#[derive(Clone, Default)]
pub struct ExecutorSet {
    executors: HashMap<Category, Arc<dyn Executor>>,
}

impl std::fmt::Debug for ExecutorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut categories: Vec<_> = self.executors.keys().collect();
        categories.sort();
        f.debug_struct("ExecutorSet")
            .field("categories", &categories)
            .finish()
    }
}

impl ExecutorSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses one executor for every category.
    #[must_use]
    pub fn uniform(executor: Arc<dyn Executor>) -> Self {
        let mut set = Self::new();
        for category in Category::ALL {
            set.executors.insert(category, Arc::clone(&executor));
        }
        set
    }

    /// Registers (or replaces) the executor for `category`.
    #[must_use]
    pub fn with(mut self, category: Category, executor: Arc<dyn Executor>) -> Self {
        self.executors.insert(category, executor);
        self
    }

    #[must_use]
    pub fn get(&self, category: Category) -> Option<&Arc<dyn Executor>> {
        self.executors.get(&category)
    }
}

/// Executor that only logs what it would do.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingExecutor;

impl Executor for LoggingExecutor {
    fn invoke(&self, effect: &Effect<'_>) -> EffectResult {
        tracing::info!(
            operation = %effect.operation,
            handle = ?effect.handle.map(HandleId::as_u64),
            content = ?effect.content.map(ToString::to_string),
            text = ?effect.text,
            duration_ms = ?effect.duration.map(|d| d.as_millis()),
            "effect"
        );
        Ok(())
    }
}

/// Owned copy of an [`Effect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedEffect {
    pub operation: OperationId,
    pub handle: Option<HandleId>,
    pub attrs: HandleAttrs,
    pub content: Option<ContentRef>,
    pub text: Option<String>,
}

impl From<&Effect<'_>> for RecordedEffect {
    fn from(effect: &Effect<'_>) -> Self {
        Self {
            operation: effect.operation,
            handle: effect.handle,
            attrs: effect.attrs.clone(),
            content: effect.content.cloned(),
            text: effect.text.map(str::to_string),
        }
    }
}

/// Executor that records every effect in memory.
///
/// Can be told to fail selected operations, which makes it the executor of
/// choice for exercising error paths.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    effects: Mutex<Vec<RecordedEffect>>,
    failing: Mutex<HashSet<OperationId>>,
}

impl RecordingExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later invocation of `operation` fail.
    pub fn fail_on(&self, operation: OperationId) {
        self.failing.lock().insert(operation);
    }

    /// Clears all configured failures.
    pub fn heal(&self) {
        self.failing.lock().clear();
    }

    /// Successfully performed effects, in order.
    #[must_use]
    pub fn effects(&self) -> Vec<RecordedEffect> {
        self.effects.lock().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.effects.lock().len()
    }
}

impl Executor for RecordingExecutor {
    fn invoke(&self, effect: &Effect<'_>) -> EffectResult {
        if self.failing.lock().contains(&effect.operation) {
            return Err(ExecutorError::new(format!(
                "{} failed: backend unavailable",
                effect.operation
            )));
        }
        self.effects.lock().push(RecordedEffect::from(effect));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Verb;

    fn effect<'a>(op: OperationId, attrs: &'a HandleAttrs) -> Effect<'a> {
        Effect {
            operation: op,
            handle: Some(HandleId::from_raw(1)),
            attrs,
            content: None,
            text: None,
            style: None,
            duration: None,
        }
    }

    #[test]
    fn recording_executor_records_and_fails() {
        let exec = RecordingExecutor::new();
        let attrs = HandleAttrs::default();
        let show = OperationId::new(Category::Image, Verb::Show).expect("op");
        let close = OperationId::new(Category::Image, Verb::Close).expect("op");

        exec.invoke(&effect(show, &attrs)).expect("ok");
        exec.fail_on(close);
        let err = exec.invoke(&effect(close, &attrs)).expect_err("configured to fail");
        assert!(err.message.contains("image.close"));
        assert_eq!(exec.count(), 1);
        assert_eq!(exec.effects()[0].operation, show);

        exec.heal();
        exec.invoke(&effect(close, &attrs)).expect("healed");
        assert_eq!(exec.count(), 2);
    }

    #[test]
    fn executor_set_lookup() {
        let recording: Arc<dyn Executor> = Arc::new(RecordingExecutor::new());
        let set = ExecutorSet::new().with(Category::Audio, recording);
        assert!(set.get(Category::Audio).is_some());
        assert!(set.get(Category::Image).is_none());

        let all = ExecutorSet::uniform(Arc::new(LoggingExecutor));
        assert!(Category::ALL.iter().all(|c| all.get(*c).is_some()));
    }

    #[test]
    fn logging_executor_never_fails() {
        let attrs = HandleAttrs::default();
        let op = OperationId::new(Category::Website, Verb::Show).expect("op");
        assert!(LoggingExecutor.invoke(&effect(op, &attrs)).is_ok());
    }
}
