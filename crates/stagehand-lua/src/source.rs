//! Where scripts come from.

use crate::extract::extract_script;
use crate::turn::AttemptFailure;
use async_trait::async_trait;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// No more scripts to hand out.
    #[error("script source exhausted")]
    Exhausted,

    /// The response held nothing runnable.
    #[error("no script found in response")]
    NoScript,

    #[error("script source failed: {0}")]
    Failed(String),
}

/// Supplies scripts to a turn, typically by asking a model.
///
/// A failed fetch counts as a failed attempt.
#[async_trait]
pub trait ScriptSource: Send {
    /// Script for attempt `attempt` (1-based).
    async fn next_script(&mut self, attempt: u32) -> Result<String, SourceError>;

    /// Told about every failed attempt so the next script can do better.
    async fn record_failure(&mut self, failure: &AttemptFailure);
}

/// A fixed queue of scripts or model responses.
#[derive(Debug, Clone, Default)]
pub struct QueuedScripts {
    queue: VecDeque<String>,
    extract: bool,
    failures: Vec<AttemptFailure>,
    fetched: u32,
}

impl QueuedScripts {
    /// Scripts handed out as they are.
    pub fn new<I, S>(scripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: scripts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Model responses; the script is extracted from each.
    pub fn responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extract: true,
            ..Self::new(responses)
        }
    }

    /// Failures reported so far.
    #[must_use]
    pub fn failures(&self) -> &[AttemptFailure] {
        &self.failures
    }

    /// Number of `next_script` calls made.
    #[must_use]
    pub fn fetched(&self) -> u32 {
        self.fetched
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

#[async_trait]
impl ScriptSource for QueuedScripts {
    async fn next_script(&mut self, _attempt: u32) -> Result<String, SourceError> {
        self.fetched += 1;
        let next = self.queue.pop_front().ok_or(SourceError::Exhausted)?;
        if self.extract {
            extract_script(&next).ok_or(SourceError::NoScript)
        } else {
            Ok(next)
        }
    }

    async fn record_failure(&mut self, failure: &AttemptFailure) {
        self.failures.push(failure.clone());
    }
}
