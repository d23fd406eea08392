//! Handle registry.
//!
//! # Lifecycle
//!
//! ```text
//!            create / activate
//!                   │
//!                   ▼
//!              ┌─────────┐  mutate
//!              │ Active  │◄────────┐
//!              └────┬────┘─────────┘
//!                   │ close / complete
//!                   ▼
//!              ┌─────────┐
//!              │ Closed  │  every later call: InvalidHandle
//!              └─────────┘
//! ```
//!
//! Ids come from a monotonic counter and are never reused. Closed entries
//! stay in the map so that a stale id keeps failing instead of becoming
//! unknown and, later, ambiguous.
//!
//! # Locking
//!
//! The id map sits behind a `RwLock`; every entry has its own `Mutex`.
//! [`HandleRegistry::with_active`] holds the entry lock for the whole
//! closure, so two operations on the same handle are linearized and the
//! loser of a race against `close` observes `Closed`.

use super::attrs::{AttrDelta, AttrError, HandleAttrs};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use stagehand_types::{Category, HandleId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Lifecycle state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandleState {
    Active,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandleError {
    /// Unknown id, or the handle is already closed.
    #[error("invalid handle {0}: unknown or closed")]
    Invalid(HandleId),

    /// The delta failed validation; nothing was applied.
    #[error(transparent)]
    Attr(#[from] AttrError),
}

/// Point-in-time copy of a handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandleSnapshot {
    pub id: HandleId,
    pub category: Category,
    pub state: HandleState,
    pub attrs: HandleAttrs,
}

#[derive(Debug)]
struct Entry {
    category: Category,
    state: HandleState,
    attrs: HandleAttrs,
}

/// Exclusive access to an active handle inside [`HandleRegistry::with_active`].
#[derive(Debug)]
pub struct ActiveHandle<'a> {
    id: HandleId,
    entry: &'a mut Entry,
}

impl ActiveHandle<'_> {
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.entry.category
    }

    #[must_use]
    pub fn attrs(&self) -> &HandleAttrs {
        &self.entry.attrs
    }

    /// Replaces the attribute snapshot wholesale.
    pub fn commit(&mut self, attrs: HandleAttrs) {
        self.entry.attrs = attrs;
    }

    /// Transitions to `Closed`. Later calls through the registry fail.
    pub fn close(&mut self) {
        self.entry.state = HandleState::Closed;
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.entry.state == HandleState::Closed
    }
}

/// Tracks host objects created by scripts.
#[derive(Debug)]
pub struct HandleRegistry {
    next_id: AtomicU64,
    entries: RwLock<HashMap<HandleId, Arc<Mutex<Entry>>>>,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Allocates a fresh id without creating an entry.
    ///
    /// Used when the host must know the id before the object exists. An id
    /// that is never activated is simply skipped.
    pub fn reserve(&self) -> HandleId {
        HandleId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a reserved id as an active handle.
    pub fn activate(&self, id: HandleId, category: Category, attrs: HandleAttrs) -> HandleSnapshot {
        let entry = Entry {
            category,
            state: HandleState::Active,
            attrs,
        };
        let snapshot = snapshot(id, &entry);
        self.entries.write().insert(id, Arc::new(Mutex::new(entry)));
        tracing::info!(handle = %id, category = %category, "handle created");
        snapshot
    }

    /// Allocates an id and registers an active handle in one step.
    ///
    /// The dispatcher instead uses [`reserve`](Self::reserve) and
    /// [`activate`](Self::activate) so the executor runs before the entry
    /// exists.
    pub fn create(&self, category: Category, attrs: HandleAttrs) -> HandleSnapshot {
        let id = self.reserve();
        self.activate(id, category, attrs)
    }

    fn entry(&self, id: HandleId) -> Option<Arc<Mutex<Entry>>> {
        self.entries.read().get(&id).cloned()
    }

    /// Runs `f` with exclusive access to an active handle.
    ///
    /// # Errors
    ///
    /// [`HandleError::Invalid`] (converted into `E`) when the id is unknown
    /// or closed; otherwise whatever `f` returns.
    pub fn with_active<T, E, F>(&self, id: HandleId, f: F) -> Result<T, E>
    where
        E: From<HandleError>,
        F: FnOnce(&mut ActiveHandle<'_>) -> Result<T, E>,
    {
        let entry = self.entry(id).ok_or(HandleError::Invalid(id))?;
        let mut guard = entry.lock();
        if guard.state == HandleState::Closed {
            return Err(HandleError::Invalid(id).into());
        }
        let mut active = ActiveHandle {
            id,
            entry: &mut guard,
        };
        let result = f(&mut active);
        if guard.state == HandleState::Closed {
            tracing::info!(handle = %id, category = %guard.category, "handle closed");
        }
        result
    }

    /// Applies an attribute delta, all or nothing.
    ///
    /// The dispatcher does not call this: it computes the new attributes with
    /// [`HandleAttrs::with_delta`] inside [`with_active`](Self::with_active)
    /// so the executor runs while the handle lock is held.
    ///
    /// # Errors
    ///
    /// [`HandleError::Invalid`] for unknown/closed ids and
    /// [`HandleError::Attr`] when the delta fails validation.
    pub fn mutate(&self, id: HandleId, delta: &AttrDelta) -> Result<HandleSnapshot, HandleError> {
        self.with_active(id, |h| {
            let next = h.attrs().with_delta(h.category(), delta)?;
            h.commit(next);
            Ok(snapshot(h.id, h.entry))
        })
    }

    /// Closes a handle. A second close is an error.
    ///
    /// # Errors
    ///
    /// [`HandleError::Invalid`] for unknown or already closed ids.
    pub fn close(&self, id: HandleId) -> Result<(), HandleError> {
        self.with_active(id, |h| {
            h.close();
            Ok(())
        })
    }

    /// Marks a handle closed because its playback reached its end.
    ///
    /// # Errors
    ///
    /// [`HandleError::Invalid`] for unknown or already closed ids.
    pub fn complete(&self, id: HandleId) -> Result<(), HandleError> {
        tracing::debug!(handle = %id, "playback completed");
        self.close(id)
    }

    /// Returns a copy of the handle, active or closed.
    #[must_use]
    pub fn get(&self, id: HandleId) -> Option<HandleSnapshot> {
        self.entry(id).map(|e| snapshot(id, &e.lock()))
    }

    /// Ids of all active handles, ascending.
    #[must_use]
    pub fn active_ids(&self) -> Vec<HandleId> {
        let entries: Vec<(HandleId, Arc<Mutex<Entry>>)> = self
            .entries
            .read()
            .iter()
            .map(|(id, e)| (*id, Arc::clone(e)))
            .collect();
        let mut ids: Vec<HandleId> = entries
            .into_iter()
            .filter(|(_, e)| e.lock().state == HandleState::Active)
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// Number of handles ever registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn snapshot(id: HandleId, entry: &Entry) -> HandleSnapshot {
    HandleSnapshot {
        id,
        category: entry.category,
        state: entry.state,
        attrs: entry.attrs.clone(),
    }
}
