//! Operation dispatcher.
//!
//! Every script call lands here. The dispatcher runs one fixed sequence per
//! call and stops at the first failing step:
//!
//! ```text
//! ReceiveCall
//!     │
//!     ▼
//! CheckPermission ──denied──────────────► PermissionDenied
//!     │
//!     ▼
//! ValidateArguments ──bad───────────────► InvalidArguments
//!     │
//!     ▼
//! SelectAsset (catalog categories) ─────► AssetNotFound
//!  or LockHandle (follow-up calls) ─────► InvalidHandle
//!     │
//!     ▼
//! InvokeExecutor ──failed───────────────► HostOperation
//!     │
//!     ▼
//! UpdateHandleRegistry
//!     │
//!     ▼
//! ReturnResult
//! ```
//!
//! An early exit performs none of the later steps. In particular a
//! permission denial happens before any selection, handle allocation or
//! executor call.
//!
//! Follow-up calls run their executor and registry update while holding the
//! handle's lock, so calls on one handle are linearized.

use crate::catalog::{Mood, Pack};
use crate::error::DispatchError;
use crate::executor::{Effect, Executor, ExecutorSet};
use crate::handle::{HandleError, HandleRegistry};
use crate::operation::{verb_name, HandleChange, OperationCall, OperationId, Verb};
use crate::options::ShowRequest;
use crate::selector::{AssetQuery, AssetSelector, SelectError};
use crate::session::SessionContext;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use stagehand_auth::{checker, Capability};
use stagehand_types::{Category, ErrorCode, HandleId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What a script receives for a newly created host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandleInfo {
    pub id: HandleId,
    pub category: Category,
}

/// Script-visible view of a mood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodView {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl From<&Mood> for MoodView {
    fn from(mood: &Mood) -> Self {
        Self {
            name: mood.name().to_string(),
            description: mood.description().to_string(),
            tags: mood.tags().iter().cloned().collect(),
        }
    }
}

/// Result of a successful call.
///
/// Never contains the selected content item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DispatchOutput {
    Handle(HandleInfo),
    Done,
    Mood(MoodView),
    Moods(Vec<String>),
}

impl From<HandleError> for DispatchError {
    fn from(err: HandleError) -> Self {
        match err {
            HandleError::Invalid(id) => Self::InvalidHandle { id },
            HandleError::Attr(e) => Self::invalid_arguments("handle update", e),
        }
    }
}

/// Central state machine between scripts and executors.
pub struct Dispatcher {
    session: RwLock<SessionContext>,
    registry: HandleRegistry,
    executors: ExecutorSet,
    rng: Mutex<StdRng>,
    calls: AtomicU64,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("executors", &self.executors)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(session: SessionContext, executors: ExecutorSet) -> Self {
        Self {
            session: RwLock::new(session),
            registry: HandleRegistry::new(),
            executors,
            rng: Mutex::new(StdRng::from_entropy()),
            calls: AtomicU64::new(0),
        }
    }

    /// Uses a seeded RNG for selection.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    /// Handles one call.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`]; every failure leaves the state as it was
    /// before the call, except that a failing executor may have attempted
    /// the effect.
    pub fn dispatch(&self, call: &OperationCall) -> Result<DispatchOutput, DispatchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let result = match call {
            OperationCall::Show(request) => self.show(request),
            OperationCall::Handle {
                category,
                handle,
                change,
            } => self.change(*category, *handle, *change),
            OperationCall::Malformed {
                category,
                verb,
                reason,
            } => self.malformed(*category, *verb, reason),
            OperationCall::GetMood => Ok(DispatchOutput::Mood(self.session.read().mood().into())),
            OperationCall::SetMood(name) => self
                .session
                .write()
                .set_mood(name)
                .map(|()| DispatchOutput::Done),
            OperationCall::ListMoods => Ok(DispatchOutput::Moods(
                self.session.read().pack().moods().names(),
            )),
        };
        if let Err(e) = &result {
            tracing::debug!(operation = %call.name(), code = e.code(), error = %e, "call rejected");
        }
        result
    }

    fn executor(&self, category: Category, operation: &str) -> Result<&Arc<dyn Executor>, DispatchError> {
        self.executors
            .get(category)
            .ok_or_else(|| DispatchError::host(operation, format!("no executor for {category}")))
    }

    fn show(&self, request: &ShowRequest) -> Result<DispatchOutput, DispatchError> {
        let category = request.category();
        let name = format!("{category}.{}", verb_name(category, Verb::Show));

        let content = {
            let session = self.session.read();
            checker::require(&name, Capability::for_category(category), session.effective())?;
            request
                .validate()
                .map_err(|e| DispatchError::invalid_arguments(&name, e))?;

            if category.uses_catalog() {
                let query = AssetQuery::new(category, request.tags());
                let mut rng = self.rng.lock();
                let selection =
                    AssetSelector::select(&query, session.mood(), session.pack().catalog(), &mut *rng)
                        .map_err(|SelectError::AssetNotFound(category)| {
                            DispatchError::AssetNotFound { category }
                        })?;
                Some(selection.item.content().clone())
            } else {
                None
            }
        };

        let operation = OperationId::new(category, Verb::Show)
            .ok_or_else(|| DispatchError::invalid_arguments(&name, "operation not supported"))?;
        let executor = self.executor(category, &name)?;
        let attrs = request.attrs();
        let id = category.creates_handle().then(|| self.registry.reserve());
        let (text, style) = match request {
            ShowRequest::Prompt(options) => (Some(options.text.as_str()), Some(options.style())),
            _ => (None, None),
        };
        let effect = Effect {
            operation,
            handle: id,
            attrs: &attrs,
            content: content.as_ref(),
            text,
            style: style.as_ref(),
            duration: request.duration(),
        };
        executor.invoke(&effect).map_err(|e| {
            tracing::warn!(operation = %name, error = %e, "executor failed");
            DispatchError::host(&name, e.message)
        })?;

        Ok(match id {
            Some(id) => {
                self.registry.activate(id, category, attrs);
                DispatchOutput::Handle(HandleInfo { id, category })
            }
            None => DispatchOutput::Done,
        })
    }

    fn change(
        &self,
        category: Category,
        handle: HandleId,
        change: HandleChange,
    ) -> Result<DispatchOutput, DispatchError> {
        let name = format!("{category}.{}", verb_name(category, change.verb()));
        checker::require(
            &name,
            Capability::for_category(category),
            self.session.read().effective(),
        )?;
        let operation = OperationId::new(category, change.verb()).ok_or_else(|| {
            DispatchError::invalid_arguments(&name, format!("{category} handles do not support this"))
        })?;
        let delta = change.delta();

        self.registry.with_active(handle, |h| {
            if h.category() != category {
                return Err(DispatchError::InvalidHandle { id: handle });
            }
            let next = h
                .attrs()
                .with_delta(category, &delta)
                .map_err(|e| DispatchError::invalid_arguments(&name, e))?;
            let executor = self.executor(category, &name)?;
            let effect = Effect {
                operation,
                handle: Some(handle),
                attrs: &next,
                content: None,
                text: None,
                style: None,
                duration: None,
            };
            executor.invoke(&effect).map_err(|e| {
                tracing::warn!(operation = %name, handle = %handle, error = %e, "executor failed");
                DispatchError::host(&name, e.message)
            })?;
            if matches!(change, HandleChange::Close) {
                h.close();
            } else {
                h.commit(next);
            }
            Ok(DispatchOutput::Done)
        })
    }

    /// Rejects a call the script side could not decode, after the same
    /// permission check a well-formed call would get.
    fn malformed(&self, category: Category, verb: Verb, reason: &str) -> Result<DispatchOutput, DispatchError> {
        let name = format!("{category}.{}", verb_name(category, verb));
        checker::require(
            &name,
            Capability::for_category(category),
            self.session.read().effective(),
        )?;
        Err(DispatchError::invalid_arguments(name, reason))
    }

    /// Host notification: playback of `id` reached its end.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidHandle`] if the handle is unknown or closed.
    pub fn playback_finished(&self, id: HandleId) -> Result<(), DispatchError> {
        self.registry.complete(id).map_err(DispatchError::from)
    }

    /// Closes every active handle through its executor. Returns how many
    /// handles were closed.
    ///
    /// Executor failures are logged; the handle is marked closed anyway.
    pub fn teardown(&self) -> usize {
        let mut closed = 0;
        for id in self.registry.active_ids() {
            let result: Result<(), DispatchError> = self.registry.with_active(id, |h| {
                if let Some(operation) = OperationId::new(h.category(), Verb::Close) {
                    let name = operation.to_string();
                    let effect = Effect {
                        operation,
                        handle: Some(id),
                        attrs: h.attrs(),
                        content: None,
                        text: None,
                        style: None,
                        duration: None,
                    };
                    match self.executor(h.category(), &name) {
                        Ok(executor) => {
                            if let Err(e) = executor.invoke(&effect) {
                                tracing::warn!(handle = %id, error = %e, "close failed during teardown");
                            }
                        }
                        Err(e) => tracing::warn!(handle = %id, error = %e, "close skipped during teardown"),
                    }
                }
                h.close();
                Ok(())
            });
            if result.is_ok() {
                closed += 1;
            }
        }
        tracing::info!(closed, "session teardown");
        closed
    }

    /// Replaces the user's grants; effective permissions are re-resolved.
    pub fn set_grants(&self, grants: Capability) {
        self.session.write().set_grants(grants);
    }

    /// Replaces the pack; permissions and mood are reset from it.
    pub fn switch_pack(&self, pack: Pack) {
        self.session.write().switch_pack(pack);
    }

    /// Read access to the session context.
    pub fn session(&self) -> RwLockReadGuard<'_, SessionContext> {
        self.session.read()
    }

    #[must_use]
    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// Number of calls received, successful or not.
    #[must_use]
    pub fn calls_dispatched(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn active_handles(&self) -> Vec<HandleId> {
        self.registry.active_ids()
    }
}
