//! Stagehand runtime: everything between a script call and the host.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  stagehand-types : HandleId, Category, ErrorCode            │
//! │  stagehand-auth  : Capability, resolver, checker            │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Runtime Layer (THIS CRATE)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  catalog/    : ContentItem, Catalog, Mood, Pack, manifests  │
//! │  selector    : four-tier AssetSelector                      │
//! │  handle/     : HandleRegistry, HandleAttrs, AttrDelta       │
//! │  operation   : Verb, OperationId, OperationCall              │
//! │  options     : typed per-operation options                  │
//! │  executor    : Executor trait, ExecutorSet                  │
//! │  session     : SessionContext                               │
//! │  dispatcher  : Dispatcher                                   │
//! │  config/     : layered TOML configuration                   │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  stagehand-lua : sandboxed scripts, bindings, TurnLoop      │
//! │  stagehand-cli : the `stagehand` binary                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use stagehand_auth::Capability;
//! use stagehand_runtime::catalog::{ContentItem, ContentRef, Mood, Pack};
//! use stagehand_runtime::executor::{ExecutorSet, LoggingExecutor};
//! use stagehand_runtime::operation::OperationCall;
//! use stagehand_runtime::options::{ImageOptions, ShowRequest};
//! use stagehand_runtime::{DispatchOutput, Dispatcher, SessionContext};
//! use stagehand_types::Category;
//! use std::sync::Arc;
//!
//! let catalog = vec![ContentItem::new(
//!     Category::Image,
//!     ["beach"],
//!     ContentRef::Path("beach.png".into()),
//! )]
//! .into_iter()
//! .collect();
//! let pack = Pack::new("demo", Capability::IMAGE, catalog, vec![Mood::new("calm", ["beach"])])?;
//! let session = SessionContext::new(pack, Capability::IMAGE | Capability::AUDIO);
//! let dispatcher = Dispatcher::new(session, ExecutorSet::uniform(Arc::new(LoggingExecutor)));
//!
//! let call = OperationCall::Show(ShowRequest::Image(ImageOptions::default()));
//! assert!(matches!(dispatcher.dispatch(&call)?, DispatchOutput::Handle(_)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod handle;
pub mod operation;
pub mod options;
pub mod selector;
pub mod session;

pub use dispatcher::{DispatchOutput, Dispatcher, HandleInfo, MoodView};
pub use error::DispatchError;
pub use session::SessionContext;
