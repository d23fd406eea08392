//! Lua scripting for stagehand.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  next_script   ┌──────────────────────────────────┐
//! │ ScriptSource │ ─────────────► │ TurnLoop                         │
//! │(model, queue)│ ◄───────────── │  compile ─► spawn script thread  │
//! └──────────────┘ record_failure │  serve HostRequests ─► Dispatcher│
//!                                 └───────────────┬──────────────────┘
//!                                                 │ HostBridge
//!                                 ┌───────────────▼──────────────────┐
//!                                 │ script thread: LuaEngine         │
//!                                 │  sandbox env + `stage` bindings  │
//!                                 └──────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`engine`] | `ScriptEngine`, `LuaEngine`, sandbox limits |
//! | [`bindings`] | the `stage` table and handle userdata |
//! | [`bridge`] | blocking request/response channel to the host |
//! | [`turn`] | `TurnLoop`, `TurnReport`, `TurnError` |
//! | [`source`] | `ScriptSource`, `QueuedScripts` |
//! | [`extract`] | script extraction from model responses |
//! | [`feedback`] | bounded failure history |

pub mod bindings;
pub mod bridge;
pub mod engine;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod source;
pub mod turn;

pub use bridge::{HostBridge, HostRequest};
pub use engine::{CompiledScript, LuaEngine, SandboxLimits, ScriptEngine, ScriptOutput};
pub use error::{CompileError, LuaError, ScriptFailure};
pub use extract::extract_script;
pub use feedback::FeedbackLog;
pub use source::{QueuedScripts, ScriptSource, SourceError};
pub use turn::{AttemptFailure, AttemptStage, TurnError, TurnLoop, TurnReport};
