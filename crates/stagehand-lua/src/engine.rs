//! Script engines.
//!
//! [`LuaEngine`] compiles in a throwaway VM (syntax check only) and runs
//! every script in a fresh VM with a whitelist-only environment:
//!
//! | Exposed | Not exposed |
//! |---------|-------------|
//! | `print` (captured), `pairs`, `ipairs`, `pcall`, `error`, ... | `os`, `io`, `debug`, `package` |
//! | `math`, `string`, `table` | `load`, `loadfile`, `dofile`, `require` |
//! | `stage` (host bindings) | `collectgarbage` |
//!
//! An instruction-count hook aborts scripts that run past the configured
//! limit. Output from `print()` goes to a bounded buffer, never to stdout.

use crate::bindings;
use crate::bridge::HostBridge;
use crate::error::{CompileError, LuaError, ScriptFailure};
use mlua::{HookTriggers, Lua, Table, Value};
use parking_lot::Mutex;
use stagehand_runtime::DispatchError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Chunk name shown in Lua error messages.
const CHUNK_NAME: &str = "=script";

/// Instructions between two hook invocations.
const HOOK_STEP: u32 = 1_000;

/// Globals copied into the sandbox environment.
const SAFE_GLOBALS: &[&str] = &[
    "tostring",
    "tonumber",
    "type",
    "pairs",
    "ipairs",
    "next",
    "select",
    "error",
    "pcall",
    "xpcall",
    "assert",
    "rawget",
    "rawset",
    "rawlen",
    "rawequal",
    "setmetatable",
    "getmetatable",
];

const SAFE_LIBS: &[&str] = &["math", "string", "table"];

/// Resource limits applied to each execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxLimits {
    pub instruction_limit: u32,
    pub max_output_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            instruction_limit: 1_000_000,
            max_output_bytes: 32_768,
        }
    }
}

/// What a successful script left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Captured `print` lines.
    pub lines: Vec<String>,
    /// Whether output past the byte cap was dropped.
    pub truncated: bool,
}

/// Compiles and runs scripts.
///
/// `execute` blocks for the whole run and talks to the host only through
/// the bridge; the turn loop calls it on a dedicated thread.
pub trait ScriptEngine: Send + Sync + 'static {
    type Unit: Send + 'static;

    /// # Errors
    ///
    /// [`CompileError`] when the source is not a valid script.
    fn compile(&self, source: &str) -> Result<Self::Unit, CompileError>;

    /// # Errors
    ///
    /// [`ScriptFailure`] when the script raised, ran out of instructions or
    /// let a host error escape.
    fn execute(&self, unit: Self::Unit, bridge: HostBridge) -> Result<ScriptOutput, ScriptFailure>;
}

/// A script that passed compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledScript {
    source: String,
}

impl CompiledScript {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Lua 5.4 engine.
#[derive(Debug, Clone, Default)]
pub struct LuaEngine {
    limits: SandboxLimits,
}

impl LuaEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(limits: SandboxLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub fn limits(&self) -> SandboxLimits {
        self.limits
    }

    fn run(&self, unit: &CompiledScript, bridge: &HostBridge) -> Result<ScriptOutput, ScriptFailure> {
        let lua = Lua::new();
        let output = Arc::new(Mutex::new(OutputBuffer::new(self.limits.max_output_bytes)));
        let env = sandbox_env(&lua, Arc::clone(&output)).map_err(LuaError::from)?;
        bindings::register(&lua, &env, bridge).map_err(LuaError::from)?;

        let chunk = lua
            .load(unit.source.as_str())
            .set_name(CHUNK_NAME)
            .set_environment(env);

        let limit = self.limits.instruction_limit;
        let step = HOOK_STEP.min(limit.max(1));
        let executed = Arc::new(AtomicU64::new(0));
        let limit_hit = Arc::new(AtomicBool::new(false));
        {
            let limit_hit = Arc::clone(&limit_hit);
            lua.set_hook(
                HookTriggers::new().every_nth_instruction(step),
                move |_lua, _debug| {
                    let total = executed.fetch_add(u64::from(step), Ordering::Relaxed) + u64::from(step);
                    if total >= u64::from(limit) {
                        limit_hit.store(true, Ordering::Relaxed);
                        return Err(mlua::Error::RuntimeError(format!(
                            "instruction limit exceeded ({limit})"
                        )));
                    }
                    Ok(mlua::VmState::Continue)
                },
            );
        }

        let result = chunk.exec();
        lua.remove_hook();

        let output = output.lock().take();
        match result {
            Ok(()) => Ok(output),
            Err(e) => {
                if let Some(host) = find_dispatch_error(&e) {
                    Err(ScriptFailure::Host(host.clone()))
                } else if limit_hit.load(Ordering::Relaxed) {
                    Err(ScriptFailure::InstructionLimit { limit })
                } else {
                    Err(ScriptFailure::exception(format_lua_error(&e)))
                }
            }
        }
    }
}

impl ScriptEngine for LuaEngine {
    type Unit = CompiledScript;

    fn compile(&self, source: &str) -> Result<CompiledScript, CompileError> {
        if source.trim().is_empty() {
            return Err(CompileError::new("script is empty"));
        }
        let lua = Lua::new();
        lua.load(source)
            .set_name(CHUNK_NAME)
            .into_function()
            .map_err(|e| CompileError::from(&e))?;
        Ok(CompiledScript {
            source: source.to_string(),
        })
    }

    fn execute(&self, unit: CompiledScript, bridge: HostBridge) -> Result<ScriptOutput, ScriptFailure> {
        self.run(&unit, &bridge)
    }
}

/// Finds a host error wrapped anywhere in `err`.
fn find_dispatch_error(err: &mlua::Error) -> Option<&DispatchError> {
    match err {
        mlua::Error::CallbackError { cause, .. } => find_dispatch_error(cause),
        mlua::Error::WithContext { cause, .. } => find_dispatch_error(cause),
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<DispatchError>(),
        _ => None,
    }
}

fn format_lua_error(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(msg) => msg.clone(),
        mlua::Error::CallbackError { cause, .. } => format_lua_error(cause),
        mlua::Error::WithContext { cause, .. } => format_lua_error(cause),
        _ => err.to_string(),
    }
}

#[derive(Debug)]
struct OutputBuffer {
    lines: Vec<String>,
    bytes: usize,
    cap: usize,
    truncated: bool,
}

impl OutputBuffer {
    fn new(cap: usize) -> Self {
        Self {
            lines: Vec::new(),
            bytes: 0,
            cap,
            truncated: false,
        }
    }

    fn push(&mut self, line: String) {
        let len = line.len() + 1;
        if self.bytes + len > self.cap {
            self.truncated = true;
            return;
        }
        self.bytes += len;
        self.lines.push(line);
    }

    fn take(&mut self) -> ScriptOutput {
        ScriptOutput {
            lines: std::mem::take(&mut self.lines),
            truncated: self.truncated,
        }
    }
}

/// Builds the whitelist-only environment table.
fn sandbox_env(lua: &Lua, output: Arc<Mutex<OutputBuffer>>) -> mlua::Result<Table> {
    let env = lua.create_table()?;

    let print_fn = lua.create_function(move |_, args: mlua::MultiValue| {
        let line = args.iter().map(lua_display).collect::<Vec<_>>().join("\t");
        output.lock().push(line);
        Ok(())
    })?;
    env.set("print", print_fn)?;

    let globals = lua.globals();
    for name in SAFE_GLOBALS.iter().chain(SAFE_LIBS) {
        let value: Value = globals.get(*name)?;
        if !value.is_nil() {
            env.set(*name, value)?;
        }
    }
    Ok(env)
}

fn lua_display(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => format!("{n}"),
        Value::String(s) => s.to_string_lossy().to_string(),
        Value::UserData(ud) => ud
            .borrow::<bindings::ScriptHandle>()
            .map_or_else(|_| "userdata".to_string(), |h| format!("{h}")),
        other => other.type_name().to_string(),
    }
}
