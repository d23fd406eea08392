//! The `stage` table scripts call into.
//!
//! ```lua
//! local img = stage.image.show{ tags = {"beach"}, opacity = 0.8 }
//! img:move(100, 40)
//! img:set_opacity(0.5)
//!
//! local music = stage.audio.play{ loop = true }
//! stage.audio.set_volume(music, 0.3)      -- functional form
//!
//! local ok, err = pcall(stage.video.play) -- denied calls raise
//!
//! stage.prompt.show("breathe in")
//! stage.mood.set("focus")
//! ```
//!
//! | Function | Returns |
//! |----------|---------|
//! | `stage.<cat>.<show verb>(opts)` | handle userdata, or `nil` for wallpaper/website |
//! | `stage.<cat>.<verb>(handle_or_id, ...)` | nothing |
//! | `stage.mood.get()` | `{ name, description, tags }` |
//! | `stage.mood.set(name)` | nothing |
//! | `stage.mood.list()` | array of names |
//!
//! A failed call raises a Lua error wrapping the [`DispatchError`]; `pcall`
//! catches it like any other error. Arguments that do not decode are still
//! sent to the host, which checks the capability before rejecting them.

use crate::bridge::HostBridge;
use mlua::{
    FromLuaMulti, Function, Lua, LuaSerdeExt, MetaMethod, MultiValue, Table, UserData,
    UserDataFields, UserDataMethods, Value,
};
use serde::de::DeserializeOwned;
use stagehand_runtime::handle::{Position, Size};
use stagehand_runtime::operation::{verb_name, verbs, HandleChange, OperationCall, Verb};
use stagehand_runtime::options::{PromptOptions, ShowRequest};
use stagehand_runtime::{DispatchError, DispatchOutput};
use stagehand_types::{Category, HandleId};

/// A host object as the script sees it.
#[derive(Debug, Clone)]
pub struct ScriptHandle {
    id: HandleId,
    category: Category,
    bridge: HostBridge,
}

impl ScriptHandle {
    fn change<A, F>(&self, lua: &Lua, verb: Verb, args: MultiValue, change: F) -> mlua::Result<()>
    where
        A: FromLuaMulti,
        F: Fn(A) -> HandleChange,
    {
        call_handle(lua, &self.bridge, self.category, verb, Ok(self.id), args, change)
    }
}

impl std::fmt::Display for ScriptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.category, self.id)
    }
}

impl UserData for ScriptHandle {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("id", |_, this| Ok(this.id.as_u64()));
        fields.add_field_method_get("kind", |_, this| Ok(this.category.as_str()));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("close", |lua, this, args: MultiValue| {
            this.change(lua, Verb::Close, args, |()| HandleChange::Close)
        });
        methods.add_method("stop", |lua, this, args: MultiValue| {
            this.change(lua, Verb::Close, args, |()| HandleChange::Close)
        });
        methods.add_method("set_opacity", |lua, this, args: MultiValue| {
            this.change(lua, Verb::SetOpacity, args, HandleChange::Opacity)
        });
        methods.add_method("move", |lua, this, args: MultiValue| {
            this.change(lua, Verb::Move, args, |(x, y): (i32, i32)| {
                HandleChange::Move(Position { x, y })
            })
        });
        methods.add_method("resize", |lua, this, args: MultiValue| {
            this.change(lua, Verb::Resize, args, |(width, height): (u32, u32)| {
                HandleChange::Resize(Size { width, height })
            })
        });
        methods.add_method("set_volume", |lua, this, args: MultiValue| {
            this.change(lua, Verb::SetVolume, args, HandleChange::Volume)
        });
        methods.add_method("set_loop", |lua, this, args: MultiValue| {
            this.change(lua, Verb::SetLoop, args, HandleChange::Loop)
        });
        methods.add_method("pause", |lua, this, args: MultiValue| {
            this.change(lua, Verb::Pause, args, |()| HandleChange::Pause)
        });
        methods.add_method("resume", |lua, this, args: MultiValue| {
            this.change(lua, Verb::Resume, args, |()| HandleChange::Resume)
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.to_string()));
    }
}

fn raise(err: DispatchError) -> mlua::Error {
    mlua::Error::external(err)
}

fn send(bridge: &HostBridge, call: OperationCall) -> mlua::Result<DispatchOutput> {
    bridge.call(call).map_err(raise)
}

/// Decodes a follow-up call and sends it.
///
/// Arguments that do not decode are sent as [`OperationCall::Malformed`],
/// so an ungranted category still reports `PERMISSION_DENIED`.
fn call_handle<A, F>(
    lua: &Lua,
    bridge: &HostBridge,
    category: Category,
    verb: Verb,
    handle: Result<HandleId, String>,
    args: MultiValue,
    change: F,
) -> mlua::Result<()>
where
    A: FromLuaMulti,
    F: Fn(A) -> HandleChange,
{
    let decoded = handle.and_then(|handle| {
        A::from_lua_multi(args, lua)
            .map(|a| (handle, change(a)))
            .map_err(|e| e.to_string())
    });
    let call = match decoded {
        Ok((handle, change)) => OperationCall::Handle {
            category,
            handle,
            change,
        },
        Err(reason) => OperationCall::Malformed {
            category,
            verb,
            reason,
        },
    };
    send(bridge, call).map(|_| ())
}

/// Installs `stage` into `env`.
///
/// # Errors
///
/// Lua allocation failures.
pub fn register(lua: &Lua, env: &Table, bridge: &HostBridge) -> mlua::Result<()> {
    let stage = lua.create_table()?;
    for category in Category::ALL {
        stage.set(category.as_str(), category_table(lua, bridge, category)?)?;
    }
    stage.set("mood", mood_table(lua, bridge)?)?;
    env.set("stage", stage)?;
    Ok(())
}

fn category_table(lua: &Lua, bridge: &HostBridge, category: Category) -> mlua::Result<Table> {
    let table = lua.create_table()?;
    for verb in verbs(category) {
        let name = verb_name(category, *verb);
        let function = match verb {
            Verb::Show => show_fn(lua, bridge, category)?,
            Verb::Close => handle_fn(lua, bridge, category, *verb, |()| HandleChange::Close)?,
            Verb::SetOpacity => handle_fn(lua, bridge, category, *verb, HandleChange::Opacity)?,
            Verb::Move => handle_fn(lua, bridge, category, *verb, |(x, y): (i32, i32)| {
                HandleChange::Move(Position { x, y })
            })?,
            Verb::Resize => {
                handle_fn(lua, bridge, category, *verb, |(width, height): (u32, u32)| {
                    HandleChange::Resize(Size { width, height })
                })?
            }
            Verb::SetVolume => handle_fn(lua, bridge, category, *verb, HandleChange::Volume)?,
            Verb::SetLoop => handle_fn(lua, bridge, category, *verb, HandleChange::Loop)?,
            Verb::Pause => handle_fn(lua, bridge, category, *verb, |()| HandleChange::Pause)?,
            Verb::Resume => handle_fn(lua, bridge, category, *verb, |()| HandleChange::Resume)?,
        };
        table.set(name, function)?;
    }
    Ok(table)
}

fn show_fn(lua: &Lua, bridge: &HostBridge, category: Category) -> mlua::Result<Function> {
    let bridge = bridge.clone();
    lua.create_function(move |lua, arg: Value| {
        let call = match parse_request(lua, category, arg) {
            Ok(request) => OperationCall::Show(request),
            Err(e) => OperationCall::Malformed {
                category,
                verb: Verb::Show,
                reason: e.to_string(),
            },
        };
        match send(&bridge, call)? {
            DispatchOutput::Handle(info) => {
                let handle = ScriptHandle {
                    id: info.id,
                    category: info.category,
                    bridge: bridge.clone(),
                };
                Ok(Value::UserData(lua.create_userdata(handle)?))
            }
            _ => Ok(Value::Nil),
        }
    })
}

fn options<T: DeserializeOwned + Default>(lua: &Lua, arg: Value) -> mlua::Result<T> {
    match arg {
        Value::Nil => Ok(T::default()),
        value => lua.from_value(value),
    }
}

fn parse_request(lua: &Lua, category: Category, arg: Value) -> mlua::Result<ShowRequest> {
    Ok(match category {
        Category::Image => ShowRequest::Image(options(lua, arg)?),
        Category::Overlay => ShowRequest::Overlay(options(lua, arg)?),
        Category::Video => ShowRequest::Video(options(lua, arg)?),
        Category::Audio => ShowRequest::Audio(options(lua, arg)?),
        Category::Prompt => match arg {
            Value::String(text) => ShowRequest::Prompt(PromptOptions::text(text.to_str()?.to_string())),
            other => ShowRequest::Prompt(options(lua, other)?),
        },
        Category::Wallpaper => ShowRequest::Wallpaper(options(lua, arg)?),
        Category::Website => ShowRequest::Website(options(lua, arg)?),
    })
}

/// Resolves the first argument of a functional call.
fn target(value: &Value) -> Result<HandleId, String> {
    match value {
        Value::UserData(ud) => ud
            .borrow::<ScriptHandle>()
            .map(|h| h.id)
            .map_err(|_| "expected a handle or handle id, got userdata".to_string()),
        Value::Integer(i) if *i > 0 => Ok(HandleId::from_raw(*i as u64)),
        Value::Number(n) if n.fract() == 0.0 && *n > 0.0 => Ok(HandleId::from_raw(*n as u64)),
        other => Err(format!(
            "expected a handle or handle id, got {}",
            other.type_name()
        )),
    }
}

fn handle_fn<A, F>(
    lua: &Lua,
    bridge: &HostBridge,
    category: Category,
    verb: Verb,
    change: F,
) -> mlua::Result<Function>
where
    A: FromLuaMulti + 'static,
    F: Fn(A) -> HandleChange + 'static,
{
    let bridge = bridge.clone();
    lua.create_function(move |lua, args: MultiValue| {
        let mut args = args.into_iter();
        let first = args.next().unwrap_or(Value::Nil);
        let rest: MultiValue = args.collect();
        call_handle(lua, &bridge, category, verb, target(&first), rest, &change)
    })
}

fn mood_table(lua: &Lua, bridge: &HostBridge) -> mlua::Result<Table> {
    let table = lua.create_table()?;

    let b = bridge.clone();
    table.set(
        "get",
        lua.create_function(move |lua, ()| match send(&b, OperationCall::GetMood)? {
            DispatchOutput::Mood(view) => lua.to_value(&view),
            other => Err(unexpected(&other)),
        })?,
    )?;

    let b = bridge.clone();
    table.set(
        "set",
        lua.create_function(move |_, name: String| {
            send(&b, OperationCall::SetMood(name)).map(|_| ())
        })?,
    )?;

    let b = bridge.clone();
    table.set(
        "list",
        lua.create_function(move |lua, ()| match send(&b, OperationCall::ListMoods)? {
            DispatchOutput::Moods(names) => lua.to_value(&names),
            other => Err(unexpected(&other)),
        })?,
    )?;

    Ok(table)
}

fn unexpected(output: &DispatchOutput) -> mlua::Error {
    mlua::Error::RuntimeError(format!("unexpected host reply: {output:?}"))
}
