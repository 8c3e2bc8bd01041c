// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lua engine host.
//
// Runs story scripts in an embedded Lua 5.4 VM. The host knows nothing about
// rooms, objects, or parsing; all of that lives in the bootstrap scripts and
// the game. The contract with the scripts is small:
//
//   iface:cmd(text)  -> response [, ok]   -- required
//   iface:load(path) -> ok                -- optional
//
// `response` may be nil (no output). `ok` may be nil or true (status 0),
// false (status 1), or a whole number passed through untouched. Any other
// `ok` is reported as an engine failure. Without
// `iface:load`, a save slot is executed as a Lua chunk in the game VM.

use std::path::{Path, PathBuf};

use mlua::{Function, Lua, Table, Value};
use tracing::{debug, error, info, instrument, warn};

use metaparser_core::error::Result;
use metaparser_core::{BridgeConfig, BridgeError, CommandOutput, EnginePaths, status};

use crate::loader::ResourceLoader;
use crate::traits::{Engine, Extension};

/// Interpreter state that exists only between `init` and `done`.
struct LuaSession {
    lua: Lua,
    game_dir: PathBuf,
}

/// [`Engine`] backed by an embedded Lua VM.
pub struct LuaEngine {
    config: BridgeConfig,
    extensions: Vec<Extension>,
    session: Option<LuaSession>,
}

impl LuaEngine {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        Self {
            config,
            extensions: Vec::new(),
            session: None,
        }
    }

    /// Number of extensions waiting for (or active in) the interpreter.
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    fn session(&self) -> Result<&LuaSession> {
        self.session.as_ref().ok_or(BridgeError::NotInitialized)
    }

    /// Publish every extension function as a Lua global.
    fn install_functions(&self, lua: &Lua) -> Result<()> {
        let globals = lua.globals();
        for function in self.extensions.iter().flat_map(Extension::functions) {
            let callback = function.callback();
            let name = function.name().to_string();
            let lua_fn = lua
                .create_function(move |_, ()| {
                    debug!(function = %name, "host function called from script");
                    callback();
                    Ok(())
                })
                .map_err(script_err)?;
            globals.set(function.name(), lua_fn).map_err(script_err)?;
        }
        Ok(())
    }

    /// Let `require` find modules next to the bootstrap resources and the game.
    fn set_search_path(lua: &Lua, roots: &[&Path]) -> Result<()> {
        let path = roots
            .iter()
            .flat_map(|root| {
                let root = root.display();
                [format!("{root}/?.lua"), format!("{root}/?/init.lua")]
            })
            .collect::<Vec<_>>()
            .join(";");
        let package: Table = lua.globals().get("package").map_err(script_err)?;
        package.set("path", path).map_err(script_err)?;
        Ok(())
    }

    fn run_bootstrap(&self, lua: &Lua, loader: &ResourceLoader) -> Result<()> {
        for extension in &self.extensions {
            for name in extension.bootstrap() {
                let resource = loader.load(name)?;
                lua.load(resource.source.as_str())
                    .set_name(resource.chunk_name())
                    .exec()
                    .map_err(|e| BridgeError::Bootstrap {
                        resource: name.clone(),
                        reason: e.to_string(),
                    })?;
                info!(
                    extension = extension.name(),
                    resource = %name,
                    path = %resource.path.display(),
                    "bootstrap script loaded"
                );
            }
        }
        Ok(())
    }

    fn run_main_script(&self, lua: &Lua, game_dir: &Path) -> Result<()> {
        let main = game_dir.join(&self.config.main_script);
        let source = std::fs::read_to_string(&main).map_err(|e| BridgeError::Engine {
            code: status::ENGINE_FAILURE,
            reason: format!("cannot read {}: {e}", main.display()),
        })?;
        lua.load(source.as_str())
            .set_name(format!("@{}", self.config.main_script))
            .exec()
            .map_err(script_err)
    }
}

impl Default for LuaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for LuaEngine {
    fn register_extension(&mut self, extension: Extension) -> Result<()> {
        if self.session.is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }
        for function in extension.functions() {
            let taken = self
                .extensions
                .iter()
                .flat_map(Extension::functions)
                .any(|f| f.name() == function.name());
            if taken {
                return Err(BridgeError::DuplicateFunction(function.name().to_string()));
            }
        }
        debug!(
            extension = extension.name(),
            functions = extension.functions().len(),
            bootstrap = extension.bootstrap().len(),
            "extension registered"
        );
        self.extensions.push(extension);
        Ok(())
    }

    #[instrument(skip_all, fields(game = paths.game_name()))]
    fn init(&mut self, paths: &EnginePaths) -> Result<()> {
        if self.session.is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }

        let lua = Lua::new();
        let resource_root = self.config.resource_root(&paths.work_dir).to_path_buf();
        self.install_functions(&lua)?;
        Self::set_search_path(&lua, &[resource_root.as_path(), paths.game_dir.as_path()])?;
        self.run_bootstrap(&lua, &ResourceLoader::new(&resource_root))?;
        self.run_main_script(&lua, &paths.game_dir)?;

        self.session = Some(LuaSession {
            lua,
            game_dir: paths.game_dir.clone(),
        });
        info!("lua engine started");
        Ok(())
    }

    fn command(&mut self, text: &str) -> Result<CommandOutput> {
        let session = self.session()?;
        let iface = iface(&session.lua)?;
        let cmd: Function = iface
            .get::<Option<Function>>("cmd")
            .map_err(script_err)?
            .ok_or_else(|| BridgeError::Script("`iface.cmd` is not defined".into()))?;

        let (response, flag): (Value, Value) = cmd.call((iface, text)).map_err(|e| {
            error!(command = text, error = %e, "command raised a script error");
            script_err(e)
        })?;

        let output = CommandOutput {
            text: response_text(response)?,
            status: flag_status(&flag),
        };
        debug!(command = text, status = output.status, bytes = output.text.len(), "command done");
        Ok(output)
    }

    fn load(&mut self, slot: Option<&Path>) -> Result<i32> {
        let session = self.session()?;
        let path = match slot {
            Some(path) => path.to_path_buf(),
            None => self.config.default_slot_path(&session.game_dir),
        };
        if !path.is_file() {
            warn!(slot = %path.display(), "save slot missing");
            return Err(BridgeError::SaveNotFound(path));
        }

        let hook = iface(&session.lua)
            .ok()
            .and_then(|t| t.get::<Option<Function>>("load").ok().flatten().map(|f| (t, f)));
        let code = match hook {
            Some((iface, load)) => {
                let flag: Value = load
                    .call((iface, path.display().to_string()))
                    .map_err(script_err)?;
                flag_status(&flag)
            }
            None => {
                let source = std::fs::read_to_string(&path)?;
                session
                    .lua
                    .load(source.as_str())
                    .set_name(format!("@{}", path.display()))
                    .exec()
                    .map_err(script_err)?;
                status::OK
            }
        };
        info!(slot = %path.display(), status = code, "save slot restored");
        Ok(code)
    }

    fn done(&mut self) {
        if self.session.take().is_some() {
            info!("lua engine stopped");
        }
        self.extensions.clear();
    }

    fn is_running(&self) -> bool {
        self.session.is_some()
    }
}

fn script_err(e: mlua::Error) -> BridgeError {
    BridgeError::Script(e.to_string())
}

fn iface(lua: &Lua) -> Result<Table> {
    match lua.globals().get::<Value>("iface").map_err(script_err)? {
        Value::Table(table) => Ok(table),
        _ => Err(BridgeError::Script("scripts define no `iface` table".into())),
    }
}

fn response_text(value: Value) -> Result<String> {
    match value {
        Value::Nil => Ok(String::new()),
        Value::String(s) => Ok(s.to_string_lossy().to_string()),
        Value::Integer(n) => Ok(n.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(BridgeError::Script(format!(
            "`iface:cmd` returned a {} instead of text",
            other.type_name()
        ))),
    }
}

fn flag_status(flag: &Value) -> i32 {
    let code = match flag {
        Value::Nil | Value::Boolean(true) => return status::OK,
        Value::Boolean(false) => return status::COMMAND_FAILED,
        Value::Integer(code) => i32::try_from(*code).ok(),
        Value::Number(n) if n.fract() == 0.0 && *n >= f64::from(i32::MIN) && *n <= f64::from(i32::MAX) => {
            Some(*n as i32)
        }
        _ => None,
    };
    code.unwrap_or_else(|| {
        warn!(kind = flag.type_name(), "script reported a status that is not a whole number");
        status::ENGINE_FAILURE
    })
}
