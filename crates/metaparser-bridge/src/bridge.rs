// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The engine bridge.
//
// `Bridge` owns one engine instance and the restart signal, and enforces the
// lifecycle Uninitialized -> Registered -> Running -> Uninitialized. Calls
// made in the wrong state get an explicit status instead of reaching the
// engine. A `Bridge` is not re-entrant; callers on several threads must wrap
// it in a lock (the JNI layer does).

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use metaparser_core::error::Result;
use metaparser_core::{BridgeConfig, BridgeError, BridgeState, CommandOutput, EnginePaths, status};
use metaparser_engine::{Engine, Extension, HostFunction, LuaEngine};

use crate::restart::RestartSignal;

/// Name the bridge registers its extension under.
pub const EXTENSION_NAME: &str = "metaparser";

/// Owner of one engine instance and its restart signal.
pub struct Bridge<E: Engine> {
    engine: E,
    config: BridgeConfig,
    state: BridgeState,
    restart: RestartSignal,
    last_status: i32,
}

/// Bridge over the embedded Lua engine, configured from `config`.
pub fn lua_bridge(config: BridgeConfig) -> Bridge<LuaEngine> {
    Bridge::new(LuaEngine::with_config(config.clone()), config)
}

impl<E: Engine> Bridge<E> {
    pub fn new(engine: E, config: BridgeConfig) -> Self {
        Self {
            engine,
            config,
            state: BridgeState::Uninitialized,
            restart: RestartSignal::new(),
            last_status: status::OK,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Status of the most recent `send_command`.
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Handle to the restart signal. The registered restart function raises
    /// a clone of it.
    pub fn restart_signal(&self) -> RestartSignal {
        self.restart.clone()
    }

    /// Register the restart host function and the bootstrap scripts.
    ///
    /// The bootstrap scripts run, in configured order, when the interpreter
    /// starts in [`Bridge::initialize`]. A restart left unconsumed by the
    /// previous engine instance is discarded here.
    pub fn register_extension(&mut self) -> Result<()> {
        match self.state {
            BridgeState::Running => return Err(BridgeError::AlreadyInitialized),
            BridgeState::Registered => return Err(BridgeError::AlreadyRegistered),
            BridgeState::Uninitialized => {}
        }
        if self.restart.take() {
            debug!("stale restart request from the previous session dropped");
        }

        let signal = self.restart_signal();
        let restart_fn = HostFunction::new(self.config.restart_function.clone(), move || {
            signal.raise();
        });
        let extension = Extension::new(EXTENSION_NAME)
            .with_function(restart_fn)
            .with_bootstraps(self.config.bootstrap_scripts.iter().cloned());

        self.engine.register_extension(extension)?;
        self.state = BridgeState::Registered;
        info!(
            function = %self.config.restart_function,
            bootstrap = ?self.config.bootstrap_scripts,
            "extension registered"
        );
        Ok(())
    }

    /// Point the process at `current_dir` and start the engine on `game_dir`.
    ///
    /// A relative `game_dir` is taken relative to `current_dir`. Both must be
    /// readable directories. On any failure the engine is discarded and the
    /// bridge returns to Uninitialized; recovery starts again at
    /// [`Bridge::register_extension`].
    pub fn initialize(&mut self, current_dir: impl AsRef<Path>, game_dir: impl AsRef<Path>) -> Result<()> {
        match self.state {
            BridgeState::Running => return Err(BridgeError::AlreadyInitialized),
            BridgeState::Uninitialized => return Err(BridgeError::NotRegistered),
            BridgeState::Registered => {}
        }

        let work_dir = readable_dir("current_directory", current_dir.as_ref(), None)?;
        let game_dir = readable_dir("game_directory", game_dir.as_ref(), Some(work_dir.as_path()))?;
        let paths = EnginePaths::new(work_dir, game_dir);

        let started = std::env::set_current_dir(&paths.work_dir)
            .map_err(BridgeError::from)
            .and_then(|()| self.engine.init(&paths));

        match started {
            Ok(()) => {
                self.state = BridgeState::Running;
                self.last_status = status::OK;
                info!(
                    work_dir = %paths.work_dir.display(),
                    game = paths.game_name(),
                    "engine running"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, status = e.status(), "engine initialisation failed");
                self.engine.done();
                self.state = BridgeState::Uninitialized;
                Err(e)
            }
        }
    }

    /// Forward one command. The response text is always present.
    pub fn send_command(&mut self, command: &str) -> CommandOutput {
        let output = if self.state != BridgeState::Running {
            warn!(state = %self.state, "command sent while engine not running");
            CommandOutput::empty(status::NOT_INITIALIZED)
        } else {
            match self.engine.command(command) {
                Ok(output) => output,
                Err(e) => {
                    error!(command, error = %e, "command failed");
                    CommandOutput::empty(e.status())
                }
            }
        };
        debug!(command, status = output.status, "command forwarded");
        self.last_status = output.status;
        output
    }

    /// Record a command that never reached the engine, e.g. because the
    /// caller's text could not be read. `last_status` reports `status`.
    pub fn reject_command(&mut self, status: i32) -> CommandOutput {
        warn!(status, "command rejected before reaching the engine");
        self.last_status = status;
        CommandOutput::empty(status)
    }

    /// Restore the default save slot. Returns the status the scripts report.
    pub fn load_state(&mut self) -> Result<i32> {
        if self.state != BridgeState::Running {
            warn!(state = %self.state, "load requested while engine not running");
            return Err(BridgeError::NotInitialized);
        }
        self.engine.load(None)
    }

    /// Release the engine and forget the registration.
    pub fn teardown(&mut self) {
        match self.state {
            BridgeState::Running => info!("engine torn down"),
            BridgeState::Registered => debug!("registration dropped without initialise"),
            BridgeState::Uninitialized => {
                warn!("teardown called with no engine running");
                return;
            }
        }
        self.engine.done();
        self.state = BridgeState::Uninitialized;
    }

    /// True exactly once per restart requested by the scripts.
    pub fn consume_restart_flag(&mut self) -> bool {
        let raised = self.restart.take();
        if raised {
            info!("restart requested by scripts");
        }
        raised
    }
}

/// Lock a shared bridge, replacing it with `fresh()` if a panic poisoned
/// the lock. The engine a panic unwound through is in an unknown state, so
/// the whole lifecycle restarts from registration.
pub fn lock_or_reset<E: Engine>(
    shared: &Mutex<Bridge<E>>,
    fresh: impl FnOnce() -> Bridge<E>,
) -> MutexGuard<'_, Bridge<E>> {
    shared.lock().unwrap_or_else(|poisoned| {
        warn!("bridge lock poisoned by an earlier panic, starting over with a fresh bridge");
        let mut bridge = poisoned.into_inner();
        *bridge = fresh();
        shared.clear_poison();
        bridge
    })
}

/// Check that `path` names a readable directory and make it absolute.
fn readable_dir(name: &'static str, path: &Path, base: Option<&Path>) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(BridgeError::invalid(name, "empty path"));
    }
    let full = match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => std::path::absolute(path).map_err(|e| BridgeError::invalid(name, e.to_string()))?,
    };
    if !full.is_dir() {
        return Err(BridgeError::invalid(name, format!("{} is not a directory", full.display())));
    }
    std::fs::read_dir(&full)
        .map_err(|e| BridgeError::invalid(name, format!("{}: {e}", full.display())))?;
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaparser_engine::testing::ScriptedEngine;

    struct Dirs {
        work: tempfile::TempDir,
        game: tempfile::TempDir,
    }

    fn dirs() -> Dirs {
        Dirs {
            work: tempfile::tempdir().unwrap(),
            game: tempfile::tempdir().unwrap(),
        }
    }

    fn scripted() -> ScriptedEngine {
        ScriptedEngine::new()
            .respond("look", "A dusty attic.")
            .respond("restart", "Starting over.")
            .trigger("restart", "instead_restart")
            .fail_command("crash")
    }

    fn running(engine: ScriptedEngine, dirs: &Dirs) -> Bridge<ScriptedEngine> {
        let mut bridge = Bridge::new(engine, BridgeConfig::default());
        bridge.register_extension().unwrap();
        bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap();
        bridge
    }

    #[test]
    fn no_spurious_restart_after_start() {
        let dirs = dirs();
        let mut bridge = running(scripted(), &dirs);
        assert_eq!(bridge.state(), BridgeState::Running);
        assert!(!bridge.consume_restart_flag());
    }

    #[test]
    fn restart_is_edge_triggered() {
        let dirs = dirs();
        let mut bridge = running(scripted(), &dirs);
        assert_eq!(bridge.send_command("restart").text, "Starting over.");
        assert!(bridge.consume_restart_flag());
        assert!(!bridge.consume_restart_flag());
    }

    #[test]
    fn bootstrap_resources_load_in_order() {
        let dirs = dirs();
        let bridge = running(scripted(), &dirs);
        assert_eq!(
            bridge.engine().loaded_resources(),
            ["stead/tiny3.lua", "stead/metaparser.lua"]
        );
    }

    #[test]
    fn failing_command_still_has_text() {
        let dirs = dirs();
        let mut bridge = running(scripted(), &dirs);
        let out = bridge.send_command("crash");
        assert_eq!(out.text, "");
        assert_eq!(out.status, status::ENGINE_FAILURE);
        assert_eq!(bridge.last_status(), status::ENGINE_FAILURE);
    }

    #[test]
    fn engine_status_is_not_rewritten() {
        let dirs = dirs();
        let engine = scripted().respond_with(
            "jump",
            CommandOutput {
                text: "Ouch.".into(),
                status: 5,
            },
        );
        let mut bridge = running(engine, &dirs);
        let out = bridge.send_command("jump");
        assert_eq!((out.text.as_str(), out.status), ("Ouch.", 5));
    }

    #[test]
    fn empty_paths_are_rejected() {
        let dirs = dirs();
        let mut bridge = Bridge::new(scripted(), BridgeConfig::default());
        bridge.register_extension().unwrap();
        let err = bridge.initialize("", dirs.game.path()).unwrap_err();
        assert_eq!(err.status(), status::INVALID_ARGUMENT);
        let err = bridge.initialize(dirs.work.path(), "").unwrap_err();
        assert_eq!(err.status(), status::INVALID_ARGUMENT);
        // Validation failures do not consume the registration.
        assert_eq!(bridge.state(), BridgeState::Registered);
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dirs = dirs();
        let mut bridge = Bridge::new(scripted(), BridgeConfig::default());
        bridge.register_extension().unwrap();
        let missing = dirs.work.path().join("nope");
        let err = bridge.initialize(dirs.work.path(), &missing).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument { name: "game_directory", .. }));
    }

    #[test]
    fn relative_game_dir_resolves_against_work_dir() {
        let dirs = dirs();
        std::fs::create_dir(dirs.work.path().join("games")).unwrap();
        let mut bridge = Bridge::new(scripted(), BridgeConfig::default());
        bridge.register_extension().unwrap();
        bridge.initialize(dirs.work.path(), "games").unwrap();
        let paths = bridge.engine().paths().unwrap();
        assert_eq!(paths.game_dir, dirs.work.path().join("games"));
    }

    #[test]
    fn out_of_order_calls_get_status_codes() {
        let dirs = dirs();
        let mut bridge = Bridge::new(scripted(), BridgeConfig::default());

        let out = bridge.send_command("look");
        assert_eq!(out, CommandOutput::empty(status::NOT_INITIALIZED));
        assert!(bridge.engine().commands_seen().is_empty());
        assert_eq!(bridge.load_state().unwrap_err().status(), status::NOT_INITIALIZED);
        let err = bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap_err();
        assert_eq!(err.status(), status::NOT_REGISTERED);
        bridge.teardown();
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
    }

    #[test]
    fn double_register_and_double_init_are_rejected() {
        let dirs = dirs();
        let mut bridge = Bridge::new(scripted(), BridgeConfig::default());
        bridge.register_extension().unwrap();
        assert_eq!(bridge.register_extension().unwrap_err().status(), status::ALREADY_REGISTERED);
        bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap();
        let err = bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap_err();
        assert_eq!(err.status(), status::ALREADY_INITIALIZED);
        assert_eq!(bridge.register_extension().unwrap_err().status(), status::ALREADY_INITIALIZED);
    }

    #[test]
    fn failed_init_discards_engine_state() {
        let dirs = dirs();
        let mut bridge = Bridge::new(scripted().fail_init(-42), BridgeConfig::default());
        bridge.register_extension().unwrap();
        let err = bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap_err();
        assert_eq!(err.status(), -42);
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
        assert!(bridge.engine().extensions().is_empty());
    }

    #[test]
    fn missing_bootstrap_blocks_initialize() {
        let dirs = dirs();
        let engine = scripted().without_resource("stead/metaparser.lua");
        let mut bridge = Bridge::new(engine, BridgeConfig::default());
        bridge.register_extension().unwrap();
        let err = bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap_err();
        assert_eq!(err.status(), status::BOOTSTRAP_FAILED);
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
    }

    #[test]
    fn load_state_uses_default_slot() {
        let dirs = dirs();
        let slot = dirs.game.path().join("saves").join("autosave");
        let mut bridge = running(scripted().with_save(slot), &dirs);
        assert_eq!(bridge.load_state().unwrap(), status::OK);
    }

    #[test]
    fn load_state_without_save() {
        let dirs = dirs();
        let mut bridge = running(scripted(), &dirs);
        assert_eq!(bridge.load_state().unwrap_err().status(), status::SAVE_NOT_FOUND);
    }

    #[test]
    fn teardown_allows_a_fresh_cycle() {
        let dirs = dirs();
        let mut bridge = running(scripted(), &dirs);
        bridge.teardown();
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
        assert!(!bridge.engine().is_running());
        assert_eq!(bridge.send_command("look").status, status::NOT_INITIALIZED);

        bridge.register_extension().unwrap();
        bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap();
        assert_eq!(bridge.send_command("look").text, "A dusty attic.");
    }

    #[test]
    fn custom_restart_function_name() {
        let dirs = dirs();
        let config = BridgeConfig {
            restart_function: "game_restart".into(),
            ..Default::default()
        };
        let engine = scripted().respond("again", "").trigger("again", "game_restart");
        let mut bridge = Bridge::new(engine, config);
        bridge.register_extension().unwrap();
        bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap();
        bridge.send_command("again");
        assert!(bridge.consume_restart_flag());
    }

    #[test]
    fn unconsumed_restart_does_not_leak_into_next_session() {
        let dirs = dirs();
        let mut bridge = running(scripted(), &dirs);
        bridge.send_command("restart");
        assert!(bridge.restart_signal().is_raised());
        bridge.teardown();

        bridge.register_extension().unwrap();
        bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap();
        assert!(!bridge.consume_restart_flag());
    }

    #[test]
    fn rejected_command_updates_last_status() {
        let dirs = dirs();
        let mut bridge = running(scripted(), &dirs);
        assert_eq!(bridge.send_command("look").status, status::OK);

        let out = bridge.reject_command(status::INVALID_ARGUMENT);
        assert_eq!(out, CommandOutput::empty(status::INVALID_ARGUMENT));
        assert_eq!(bridge.last_status(), status::INVALID_ARGUMENT);
        assert_eq!(bridge.engine().commands_seen(), ["look"]);
    }

    #[test]
    fn poisoned_lock_yields_a_fresh_bridge() {
        let dirs = dirs();
        let shared = Mutex::new(running(scripted(), &dirs));
        let poison = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = shared.lock().unwrap();
            panic!("host callback blew up");
        }));
        assert!(poison.is_err());
        assert!(shared.is_poisoned());

        let fresh = || Bridge::new(scripted(), BridgeConfig::default());
        let mut bridge = lock_or_reset(&shared, fresh);
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
        bridge.register_extension().unwrap();
        bridge.initialize(dirs.work.path(), dirs.game.path()).unwrap();
        assert_eq!(bridge.send_command("look").text, "A dusty attic.");
        drop(bridge);
        assert!(!shared.is_poisoned());
    }
}
