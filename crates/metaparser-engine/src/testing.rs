// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table-driven engine for tests of code that sits above `Engine`.
//
// Commands map to canned responses. A command can also be wired to a host
// function, which is then called exactly like a script would call it.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use metaparser_core::error::Result;
use metaparser_core::{BridgeError, CommandOutput, EnginePaths, status};

use crate::traits::{Engine, Extension, HostFunction};

/// Deterministic [`Engine`] without an interpreter.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    responses: HashMap<String, CommandOutput>,
    triggers: HashMap<String, String>,
    missing_resources: HashSet<String>,
    failing_commands: HashSet<String>,
    init_failure: Option<i32>,
    saves: HashSet<PathBuf>,
    extensions: Vec<Extension>,
    loaded_resources: Vec<String>,
    running: Option<EnginePaths>,
    commands_seen: Vec<String>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with `text` and status 0.
    #[must_use]
    pub fn respond(mut self, command: &str, text: &str) -> Self {
        self.responses.insert(command.into(), CommandOutput::ok(text));
        self
    }

    /// Answer `command` with an explicit output.
    #[must_use]
    pub fn respond_with(mut self, command: &str, output: CommandOutput) -> Self {
        self.responses.insert(command.into(), output);
        self
    }

    /// Call host function `function` whenever `command` runs.
    #[must_use]
    pub fn trigger(mut self, command: &str, function: &str) -> Self {
        self.triggers.insert(command.into(), function.into());
        self
    }

    /// Make `command` fail as if the interpreter raised an error.
    #[must_use]
    pub fn fail_command(mut self, command: &str) -> Self {
        self.failing_commands.insert(command.into());
        self
    }

    /// Pretend a bootstrap resource does not exist.
    #[must_use]
    pub fn without_resource(mut self, resource: &str) -> Self {
        self.missing_resources.insert(resource.into());
        self
    }

    /// Make `init` fail with an engine status.
    #[must_use]
    pub fn fail_init(mut self, code: i32) -> Self {
        self.init_failure = Some(code);
        self
    }

    /// Pretend a save slot exists at `path`.
    #[must_use]
    pub fn with_save(mut self, path: impl Into<PathBuf>) -> Self {
        self.saves.insert(path.into());
        self
    }

    /// Bootstrap resources loaded by the last successful `init`, in order.
    pub fn loaded_resources(&self) -> &[String] {
        &self.loaded_resources
    }

    pub fn commands_seen(&self) -> &[String] {
        &self.commands_seen
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Paths passed to the running `init`.
    pub fn paths(&self) -> Option<&EnginePaths> {
        self.running.as_ref()
    }

    fn function(&self, name: &str) -> Option<&HostFunction> {
        self.extensions
            .iter()
            .flat_map(Extension::functions)
            .find(|f| f.name() == name)
    }
}

impl Engine for ScriptedEngine {
    fn register_extension(&mut self, extension: Extension) -> Result<()> {
        if self.running.is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }
        if let Some(dup) = extension.functions().iter().find(|f| self.function(f.name()).is_some()) {
            return Err(BridgeError::DuplicateFunction(dup.name().to_string()));
        }
        self.extensions.push(extension);
        Ok(())
    }

    fn init(&mut self, paths: &EnginePaths) -> Result<()> {
        if self.running.is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }
        let mut loaded = Vec::new();
        for resource in self.extensions.iter().flat_map(Extension::bootstrap) {
            if self.missing_resources.contains(resource) {
                return Err(BridgeError::Bootstrap {
                    resource: resource.clone(),
                    reason: "not found".into(),
                });
            }
            loaded.push(resource.clone());
        }
        if let Some(code) = self.init_failure {
            return Err(BridgeError::Engine {
                code,
                reason: "scripted init failure".into(),
            });
        }
        self.loaded_resources = loaded;
        self.running = Some(paths.clone());
        Ok(())
    }

    fn command(&mut self, text: &str) -> Result<CommandOutput> {
        if self.running.is_none() {
            return Err(BridgeError::NotInitialized);
        }
        self.commands_seen.push(text.to_string());
        if self.failing_commands.contains(text) {
            return Err(BridgeError::Script(format!("scripted failure for `{text}`")));
        }
        if let Some(function) = self.triggers.get(text).and_then(|name| self.function(name)) {
            function.call();
        }
        Ok(self
            .responses
            .get(text)
            .cloned()
            .unwrap_or_else(|| CommandOutput::empty(status::COMMAND_FAILED)))
    }

    fn load(&mut self, slot: Option<&Path>) -> Result<i32> {
        let paths = self.running.as_ref().ok_or(BridgeError::NotInitialized)?;
        let path = slot
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths.game_dir.join("saves").join("autosave"));
        if self.saves.contains(&path) {
            Ok(status::OK)
        } else {
            Err(BridgeError::SaveNotFound(path))
        }
    }

    fn done(&mut self) {
        self.running = None;
        self.extensions.clear();
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn trigger_calls_registered_function() {
        let hit = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&hit);
        let mut engine = ScriptedEngine::new().respond("restart", "ok").trigger("restart", "boom");
        engine
            .register_extension(
                Extension::new("t").with_function(HostFunction::new("boom", move || {
                    flag.store(true, Ordering::SeqCst)
                })),
            )
            .unwrap();
        engine.init(&EnginePaths::new("/w", "/g")).unwrap();
        assert_eq!(engine.command("restart").unwrap(), CommandOutput::ok("ok"));
        assert!(hit.load(Ordering::SeqCst));
    }

    #[test]
    fn unknown_command_is_command_failure() {
        let mut engine = ScriptedEngine::new();
        engine.init(&EnginePaths::new("/w", "/g")).unwrap();
        let out = engine.command("dance").unwrap();
        assert_eq!(out, CommandOutput::empty(status::COMMAND_FAILED));
    }
}
