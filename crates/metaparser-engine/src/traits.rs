// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine abstraction and extension records.
//
// The bridge only ever talks to the interpreter through `Engine`. An engine
// is driven by exactly one caller at a time; nothing here is re-entrant.

use std::path::Path;
use std::sync::Arc;

use metaparser_core::error::Result;
use metaparser_core::{CommandOutput, EnginePaths};

/// Callback the scripts can invoke. Takes no arguments and returns nothing.
pub type HostFn = Arc<dyn Fn() + Send + Sync>;

/// A named host function published to the script layer.
#[derive(Clone)]
pub struct HostFunction {
    name: String,
    callback: HostFn,
}

impl HostFunction {
    pub fn new(name: impl Into<String>, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            callback: Arc::new(callback),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the callback, for engines that need to move it into
    /// their own function tables.
    pub fn callback(&self) -> HostFn {
        Arc::clone(&self.callback)
    }

    pub fn call(&self) {
        (self.callback)()
    }
}

impl std::fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFunction").field("name", &self.name).finish()
    }
}

/// Host functions plus the bootstrap scripts that depend on them.
///
/// Bootstrap resources are logical names (e.g. `stead/tiny3.lua`) resolved by
/// the engine's own loader, and are loaded in the order they were added.
#[derive(Debug, Clone)]
pub struct Extension {
    name: String,
    functions: Vec<HostFunction>,
    bootstrap: Vec<String>,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            bootstrap: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_function(mut self, function: HostFunction) -> Self {
        self.functions.push(function);
        self
    }

    #[must_use]
    pub fn with_bootstrap(mut self, resource: impl Into<String>) -> Self {
        self.bootstrap.push(resource.into());
        self
    }

    #[must_use]
    pub fn with_bootstraps(mut self, resources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.bootstrap.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> &[HostFunction] {
        &self.functions
    }

    pub fn bootstrap(&self) -> &[String] {
        &self.bootstrap
    }
}

/// An embedded interpreter the bridge can drive.
///
/// Lifecycle: `register_extension` (any number of times) → `init` →
/// `command` / `load` → `done`. `done` forgets registered extensions as well
/// as the running state.
pub trait Engine {
    /// Record an extension. Its functions are published and its bootstrap
    /// scripts run when the interpreter starts.
    fn register_extension(&mut self, extension: Extension) -> Result<()>;

    /// Start the interpreter against a game directory.
    fn init(&mut self, paths: &EnginePaths) -> Result<()>;

    /// Run one command. Script-level failure is reported in the returned
    /// status; `Err` means the interpreter itself failed.
    fn command(&mut self, text: &str) -> Result<CommandOutput>;

    /// Restore a save slot, or the default slot when `slot` is `None`.
    /// Returns the status reported by the scripts.
    fn load(&mut self, slot: Option<&Path>) -> Result<i32>;

    /// Release the interpreter and forget all extensions.
    fn done(&mut self);

    fn is_running(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn bootstrap_order_is_kept() {
        let ext = Extension::new("parser")
            .with_bootstrap("stead/tiny3.lua")
            .with_bootstraps(["stead/metaparser.lua", "stead/extra.lua"]);
        assert_eq!(
            ext.bootstrap(),
            ["stead/tiny3.lua", "stead/metaparser.lua", "stead/extra.lua"]
        );
    }

    #[test]
    fn host_function_invokes_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let f = HostFunction::new("ping", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        f.call();
        (f.callback())();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(f.name(), "ping");
    }
}
