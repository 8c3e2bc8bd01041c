// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name looked up inside a data directory by [`BridgeConfig::load_or_default`].
pub const CONFIG_FILE: &str = "metaparser.json";

/// Settings for the bridge and the engine it hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bootstrap script resources, loaded in this order when the engine starts.
    pub bootstrap_scripts: Vec<String>,
    /// Name of the host function the scripts call to request a restart.
    pub restart_function: String,
    /// Entry script inside the game directory.
    pub main_script: String,
    /// Root for bootstrap resources. `None` means the working directory
    /// passed to `initialize`.
    pub resource_dir: Option<PathBuf>,
    /// Directory holding save slots. `None` means `<game_dir>/saves`.
    pub save_dir: Option<PathBuf>,
    /// Slot restored by `load_state`.
    pub default_save_slot: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bootstrap_scripts: vec!["stead/tiny3.lua".into(), "stead/metaparser.lua".into()],
            restart_function: "instead_restart".into(),
            main_script: "main3.lua".into(),
            resource_dir: None,
            save_dir: None,
            default_save_slot: "autosave".into(),
            log_filter: "info".into(),
        }
    }
}

impl BridgeConfig {
    /// Read a config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Read `<dir>/metaparser.json`, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load_or_default(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Write the config to `<dir>/metaparser.json`.
    pub fn persist(&self, dir: impl AsRef<Path>) -> Result<()> {
        let path = dir.as_ref().join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(())
    }

    /// Directory that bootstrap resources resolve against.
    pub fn resource_root<'a>(&'a self, work_dir: &'a Path) -> &'a Path {
        self.resource_dir.as_deref().unwrap_or(work_dir)
    }

    /// Path of the default save slot for a game.
    pub fn default_slot_path(&self, game_dir: &Path) -> PathBuf {
        self.save_dir
            .clone()
            .unwrap_or_else(|| game_dir.join("saves"))
            .join(&self.default_save_slot)
    }
}
