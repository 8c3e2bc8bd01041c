// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Metaparser bridge.

use std::path::PathBuf;

use crate::status;

/// Text produced by the engine for one command, plus the engine status.
///
/// `text` is always present. An engine that printed nothing, or failed
/// outright, yields an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub text: String,
    pub status: i32,
}

impl CommandOutput {
    /// A successful response carrying `text`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: status::OK,
        }
    }

    /// An empty response carrying only a status code.
    pub fn empty(status: i32) -> Self {
        Self {
            text: String::new(),
            status,
        }
    }

    pub fn is_ok(&self) -> bool {
        status::is_ok(self.status)
    }
}

/// Lifecycle states of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeState {
    /// Nothing registered, no engine running.
    #[default]
    Uninitialized,
    /// Extension registered; waiting for `initialize`.
    Registered,
    /// Engine running; commands accepted.
    Running,
}

impl std::fmt::Display for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Registered => "registered",
            Self::Running => "running",
        };
        f.write_str(name)
    }
}

/// Directories the engine is started against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePaths {
    /// Working directory of the process once `initialize` has run. Bootstrap
    /// resources resolve against it unless a resource dir is configured.
    pub work_dir: PathBuf,
    /// Directory holding the story's main script.
    pub game_dir: PathBuf,
}

impl EnginePaths {
    pub fn new(work_dir: impl Into<PathBuf>, game_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            game_dir: game_dir.into(),
        }
    }

    /// Short game name used in log fields (last path component).
    pub fn game_name(&self) -> &str {
        self.game_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<game>")
    }
}
