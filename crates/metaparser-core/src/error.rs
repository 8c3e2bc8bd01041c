// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the Metaparser bridge.

use std::path::PathBuf;

use thiserror::Error;

use crate::status;

/// Top-level error type for all bridge and engine operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Caller contract --
    #[error("invalid {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("engine is not initialized")]
    NotInitialized,

    #[error("engine is already initialized")]
    AlreadyInitialized,

    #[error("no extension registered before initialize")]
    NotRegistered,

    #[error("extension already registered")]
    AlreadyRegistered,

    // -- Engine --
    #[error("host function `{0}` is registered twice")]
    DuplicateFunction(String),

    #[error("bootstrap resource `{resource}` failed: {reason}")]
    Bootstrap { resource: String, reason: String },

    #[error("script error: {0}")]
    Script(String),

    /// A status reported by the engine itself, passed through untouched.
    #[error("engine returned status {code}: {reason}")]
    Engine { code: i32, reason: String },

    #[error("save slot not found: {}", .0.display())]
    SaveNotFound(PathBuf),

    // -- Host --
    #[error("JNI error: {0}")]
    Jni(String),

    #[error("panic inside the bridge")]
    Panicked,

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Integer status reported across the JNI boundary for this error.
    ///
    /// Engine-reported codes are returned exactly as the engine produced them.
    pub fn status(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } | Self::DuplicateFunction(_) => status::INVALID_ARGUMENT,
            Self::NotInitialized => status::NOT_INITIALIZED,
            Self::AlreadyInitialized => status::ALREADY_INITIALIZED,
            Self::NotRegistered => status::NOT_REGISTERED,
            Self::AlreadyRegistered => status::ALREADY_REGISTERED,
            Self::Bootstrap { .. } => status::BOOTSTRAP_FAILED,
            Self::Script(_) => status::ENGINE_FAILURE,
            Self::Engine { code, .. } => *code,
            Self::SaveNotFound(_) => status::SAVE_NOT_FOUND,
            Self::Jni(_) | Self::Panicked | Self::Io(_) | Self::Serialization(_) => {
                status::BRIDGE_FAILURE
            }
        }
    }

    /// Shorthand for [`BridgeError::InvalidArgument`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Collapse a unit result into the status code the caller sees.
pub fn status_of(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => status::OK,
        Err(e) => e.status(),
    }
}
