// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Integer status codes that cross the JNI boundary.
//
// Zero is success. Positive values come from the story scripts themselves.
// Negative values are reserved for the engine host and the bridge.

/// The operation succeeded.
pub const OK: i32 = 0;

/// The scripts handled the command but reported it as unsuccessful
/// (e.g. the parser did not understand the input).
pub const COMMAND_FAILED: i32 = 1;

/// The interpreter raised an error while running script code.
pub const ENGINE_FAILURE: i32 = -1;

/// A path or string argument was empty, null, or not a readable directory.
pub const INVALID_ARGUMENT: i32 = -2;

/// The operation needs a running engine.
pub const NOT_INITIALIZED: i32 = -3;

/// `initialize` was called while the engine is already running.
pub const ALREADY_INITIALIZED: i32 = -4;

/// `initialize` was called before `register_extension`.
pub const NOT_REGISTERED: i32 = -5;

/// `register_extension` was called twice without a teardown in between.
pub const ALREADY_REGISTERED: i32 = -6;

/// A bootstrap script resource could not be found or failed to run.
pub const BOOTSTRAP_FAILED: i32 = -7;

/// The default save slot does not exist.
pub const SAVE_NOT_FOUND: i32 = -8;

/// Host-side failure such as a JNI conversion error, I/O, or a caught panic.
pub const BRIDGE_FAILURE: i32 = -9;

/// Whether `code` means success.
pub fn is_ok(code: i32) -> bool {
    code == OK
}
