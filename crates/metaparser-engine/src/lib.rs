// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Metaparser: embedded engine abstraction.
//!
//! [`Engine`] is the seam between the bridge and the interpreter that runs
//! the story scripts. [`LuaEngine`] hosts those scripts in an embedded Lua
//! VM; [`testing::ScriptedEngine`] is a table-driven stand-in for tests.

pub mod loader;
pub mod lua;
pub mod testing;
pub mod traits;

pub use loader::{Resource, ResourceLoader};
pub use lua::LuaEngine;
pub use traits::{Engine, Extension, HostFunction};
