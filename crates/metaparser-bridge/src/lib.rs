// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Metaparser: native engine bridge.
//!
//! [`Bridge`] owns the embedded engine and the restart signal and exposes
//! the six operations the Android `Game` class drives: register the
//! extension, initialise, send a command, load the default save, tear down,
//! and consume the restart flag.
//!
//! On Android the [`android`] module exports those operations as JNI
//! symbols over a single process-wide bridge. Elsewhere (desktop, CI) the
//! same [`Bridge`] is used directly.

pub mod bridge;
pub mod logging;
pub mod restart;

#[cfg(target_os = "android")]
pub mod android;

pub use bridge::{Bridge, EXTENSION_NAME, lua_bridge};
pub use restart::RestartSignal;
