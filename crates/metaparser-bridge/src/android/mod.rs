// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android JNI entry points for `org.emunix.metaparser.Game`.
//
// The Java class declares:
//
//   native int    registerExtension();
//   native int    insteadInit(String directory, String gameDirectory);
//   native String insteadCommand(String command);
//   native int    insteadCommandStatus();
//   native int    insteadLoad();
//   native void   insteadDone();
//   native int    isRestart();
//
// Java passes no handle, so the exports share one process-wide `Bridge`
// behind a mutex. Every managed string is copied into an owned Rust `String`
// on entry; nothing borrowed from the JVM outlives the call. Panics are
// caught here and reported as `BRIDGE_FAILURE`; the next call finds a fresh
// bridge, so Java can recover by starting again at `registerExtension`.

#![cfg(target_os = "android")]

use std::panic::{self, AssertUnwindSafe};
use std::sync::{LazyLock, Mutex};

use jni::JNIEnv;
use jni::objects::{JObject, JString};
use jni::sys::{jint, jstring};

use metaparser_core::error::{Result, status_of};
use metaparser_core::{BridgeConfig, BridgeError};
use metaparser_engine::LuaEngine;

use crate::bridge::{Bridge, lock_or_reset, lua_bridge};

// ---------------------------------------------------------------------------
// Shared bridge and boundary helpers
// ---------------------------------------------------------------------------

static BRIDGE: LazyLock<Mutex<Bridge<LuaEngine>>> =
    LazyLock::new(|| Mutex::new(lua_bridge(BridgeConfig::default())));

/// Run `f` against the shared bridge with panics contained.
fn with_bridge<T>(f: impl FnOnce(&mut Bridge<LuaEngine>) -> T) -> Result<T> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut bridge = lock_or_reset(&*BRIDGE, || lua_bridge(BridgeConfig::default()));
        f(&mut bridge)
    }));
    outcome.map_err(|_| {
        tracing::error!("panic caught at the JNI boundary");
        BridgeError::Panicked
    })
}

/// Collapse a bridge call returning a status into a `jint`.
fn status_result(result: Result<i32>) -> jint {
    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "JNI call failed");
            e.status()
        }
    }
}

/// Convenience: map any `jni::errors::Error` into `BridgeError::Jni`.
fn jni_err(context: &str, e: jni::errors::Error) -> BridgeError {
    BridgeError::Jni(format!("{context}: {e}"))
}

/// Copy a Java string into an owned `String`. Null is an invalid argument.
fn owned_string(env: &mut JNIEnv<'_>, value: &JString<'_>, name: &'static str) -> Result<String> {
    if value.is_null() {
        return Err(BridgeError::invalid(name, "null string"));
    }
    env.get_string(value)
        .map(String::from)
        .map_err(|e| jni_err("GetStringUTFChars", e))
}

/// Build a Java string, falling back to `""` so the caller never sees null
/// unless the JVM cannot allocate at all.
fn java_string(env: &mut JNIEnv<'_>, text: &str) -> jstring {
    match env.new_string(text) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            tracing::error!(error = %e, bytes = text.len(), "NewStringUTF failed, returning empty response");
            env.new_string("")
                .map(JString::into_raw)
                .unwrap_or(std::ptr::null_mut())
        }
    }
}

fn initialize(env: &mut JNIEnv<'_>, directory: &JString<'_>, game_directory: &JString<'_>) -> Result<i32> {
    let current = owned_string(env, directory, "current_directory")?;
    let game = owned_string(env, game_directory, "game_directory")?;
    with_bridge(|bridge| status_of(&bridge.initialize(&current, &game)))
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_emunix_metaparser_Game_registerExtension(
    _env: JNIEnv,
    _this: JObject,
) -> jint {
    crate::logging::init(&BridgeConfig::default().log_filter);
    status_result(with_bridge(|bridge| status_of(&bridge.register_extension())))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_emunix_metaparser_Game_insteadInit(
    mut env: JNIEnv,
    _this: JObject,
    directory: JString,
    game_directory: JString,
) -> jint {
    status_result(initialize(&mut env, &directory, &game_directory))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_emunix_metaparser_Game_insteadCommand(
    mut env: JNIEnv,
    _this: JObject,
    command: JString,
) -> jstring {
    let text = match owned_string(&mut env, &command, "command") {
        Ok(command) => match with_bridge(|bridge| bridge.send_command(&command)) {
            Ok(output) => output.text,
            Err(e) => {
                tracing::error!(error = %e, "command not delivered");
                String::new()
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "command not readable");
            let status = e.status();
            if let Err(e) = with_bridge(|bridge| bridge.reject_command(status)) {
                tracing::error!(error = %e, "command status not recorded");
            }
            String::new()
        }
    };
    java_string(&mut env, &text)
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_emunix_metaparser_Game_insteadCommandStatus(
    _env: JNIEnv,
    _this: JObject,
) -> jint {
    status_result(with_bridge(|bridge| bridge.last_status()))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_emunix_metaparser_Game_insteadLoad(
    _env: JNIEnv,
    _this: JObject,
) -> jint {
    status_result(with_bridge(|bridge| match bridge.load_state() {
        Ok(code) => code,
        Err(e) => e.status(),
    }))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_emunix_metaparser_Game_insteadDone(_env: JNIEnv, _this: JObject) {
    if let Err(e) = with_bridge(|bridge| bridge.teardown()) {
        tracing::error!(error = %e, "teardown failed");
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_emunix_metaparser_Game_isRestart(_env: JNIEnv, _this: JObject) -> jint {
    match with_bridge(|bridge| bridge.consume_restart_flag()) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            tracing::error!(error = %e, "restart flag unavailable");
            0
        }
    }
}
