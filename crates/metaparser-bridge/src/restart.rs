// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge-triggered restart signal.
//
// Raised from inside script execution, taken by the caller after each
// command. Raising twice before a take still yields a single `true`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-slot flag shared between the bridge and the engine-side callback.
#[derive(Debug, Clone, Default)]
pub struct RestartSignal {
    raised: Arc<AtomicBool>,
}

impl RestartSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a restart as requested.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Return whether a restart was requested, clearing the request.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }

    /// Peek without clearing.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear() {
        assert!(!RestartSignal::new().take());
    }

    #[test]
    fn take_returns_true_once() {
        let signal = RestartSignal::new();
        signal.raise();
        assert!(signal.is_raised());
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn clones_share_the_slot() {
        let signal = RestartSignal::new();
        let engine_side = signal.clone();
        engine_side.raise();
        engine_side.raise();
        assert!(signal.take());
        assert!(!engine_side.is_raised());
    }

    #[test]
    fn raise_from_another_thread() {
        let signal = RestartSignal::new();
        let remote = signal.clone();
        std::thread::spawn(move || remote.raise()).join().unwrap();
        assert!(signal.take());
    }
}
