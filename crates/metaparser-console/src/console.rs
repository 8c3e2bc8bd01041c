// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line-oriented game loop over a `Bridge`.
//
// Every input line is one command. Lines starting with `!` are console
// directives: `!load` restores the default save slot, `!quit` ends the
// session. A restart requested by the scripts tears the engine down and
// runs the register/initialise sequence again, as the Android app does.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tracing::debug;

use metaparser_bridge::Bridge;
use metaparser_core::error::Result;
use metaparser_engine::Engine;

/// Command sent after every (re)start to show the opening text.
const OPENING_COMMAND: &str = "look";

pub struct Console<E: Engine> {
    bridge: Bridge<E>,
    data_dir: PathBuf,
    game_dir: PathBuf,
}

impl<E: Engine> Console<E> {
    pub fn new(bridge: Bridge<E>, data_dir: PathBuf, game_dir: PathBuf) -> Self {
        Self {
            bridge,
            data_dir,
            game_dir,
        }
    }

    fn start(&mut self, out: &mut impl Write) -> Result<()> {
        self.bridge.register_extension()?;
        self.bridge.initialize(&self.data_dir, &self.game_dir)?;
        self.print_response(OPENING_COMMAND, out)
    }

    fn print_response(&mut self, command: &str, out: &mut impl Write) -> Result<()> {
        let output = self.bridge.send_command(command);
        if !output.text.is_empty() {
            writeln!(out, "{}", output.text.trim_end())?;
        }
        if !output.is_ok() {
            debug!(command, status = output.status, "command reported a non-zero status");
        }
        Ok(())
    }

    /// Play until `!quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, mut out: impl Write) -> Result<()> {
        self.start(&mut out)?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            let command = line.trim();
            match command {
                "" => continue,
                "!quit" => break,
                "!load" => match self.bridge.load_state() {
                    Ok(code) => writeln!(out, "[restored, status {code}]")?,
                    Err(e) => writeln!(out, "[cannot restore: {e}]")?,
                },
                _ => {
                    self.print_response(command, &mut out)?;
                    if self.bridge.consume_restart_flag() {
                        writeln!(out, "[restarting]")?;
                        self.bridge.teardown();
                        self.start(&mut out)?;
                    }
                }
            }
            out.flush()?;
        }

        self.bridge.teardown();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaparser_core::{BridgeConfig, status};
    use metaparser_engine::testing::ScriptedEngine;

    fn play(engine: ScriptedEngine, input: &str) -> (Result<()>, String) {
        let work = tempfile::tempdir().unwrap();
        let game = tempfile::tempdir().unwrap();
        let bridge = Bridge::new(engine, BridgeConfig::default());
        let mut console = Console::new(bridge, work.path().into(), game.path().into());
        let mut out = Vec::new();
        let result = console.run(input.as_bytes(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn story() -> ScriptedEngine {
        ScriptedEngine::new()
            .respond("look", "Attic.")
            .respond("restart", "Bye.")
            .trigger("restart", "instead_restart")
    }

    #[test]
    fn prints_opening_and_responses() {
        let (result, out) = play(story(), "look\n\n!quit\nlook\n");
        result.unwrap();
        assert_eq!(out, "Attic.\nAttic.\n");
    }

    #[test]
    fn restart_reinitialises() {
        let (result, out) = play(story(), "restart\n");
        result.unwrap();
        assert_eq!(out, "Attic.\nBye.\n[restarting]\nAttic.\n");
    }

    #[test]
    fn load_without_save_is_reported() {
        let (result, out) = play(story(), "!load\n");
        result.unwrap();
        assert!(out.contains("cannot restore"));
    }

    #[test]
    fn init_failure_ends_session() {
        let (result, _) = play(story().fail_init(status::ENGINE_FAILURE), "look\n");
        assert_eq!(result.unwrap_err().status(), status::ENGINE_FAILURE);
    }
}
