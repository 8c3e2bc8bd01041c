// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metaparser console: play a game from a terminal.
//
// Entry point. Parses arguments, loads the config, initialises logging, and
// hands stdin/stdout to the console loop.

mod console;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use metaparser_bridge::{logging, lua_bridge};
use metaparser_core::BridgeConfig;

use console::Console;

/// Play a Metaparser game through the native engine bridge.
#[derive(Debug, Parser)]
#[command(name = "metaparser", version, about)]
struct Cli {
    /// Game directory (contains the main script).
    game_dir: PathBuf,

    /// Data directory holding the `stead/` bootstrap scripts.
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Config file. Defaults to `<data-dir>/metaparser.json` when present.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match BridgeConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("metaparser: cannot read {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => BridgeConfig::load_or_default(&cli.data_dir),
    };

    logging::init(&config.log_filter);
    tracing::info!(game = %cli.game_dir.display(), "metaparser console starting");

    let mut console = Console::new(lua_bridge(config), cli.data_dir, cli.game_dir);
    match console.run(io::stdin().lock(), io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, status = e.status(), "session ended with an error");
            eprintln!("metaparser: {e} (status {})", e.status());
            ExitCode::FAILURE
        }
    }
}
