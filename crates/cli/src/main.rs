//! TiCloud cookbook CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse arguments**: `clap` flags, each credential flag backed by an
//!    environment variable.
//! 2. **Wire observability**: configure `tracing-subscriber` (text or JSON)
//!    on stderr. Every span and event emitted by `intel` and `ticloud` flows
//!    through it, tagged with the run's [`intel::RunId`].
//! 3. **Layer settings**: flags, then `config.toml`, then
//!    `ticloud_credentials.json`, then defaults.
//! 4. **Construct infrastructure**: one `TiCloudClient`, handed to the
//!    domain operations as their port implementations.
//! 5. **Dispatch**: run the selected subcommand and map failures to an exit
//!    code.

mod args;
mod commands;
mod observability;
mod output;
mod settings;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use intel::RunId;
use tracing::{info_span, Instrument};

use crate::args::Cli;
use crate::settings::SettingsError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    observability::init(cli.global.log_format, cli.global.verbose);

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "ticloud-cookbook".to_string());
    let run_id = RunId::new_random();
    let span = info_span!("run", run_id = %run_id);

    match commands::run(cli, &program).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report_failure(&err, &mut io::stdout(), &mut io::stderr())),
    }
}

/// Prints `err` and returns the process exit status.
///
/// A missing setting goes to stdout with status 2; anything else goes to
/// stderr with status 1.
fn report_failure(err: &anyhow::Error, out: &mut impl Write, err_out: &mut impl Write) -> u8 {
    if let Some(missing @ SettingsError::Missing { .. }) = err.downcast_ref::<SettingsError>() {
        let _ = writeln!(out, "{missing}");
        return 2;
    }
    let _ = writeln!(err_out, "Error: {err:#}");
    1
}
