//! zcl-tool: inspect and build Aqara thermostat weekly schedules.
//!
//! # Usage
//!
//! ```text
//! zcl-tool decode   <HEX>       26-byte attribute buffer → text form
//! zcl-tool encode   <SCHEDULE>  text form → validated buffer as hex
//! zcl-tool format   <SCHEDULE>  text form → normalized text form
//! zcl-tool validate <SCHEDULE>  exit status 0 when the schedule is valid
//!
//! Options:
//!   --json   print results as JSON
//! ```
//!
//! The text form is `days|h:mm,temp|h:mm,temp|h:mm,temp|h:mm,temp`, e.g.
//! `mon,wed,fri|7:00,18.5|9:00,16.0|17:00,20.0|22:00,15.0`.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use zcl_tool::application::{self, to_json};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "zcl-tool",
    about = "Decode, encode, format and validate Aqara thermostat weekly schedules",
    version
)]
struct Cli {
    /// Print results as JSON.
    #[arg(long, global = true, env = "ZCL_TOOL_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Decode a 26-byte schedule buffer given as hex.
    Decode {
        /// Buffer bytes, e.g. `042a01a4…`; `0x` prefix and spaces are accepted.
        hex: String,
    },
    /// Validate a schedule and print its encoded buffer.
    Encode { schedule: String },
    /// Print a schedule in normalized text form.
    Format { schedule: String },
    /// Check a schedule against the thermostat's rules.
    Validate { schedule: String },
}

/// Runs one command and returns what to print.
fn run(cli: &Cli) -> anyhow::Result<String> {
    debug!(command = ?cli.command, json = cli.json, "running");
    let output = match &cli.command {
        Command::Decode { hex } => {
            let report = application::decode(hex).context("cannot decode schedule buffer")?;
            if cli.json {
                to_json(&report)?
            } else {
                match &report.problem {
                    Some(problem) => format!("{}\n(invalid: {problem})", report.text),
                    None => report.text,
                }
            }
        }
        Command::Encode { schedule } => {
            let report = application::encode(schedule).context("cannot encode schedule")?;
            if cli.json {
                to_json(&report)?
            } else {
                report.hex
            }
        }
        Command::Format { schedule } => {
            let text = application::format(schedule).context("cannot parse schedule")?;
            if cli.json {
                to_json(&text)?
            } else {
                text
            }
        }
        Command::Validate { schedule } => {
            let parsed = application::validate(schedule).context("schedule is invalid")?;
            if cli.json {
                to_json(&parsed)?
            } else {
                format!("valid: {parsed}")
            }
        }
    };
    Ok(output)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    println!("{}", run(&cli)?);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
