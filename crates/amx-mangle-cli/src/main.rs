//! `amxfilt`: filter for AMX native export names.
//!
//! ```text
//! $ amxfilt demangle SetTimer@3sib@i
//! native SetTimer(string, int, bool) -> int
//! $ amxfilt check --expected SetTimer@3sib@i SetTimer@3sfb@i
//! E305 [bind] parameter 1: expected type int, found Float
//! ```

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use amx_mangle::report::{CheckReport, DemangleReport, MangleReport};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser as ClapParser, Subcommand};
use env_logger::Env;
use log::debug;
use serde::Serialize;

#[derive(ClapParser, Debug)]
#[command(name = "amxfilt", version, about, long_about = None)]
struct Args {
    /// Print one JSON report per line instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Raise the log level (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode mangled names; reads one name per line from stdin when none are given
    Demangle { names: Vec<String> },

    /// Check a candidate export against an expected mangled name
    Check {
        #[arg(long)]
        expected: String,
        candidate: String,
    },

    /// Mangle a signature described as JSON
    Mangle {
        #[arg(id = "signature", value_name = "JSON")]
        json: String,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let names = match &args.command {
        Command::Demangle { names } if names.is_empty() => Some(read_names(io::stdin().lock())?),
        _ => None,
    };

    let stdout = io::stdout();
    let ok = run(args, names, &mut stdout.lock())?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default)).init();
}

/// Non-empty trimmed lines of `input`.
fn read_names(input: impl BufRead) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for line in input.lines() {
        let line = line.context("failed to read names from stdin")?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Execute the subcommand, writing results to `out`.
///
/// `stdin_names` replaces an empty demangle name list. Returns `false` when
/// any name failed to decode, check or mangle.
fn run(args: Args, stdin_names: Option<Vec<String>>, out: &mut impl Write) -> Result<bool> {
    match args.command {
        Command::Demangle { names } => {
            let names = stdin_names.unwrap_or(names);
            debug!("demangling {} name(s)", names.len());
            let mut ok = true;
            for name in &names {
                let report = DemangleReport::new(name);
                ok &= report.success;
                if args.json {
                    write_json(out, &report)?;
                } else if let Some(prototype) = &report.prototype {
                    writeln!(out, "{prototype}")?;
                } else if let Some(error) = &report.error {
                    writeln!(out, "{}", error.render())?;
                }
            }
            Ok(ok)
        }
        Command::Check {
            expected,
            candidate,
        } => {
            let report = CheckReport::new(&expected, &candidate);
            if args.json {
                write_json(out, &report)?;
            } else if let Some(error) = &report.error {
                writeln!(out, "{}", error.render())?;
            } else {
                writeln!(out, "ok: '{candidate}' satisfies '{expected}'")?;
            }
            Ok(report.matched)
        }
        Command::Mangle { json } => {
            let report = MangleReport::from_json(&json);
            if args.json {
                write_json(out, &report)?;
            } else if let Some(mangled) = &report.mangled {
                writeln!(out, "{mangled}")?;
            } else if let Some(error) = &report.error {
                writeln!(out, "error: {error}")?;
            }
            Ok(report.success)
        }
    }
}

fn write_json(out: &mut impl Write, report: &impl Serialize) -> Result<()> {
    let line = serde_json::to_string(report).context("failed to serialize report")?;
    writeln!(out, "{line}")?;
    Ok(())
}
