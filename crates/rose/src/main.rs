//! `rose`: command-line runner and REPL for the Rose scripting language.
//!
//! ```text
//! rose [OPTIONS] [FILE]
//! ```
//!
//! Runs `FILE` through the scanner, parser, semantic analyzer and evaluator
//! and prints the value of its last statement.  With `-i` it starts an
//! interactive session instead.  Diagnostics go to stderr in the
//! `[ERROR] [file:line:column]: message` format; any failure exits with
//! status 1.
//!
//! Logging is controlled by the `ROSE_LOG` environment variable (an
//! `EnvFilter` directive such as `rose_core=debug`); the default is `warn`.

mod repl;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rose_core::parser::printer;
use rose_core::{Interpreter, RoseError, analyze, lex_file, parse};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "ROSE_LOG";

/// Runs Rose scripts or starts an interactive session.
#[derive(Parser, Debug)]
#[command(name = "rose", about, long_about = None, disable_version_flag = true)]
struct Args {
    /// Script to run.
    file: Option<PathBuf>,

    /// Print the interpreter version and exit.
    #[arg(short = 'v', long)]
    version: bool,

    /// Start an interactive read-eval-print loop.
    #[arg(short, long)]
    interactive: bool,

    /// Print the parsed syntax tree before running.
    #[arg(long)]
    dump_ast: bool,

    /// Print the program regenerated from its syntax tree before running.
    #[arg(long)]
    print_source: bool,

    /// Stop after semantic analysis.
    #[arg(long)]
    check: bool,

    /// Log how long each stage takes (at `info` level).
    #[arg(long)]
    timings: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(if args.timings { "info" } else { "warn" });

    if args.version {
        println!("Rose interpreter version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let result = if args.interactive {
        repl::run().context("REPL I/O failed")
    } else if let Some(path) = &args.file {
        run_file(path, &args)
    } else {
        eprintln!("No input file provided");
        return ExitCode::FAILURE;
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<RoseError>() {
                Some(rose) => eprintln!("{rose}"),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// Installs a stderr `fmt` subscriber filtered by `ROSE_LOG`.
fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Times one pipeline stage.
fn timed<T>(stage: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    tracing::info!(stage, elapsed = ?start.elapsed(), "stage finished");
    out
}

fn run_file(path: &Path, args: &Args) -> anyhow::Result<()> {
    let tokens = timed("lex", || lex_file(path))?;
    let program = timed("parse", || parse(tokens))?;

    if args.dump_ast {
        print!("{}", printer::dump(&program));
    }
    if args.print_source {
        print!("{}", printer::to_source(&program));
    }

    let diagnostics = timed("sema", || analyze(&program));
    if !diagnostics.is_empty() {
        return Err(RoseError::Semantic(diagnostics).into());
    }
    if args.check {
        tracing::info!(file = %path.display(), "semantic analysis succeeded");
        return Ok(());
    }

    let mut interpreter = Interpreter::new();
    let value = timed("eval", || interpreter.evaluate(&program))?;
    if !value.is_undefined() {
        println!("{value}");
    }
    Ok(())
}
