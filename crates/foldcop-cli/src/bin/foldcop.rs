#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;

use foldcop_cli::args::CliArgs;
use foldcop_cli::driver::{self, EXIT_FATAL};

fn main() {
    // Initialize tracing if FOLDCOP_LOG or RUST_LOG is set (zero cost otherwise).
    foldcop_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("foldcop: {err:#}");
            std::process::exit(EXIT_FATAL);
        }
    }
}

fn run(args: &CliArgs) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let color = !args.no_color
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stdout().is_terminal();
    colored::control::set_override(color);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    driver::run(args, &cwd, &mut out, color)
}
