//! Command-line interface (CLI) for lalr-calc
//!
//! Reads calculator statements from a file or standard input and prints one
//! line per statement: the value, or `error` when the statement could not be
//! computed or was skipped by error recovery.

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use lalr_calc::Calculator;
use smartstring::alias::String;
use std::io::Read;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluates statements
    Parse {
        /// Input file with lalr-calc statements, `-` for standard input
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Log every shift and reduction
        #[arg(short, long)]
        trace: bool,
    },
}

fn read_input(path: &str) -> Result<std::string::String> {
    if path == "-" {
        let mut text = std::string::String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("can't read standard input")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("can't open {:?}", path))
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Parse { input, trace } => {
            let filter = if trace { "info" } else { "warn" };
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
                .init();

            let mut calculator = Calculator::new()?;
            calculator.set_trace_enabled(trace);
            let text = read_input(&input)?;
            let values = calculator
                .evaluate(&text)
                .with_context(|| format!("can't evaluate {:?}", input))?;
            for value in values {
                match value {
                    Some(n) => println!("{}", n),
                    None => println!("error"),
                }
            }
        }
    }
    Ok(())
}
