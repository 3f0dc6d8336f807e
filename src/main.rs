//! Brolga Compiler
//!
//! A small statically typed scripting language that compiles to
//! JavaScript. The pipeline is lexer -> parser -> semantic analyzer ->
//! JavaScript translator; any diagnostic aborts the run with a
//! `Line N, col M: <message>` report.

mod backend;
mod frontend;
mod middle;
mod types;
mod utils;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

use backend::JsTranslator;
use frontend::analyzer::Analyzer;
use frontend::lexer::Lexer;
use frontend::parser::Parser as BrolgaParser;
use middle::core;
use utils::SourceMap;

/// Brolga Compiler
#[derive(Parser, Debug)]
#[command(name = "brolgac")]
#[command(version = "0.1.0")]
#[command(about = "Brolga compiler - a small statically typed scripting language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (.brl)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Emit the typed core program as JSON instead of JavaScript
    #[arg(long)]
    emit_core: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a source file to JavaScript
    Build {
        /// Input source file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a source file for errors
    Check {
        /// Input source file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Build { input, output }) => {
            translate_file(input, output.clone(), cli.emit_core)
        }
        Some(Commands::Check { input }) => check_file(input),
        None => {
            // Default: translate the input file
            if let Some(ref input) = cli.input {
                translate_file(input, cli.output.clone(), cli.emit_core)
            } else {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: brolgac <FILE> or brolgac build <FILE>");
                process::exit(1);
            }
        }
    }
}

/// Run the frontend over a source text; print the located diagnostic and
/// exit on the first violation
fn analyze_source(source: &str) -> core::Program {
    let map = SourceMap::new(source);

    let mut parser = BrolgaParser::new(Lexer::new(source));
    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(e) => report(&map, &e),
    };
    debug!("parsed {} statement(s)", program.statements.len());

    match Analyzer::new().analyze(&program) {
        Ok(program) => program,
        Err(e) => report(&map, &e),
    }
}

fn report(map: &SourceMap, error: &utils::Error) -> ! {
    eprintln!("{}: {}", map.describe(error.span()), error);
    process::exit(1);
}

/// Translate a source file to JavaScript (or dump the core program)
fn translate_file(input: &Path, output: Option<PathBuf>, emit_core: bool) -> Result<()> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("could not read {}", input.display()))?;
    let program = analyze_source(&source);

    let target = if emit_core {
        serde_json::to_string_pretty(&program).context("could not serialize core program")?
    } else {
        JsTranslator::new().translate(&program).join("\n")
    };

    match output {
        Some(path) => {
            fs::write(&path, target + "\n")
                .with_context(|| format!("could not write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", target),
    }

    Ok(())
}

/// Check a source file for errors without generating code
fn check_file(input: &Path) -> Result<()> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("could not read {}", input.display()))?;
    analyze_source(&source);

    println!("✅ No errors found");
    Ok(())
}
