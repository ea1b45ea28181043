//! Flatline - check, convert and apply expressions from the command line

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use flatline::expression::{Expression, ExpressionError, ExpressionResult};
use flatline::source::{read_sample, Sample, DEFAULT_SAMPLE_SIZE};
use flatline::syntax::{from_json_tree, parse_symbolic};
use flatline::{Interpreter, Row, Value};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;

/// Flatline - a typed expression interpreter for tabular data
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

/// Where an expression's rows come from
#[derive(clap::Args, Debug)]
struct Input {
    /// Expression text
    expression: String,

    /// Read the expression as a JSON tree instead of symbolic syntax
    #[arg(short, long)]
    json: bool,

    /// Sample file with optional `fields` and `rows`
    #[arg(short, long)]
    sample: Option<PathBuf>,

    /// Maximum number of sample rows to use
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    rows: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Type check an expression and print its descriptor
    Check(Input),

    /// Evaluate an expression over sample rows
    Apply {
        #[command(flatten)]
        input: Input,

        /// Append the results as a new field with this name
        #[arg(short, long)]
        generate: Option<String>,
    },

    /// Convert symbolic syntax to a JSON tree
    ToJson { expression: String },

    /// Convert a JSON tree to symbolic syntax
    ToLisp { tree: String },

    /// List registered primitives
    Primitives,

    /// Infer a schema from one JSON row
    Infer { row: String },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let interpreter = Interpreter::new();
    debug!("{} primitives registered", interpreter.registry().len());

    match args.command {
        Command::Check(input) => {
            let expr = match parse_input(&input)? {
                Ok(expr) => expr,
                Err(err) => return report::<()>(Err(err)),
            };
            let sample = load_sample(&input)?;
            let result = match &sample {
                Some(sample) => {
                    interpreter.check_with_rows(&expr, sample.schema.as_ref(), &sample.rows)
                }
                None => interpreter.check(&expr, None),
            };
            report(result)
        }

        Command::Apply { input, generate } => {
            let expr = match parse_input(&input)? {
                Ok(expr) => expr,
                Err(err) => return report::<()>(Err(err)),
            };
            // Without a sample, evaluate once against an empty row
            let sample = load_sample(&input)?.unwrap_or_else(|| Sample {
                schema: None,
                rows: vec![Row::new()],
            });
            match generate {
                Some(name) => report(interpreter.generate(
                    &expr,
                    sample.schema.as_ref(),
                    &sample.rows,
                    Some(&name),
                )),
                None => report(interpreter.evaluate(&expr, sample.schema.as_ref(), &sample.rows)),
            }
        }

        Command::ToJson { expression } => report(interpreter.lisp_to_json(&expression)),

        Command::ToLisp { tree } => {
            let tree: serde_json::Value =
                serde_json::from_str(&tree).context("Expression is not valid JSON")?;
            match interpreter.json_to_lisp(&tree) {
                Ok(text) => {
                    println!("{}", text);
                    Ok(())
                }
                Err(err) => report::<()>(Err(err)),
            }
        }

        Command::Primitives => {
            for prim in interpreter.primitives() {
                println!("{:<16}{}", prim.name, prim.doc);
            }
            Ok(())
        }

        Command::Infer { row } => {
            let row: Vec<Value> = serde_json::from_str(&row).context("Row is not a JSON array")?;
            print_json(&interpreter.infer_schema(&row))
        }
    }
}

/// Parse the expression argument; the inner result carries syntax diagnostics
fn parse_input(input: &Input) -> Result<ExpressionResult<Expression>> {
    if input.json {
        let tree: serde_json::Value =
            serde_json::from_str(&input.expression).context("Expression is not valid JSON")?;
        Ok(from_json_tree(&tree))
    } else {
        Ok(parse_symbolic(&input.expression))
    }
}

fn load_sample(input: &Input) -> Result<Option<Sample>> {
    let Some(path) = &input.sample else {
        return Ok(None);
    };
    let sample = read_sample(path, input.rows)
        .with_context(|| format!("Failed to load sample from {}", path.display()))?;
    info!("📂 Loaded {} rows from {}", sample.rows.len(), path.display());
    Ok(Some(sample))
}

/// Print a result as JSON, or the structured diagnostic and exit with status 1
fn report<T: Serialize>(result: Result<T, ExpressionError>) -> Result<()> {
    match result {
        Ok(value) => print_json(&value),
        Err(err) => {
            eprintln!("❌ {}", err);
            print_json(&serde_json::json!({ "error": err }))?;
            std::process::exit(1);
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
