//! Shared output helpers for human and JSON modes.
//!
//! Human mode prints primary data to stdout and notices to stderr.
//! JSON mode wraps responses in `{ data, warnings? }` and respects
//! `--pretty` and `--quiet`.

use std::io::Write;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::opts::GlobalOpts;

pub fn print_success(opts: &GlobalOpts, data: Value, mut warnings: Vec<String>) -> Result<()> {
    if opts.quiet {
        warnings.clear();
    }
    if opts.json_output() {
        print_json(opts, data, warnings)
    } else {
        print_human(data, warnings)
    }
}

/// Notice on stderr, dropped under `--quiet`.
pub fn print_notice(opts: &GlobalOpts, text: &str) -> Result<()> {
    if !opts.quiet {
        writeln!(std::io::stderr(), "notice: {text}")?;
    }
    Ok(())
}

fn print_json(opts: &GlobalOpts, data: Value, warnings: Vec<String>) -> Result<()> {
    let mut root = Map::new();
    root.insert("data".into(), data);
    if !warnings.is_empty() {
        root.insert(
            "warnings".into(),
            warnings.into_iter().map(Value::String).collect(),
        );
    }
    let root = Value::Object(root);
    if opts.pretty {
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        println!("{}", serde_json::to_string(&root)?);
    }
    Ok(())
}

fn print_human(data: Value, warnings: Vec<String>) -> Result<()> {
    let mut stderr = std::io::stderr();
    for w in warnings {
        writeln!(stderr, "notice: {w}")?;
    }
    print_value(data)
}

fn print_value(value: Value) -> Result<()> {
    match value {
        Value::String(s) => println!("{s}"),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            for item in items {
                if let Value::String(s) = item {
                    println!("{s}");
                }
            }
        }
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}
