//! `ao set file` command.

use anyhow::{Context, Result};
use ao_core::{ConfigPath, Resolver, Snapshot};
use clap::{Args, Subcommand};
use serde_json::{Value, json};

use crate::input::parse_input_value;
use crate::opts::GlobalOpts;
use crate::output::print_success;

use super::{Session, dry_run_warnings};

#[derive(Subcommand, Debug)]
pub enum SetCommand {
    /// Replace the content of one file
    File(SetFileArgs),
}

#[derive(Args, Debug)]
pub struct SetFileArgs {
    /// File tokens followed by the content (JSON literal, @file, or @- for stdin)
    #[arg(value_name = "TOKENS... VALUE", required = true, num_args = 2..=3)]
    pub args: Vec<String>,
}

pub async fn cmd_set(opts: &GlobalOpts, cmd: &SetCommand) -> Result<()> {
    match cmd {
        SetCommand::File(args) => cmd_set_file(opts, args).await,
    }
}

async fn cmd_set_file(opts: &GlobalOpts, args: &SetFileArgs) -> Result<()> {
    let Some((value, tokens)) = args.args.split_last() else {
        anyhow::bail!("expected file tokens and a value");
    };
    let content = parse_input_value(value)?;
    serde_json::from_str::<Value>(&content).context("file content is not valid JSON")?;

    let session = Session::connect(opts)?;
    let snapshot = session.snapshot().await?;
    let path = target_path(&snapshot, tokens)?;
    let version = snapshot.version(&path).unwrap_or_default();
    let created = !snapshot.contains(&path);

    session
        .client
        .write_file(&session.affiliation, &path, &content, version)
        .await?;

    let data = if opts.json_output() {
        json!({ "path": path, "created": created })
    } else if created {
        Value::String(format!("created {path}"))
    } else {
        Value::String(format!("updated {path}"))
    };
    print_success(opts, data, dry_run_warnings(opts))
}

/// An exact `<app>.json` / `<env>/<app>.json` path is taken literally, so
/// it either updates that very file or creates it. Anything else is
/// resolved fuzzily against the existing files.
fn target_path(snapshot: &Snapshot, tokens: &[String]) -> Result<String> {
    if let Some(path) = exact_path(tokens) {
        return Ok(path);
    }
    Ok(Resolver::new(snapshot).require_file(tokens)?)
}

fn exact_path(tokens: &[String]) -> Option<String> {
    let path = tokens.join("/");
    if !path.ends_with(".json") {
        return None;
    }
    match ConfigPath::classify(&path) {
        ConfigPath::Other => None,
        _ => Some(path),
    }
}
