//! `ao delete` commands.

use anyhow::Result;
use ao_core::snapshot::trim_json_suffix;
use ao_core::{AoError, AoResult, DeletePlanner, DeletionPlan, Resolver, Snapshot, commit_plan};
use clap::{Args, Subcommand};
use serde_json::{Value, json};

use crate::opts::GlobalOpts;
use crate::output::print_success;
use crate::prompt;

use super::{Session, dry_run_warnings};

#[derive(Subcommand, Debug)]
pub enum DeleteCommand {
    /// Delete one file
    File(DeleteFileArgs),

    /// Delete every deployment of an application and its root file
    App(DeleteTargetArgs),

    /// Delete an environment directory
    Env(DeleteTargetArgs),

    /// Delete one application from one environment
    Deployment(DeleteDeploymentArgs),
}

#[derive(Args, Debug)]
pub struct DeleteFileArgs {
    /// <file> | <env>/<file> | <env> <file>
    #[arg(required = true, num_args = 1..=2)]
    pub tokens: Vec<String>,

    /// Delete without asking; missing targets are ignored
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct DeleteTargetArgs {
    /// Name or unique part of a name
    pub token: String,

    /// Delete without asking; an unknown name is ignored
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct DeleteDeploymentArgs {
    /// Environment token
    pub env: String,

    /// Application token
    pub app: String,

    /// Delete without asking; a missing deployment is ignored
    #[arg(long)]
    pub force: bool,
}

pub async fn cmd_delete(opts: &GlobalOpts, cmd: &DeleteCommand) -> Result<()> {
    let session = Session::connect(opts)?;
    let snapshot = session.snapshot().await?;
    let resolver = Resolver::new(&snapshot);

    let plan = match cmd {
        DeleteCommand::File(args) => {
            let path = forced_literal(resolver.require_file(&args.tokens), args.force, || {
                args.tokens.join("/")
            })?;
            collect(&snapshot, args.force, |p| p.plan_delete_file(&path))?
        }
        DeleteCommand::App(args) => {
            let app = forced_literal(resolver.require_app(&args.token), args.force, || {
                trim_json_suffix(&args.token).to_string()
            })?;
            collect(&snapshot, args.force, |p| p.plan_delete_app(&app))?
        }
        DeleteCommand::Env(args) => {
            let env = forced_literal(resolver.require_env(&args.token), args.force, || {
                args.token.clone()
            })?;
            collect(&snapshot, args.force, |p| p.plan_delete_env(&env))?
        }
        DeleteCommand::Deployment(args) => {
            let env = forced_literal(resolver.require_env(&args.env), args.force, || {
                args.env.clone()
            })?;
            let app = forced_literal(resolver.require_app(&args.app), args.force, || {
                trim_json_suffix(&args.app).to_string()
            })?;
            collect(&snapshot, args.force, |p| p.plan_delete_deployment(&env, &app))?
        }
    };

    commit_plan(&session.client, &session.affiliation, &snapshot, &plan).await?;
    report(opts, &plan)
}

/// Under `--force` a token that matches nothing is passed on literally so
/// the planner skips it; ambiguous tokens still fail.
fn forced_literal(
    resolved: AoResult<String>,
    force: bool,
    literal: impl FnOnce() -> String,
) -> AoResult<String> {
    match resolved {
        Err(AoError::NoMatch { .. }) if force => Ok(literal()),
        other => other,
    }
}

type TerminalPrompt = fn(&str) -> AoResult<String>;

/// Run one planning step against a fresh planner and close it.
fn collect<F>(snapshot: &Snapshot, force: bool, step: F) -> Result<DeletionPlan>
where
    F: FnOnce(&mut DeletePlanner<'_, TerminalPrompt>) -> AoResult<()>,
{
    let confirm: TerminalPrompt = prompt::yes_no_cancel;
    let mut planner = DeletePlanner::new(snapshot, confirm).forced(force);
    step(&mut planner)?;
    Ok(planner.finish()?)
}

fn report(opts: &GlobalOpts, plan: &DeletionPlan) -> Result<()> {
    let mut warnings = dry_run_warnings(opts);
    if plan.is_empty() {
        warnings.push("nothing deleted".to_string());
    }
    let data = if opts.json_output() {
        Value::Array(
            plan.entries()
                .iter()
                .map(|e| json!({ "path": e.path, "reason": e.reason }))
                .collect(),
        )
    } else {
        Value::Array(
            plan.paths()
                .map(|p| Value::String(format!("deleted {p}")))
                .collect(),
        )
    };
    print_success(opts, data, warnings)
}
