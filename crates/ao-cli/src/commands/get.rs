//! `ao get` commands.

use anyhow::Result;
use ao_core::{ConfigPath, ResolvedTargets, Resolver, Snapshot};
use clap::{Args, Subcommand};
use serde_json::{Value, json};

use crate::opts::{GlobalOpts, api_context};
use crate::output::print_success;

use super::Session;

#[derive(Subcommand, Debug)]
pub enum GetCommand {
    /// List file names, optionally narrowed to environments and applications
    Files(FilesArgs),

    /// Print one file with its version token
    File(FileArgs),

    /// List configured clusters
    Clusters(ClustersArgs),
}

#[derive(Args, Debug)]
pub struct FilesArgs {
    /// Environment, application or env/app tokens (fuzzy matched)
    pub tokens: Vec<String>,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    /// <file> | <env>/<file> | <env> <file>
    #[arg(required = true, num_args = 1..=2)]
    pub tokens: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ClustersArgs {
    /// Include unreachable clusters
    #[arg(long)]
    pub all: bool,
}

pub async fn cmd_get(opts: &GlobalOpts, cmd: &GetCommand) -> Result<()> {
    match cmd {
        GetCommand::Files(args) => cmd_files(opts, args).await,
        GetCommand::File(args) => cmd_file(opts, args).await,
        GetCommand::Clusters(args) => cmd_clusters(opts, args),
    }
}

async fn cmd_files(opts: &GlobalOpts, args: &FilesArgs) -> Result<()> {
    let session = Session::connect(opts)?;
    let snapshot = session.snapshot().await?;
    let targets = Resolver::new(&snapshot).resolve_mixed_list(&args.tokens)?;

    let files: Vec<Value> = selected_files(&snapshot, &targets)
        .into_iter()
        .map(|p| Value::String(p.to_string()))
        .collect();
    let mut warnings = Vec::new();
    if files.is_empty() {
        warnings.push(format!("no files in affiliation {}", session.affiliation));
    }
    print_success(opts, Value::Array(files), warnings)
}

/// Files belonging to the resolved targets; everything when no target was given.
///
/// With both environments and applications, a deployment must match both.
fn selected_files<'a>(snapshot: &'a Snapshot, targets: &ResolvedTargets) -> Vec<&'a str> {
    if targets.is_empty() {
        return snapshot.paths().collect();
    }
    let env_hit = |env: &str| targets.envs.iter().any(|e| e == env);
    let app_hit = |app: &str| targets.apps.iter().any(|a| a == app);
    snapshot
        .paths()
        .filter(|path| match ConfigPath::classify(path) {
            ConfigPath::EnvAbout { env } => env_hit(env),
            ConfigPath::AppRoot { app } => app_hit(app),
            ConfigPath::Deployment { env, app } => {
                match (targets.envs.is_empty(), targets.apps.is_empty()) {
                    (false, false) => env_hit(env) && app_hit(app),
                    (false, true) => env_hit(env),
                    _ => app_hit(app),
                }
            }
            ConfigPath::Other => false,
        })
        .collect()
}

async fn cmd_file(opts: &GlobalOpts, args: &FileArgs) -> Result<()> {
    let session = Session::connect(opts)?;
    let snapshot = session.snapshot().await?;
    let path = Resolver::new(&snapshot).require_file(&args.tokens)?;

    let content = snapshot.content(&path).unwrap_or("{}");
    let version = snapshot.version(&path).unwrap_or_default();
    let data = if opts.json_output() {
        let parsed: Value = serde_json::from_str(content)?;
        json!({ "path": path, "version": version, "content": parsed })
    } else {
        Value::String(format!("{path} (version {version})\n{content}"))
    };
    print_success(opts, data, Vec::new())
}

fn cmd_clusters(opts: &GlobalOpts, args: &ClustersArgs) -> Result<()> {
    let ctx = api_context(opts)?;
    let rows: Vec<_> = ctx
        .endpoints
        .iter()
        .filter(|e| args.all || e.reachable)
        .collect();

    let data = if opts.json_output() {
        Value::Array(
            rows.iter()
                .map(|e| {
                    json!({
                        "name": e.name,
                        "url": e.base_url,
                        "reachable": e.reachable,
                        "api": e.api_cluster,
                    })
                })
                .collect(),
        )
    } else {
        let mut lines = vec![format!("{:<16} {:<10} {:<4} URL", "CLUSTER", "REACHABLE", "API")];
        for e in &rows {
            lines.push(format!(
                "{:<16} {:<10} {:<4} {}",
                e.name,
                if e.reachable { "yes" } else { "no" },
                if e.api_cluster { "*" } else { "" },
                e.base_url
            ));
        }
        Value::String(lines.join("\n"))
    };

    let mut warnings = Vec::new();
    if let Some(address) = &ctx.api_address {
        warnings.push(format!("requests go to {address}, cluster urls are ignored"));
    }
    print_success(opts, data, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_core::LegalIdentifiers;

    fn snapshot() -> Snapshot {
        serde_json::from_str(
            r#"{"files":{
                "app1.json":{},"app2.json":{},
                "dev/about.json":{},"dev/app1.json":{},"dev/app2.json":{},
                "test/about.json":{},"test/app1.json":{}
            }}"#,
        )
        .unwrap()
    }

    fn select(tokens: &[&str]) -> Vec<String> {
        let snapshot = snapshot();
        let resolver = Resolver::from_legal(LegalIdentifiers::from_snapshot(&snapshot));
        let targets = resolver.resolve_mixed_list(tokens).unwrap();
        selected_files(&snapshot, &targets)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn no_tokens_lists_everything() {
        assert_eq!(select(&[]).len(), 7);
    }

    #[test]
    fn env_token_selects_its_directory() {
        assert_eq!(select(&["test"]), vec!["test/about.json", "test/app1.json"]);
    }

    #[test]
    fn app_token_selects_root_and_deployments() {
        assert_eq!(select(&["app2"]), vec!["app2.json", "dev/app2.json"]);
    }

    #[test]
    fn env_app_pair_narrows_deployments() {
        assert_eq!(
            select(&["dev/app1"]),
            vec!["app1.json", "dev/about.json", "dev/app1.json"]
        );
    }
}
