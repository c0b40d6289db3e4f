//! Global CLI options and API context resolution.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use ao_core::config::LOCALHOST_ADDRESS;
use ao_core::{ApiContext, ClusterConfig, EndpointSet};
use clap::Args;

const DEFAULT_CONFIG_FILE: &str = ".ao.json";

/// Global options for CLI commands.
///
/// These options apply to all commands and can be set via env vars.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Cluster configuration file (env: AO_CONFIG, default: $HOME/.ao.json)
    #[arg(long, global = true, env = "AO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Affiliation to operate on (env: AO_AFFILIATION, default: from config)
    #[arg(short = 'a', long, global = true, env = "AO_AFFILIATION")]
    pub affiliation: Option<String>,

    /// Send every request to this address instead of the cluster endpoints (env: AO_API_ADDRESS)
    #[arg(long, global = true, env = "AO_API_ADDRESS")]
    pub api_address: Option<String>,

    /// Shorthand for --api-address http://localhost:8080
    #[arg(long, global = true, conflicts_with = "api_address")]
    pub localhost: bool,

    /// Connect timeout per endpoint in milliseconds (env: AO_CONNECT_TIMEOUT_MS)
    #[arg(long, global = true, env = "AO_CONNECT_TIMEOUT_MS", default_value_t = 1000)]
    pub connect_timeout_ms: u64,

    /// Overall request timeout in milliseconds (env: AO_TIMEOUT_MS)
    #[arg(long, global = true, env = "AO_TIMEOUT_MS", default_value_t = 30000)]
    pub timeout_ms: u64,

    /// Ask the store to validate without persisting
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// JSON output envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Suppress notices
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

impl GlobalOpts {
    pub fn json_output(&self) -> bool {
        self.json || self.pretty
    }

    fn api_address(&self) -> Option<String> {
        if self.localhost {
            Some(LOCALHOST_ADDRESS.to_string())
        } else {
            self.api_address.clone()
        }
    }
}

/// Resolve the config file path.
///
/// Priority:
/// 1. `--config` flag
/// 2. `AO_CONFIG` env var (handled by Clap)
/// 3. `$HOME/.ao.json`
pub fn config_path(opts: &GlobalOpts) -> Result<PathBuf> {
    if let Some(path) = &opts.config {
        return Ok(path.clone());
    }
    let home = std::env::var_os("HOME")
        .context("HOME is not set; pass --config <FILE> or set AO_CONFIG")?;
    Ok(PathBuf::from(home).join(DEFAULT_CONFIG_FILE))
}

/// Build the API context for one command from flags and the cluster config.
///
/// With an explicit API address a missing config file is tolerated; the
/// request then goes out without a token.
pub fn api_context(opts: &GlobalOpts) -> Result<ApiContext> {
    let path = config_path(opts)?;
    let api_address = opts.api_address();

    let config = if !path.exists() && api_address.is_some() {
        ClusterConfig::default()
    } else {
        ClusterConfig::load(&path)?
    };
    let endpoints = if config.clusters.is_empty() {
        EndpointSet::default()
    } else {
        config.endpoint_set()?
    };

    let affiliation = opts
        .affiliation
        .clone()
        .or_else(|| config.affiliation.clone())
        .with_context(|| {
            format!(
                "no affiliation; pass --affiliation or set it in {}",
                path.display()
            )
        })?;

    Ok(ApiContext::new(affiliation, endpoints)
        .with_api_address(api_address)
        .with_dry_run(opts.dry_run)
        .with_timeouts(
            Duration::from_millis(opts.connect_timeout_ms),
            Duration::from_millis(opts.timeout_ms),
        ))
}
