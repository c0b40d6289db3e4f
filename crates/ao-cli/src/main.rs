mod commands;
mod input;
mod opts;
mod output;
mod prompt;
mod util;

use anyhow::Result;
use ao_core::AoError;
use clap::{Parser, Subcommand};

use commands::delete::DeleteCommand;
use commands::get::GetCommand;
use commands::set::SetCommand;
use opts::GlobalOpts;

#[derive(Parser, Debug)]
#[command(name = "ao", version, about = "AuroraConfig command line client")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read files and cluster settings
    #[command(subcommand)]
    Get(GetCommand),

    /// Update a file
    #[command(subcommand)]
    Set(SetCommand),

    /// Delete files, applications, environments or deployments
    #[command(subcommand)]
    Delete(DeleteCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Ok(cwd) = std::env::current_dir() {
        util::load_env(&cwd)?;
    }
    let cli = Cli::parse();
    let opts = &cli.opts;
    util::setup_logging(opts.verbose);

    let result = match &cli.command {
        Command::Get(cmd) => commands::get::cmd_get(opts, cmd).await,
        Command::Set(cmd) => commands::set::cmd_set(opts, cmd).await,
        Command::Delete(cmd) => commands::delete::cmd_delete(opts, cmd).await,
    };

    match result {
        Err(e) if e.downcast_ref::<AoError>().is_some_and(AoError::is_cancelled) => {
            output::print_notice(opts, &e.to_string())
        }
        other => other,
    }
}
