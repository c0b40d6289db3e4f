//! CLI command handlers.

pub mod delete;
pub mod get;
pub mod set;

use anyhow::Result;
use ao_core::{Snapshot, SnapshotClient};

use crate::opts::{GlobalOpts, api_context};

/// Store client plus the affiliation every command is scoped to.
pub struct Session {
    pub client: SnapshotClient,
    pub affiliation: String,
}

impl Session {
    pub fn connect(opts: &GlobalOpts) -> Result<Self> {
        let ctx = api_context(opts)?;
        let affiliation = ctx.affiliation.clone();
        let client = SnapshotClient::from_context(ctx)?;
        Ok(Self {
            client,
            affiliation,
        })
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.client.fetch_snapshot(&self.affiliation).await?)
    }
}

/// Notice appended to mutating commands under `--dry-run`.
pub fn dry_run_warnings(opts: &GlobalOpts) -> Vec<String> {
    if opts.dry_run {
        vec!["dry run: the store validated the change without persisting it".to_string()]
    } else {
        Vec::new()
    }
}
