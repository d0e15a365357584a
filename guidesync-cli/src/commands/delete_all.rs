//! `guidesync delete-all`: remove every article from the remote store.

use anyhow::{bail, Result};
use clap::Args;

use guidesync_sync::{pipeline, Mode};

use crate::settings::{self, RemoteArgs};
use crate::{summary, GlobalArgs};

/// Arguments for `guidesync delete-all`.
#[derive(Args, Debug)]
pub struct DeleteAllArgs {
    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Confirm that every article should be deleted.
    #[arg(long)]
    pub yes: bool,
}

impl DeleteAllArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        if !self.yes {
            bail!("delete-all removes every article in the store; pass --yes to confirm");
        }
        let mut settings = settings::load(global.config.as_deref())?;
        self.remote.apply(&mut settings.remote);
        settings::validate(&settings.remote, true)?;
        settings::log_effective(&settings);

        let client = settings::build_client(&settings.remote, Mode::Publish)?;
        tracing::warn!("deleting every article in the store");
        let report = pipeline::run_delete_all(&client, settings.content.workers);

        summary::print(&report, global.json)
    }
}
