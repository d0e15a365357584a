//! `guidesync sync`: reconcile a content tree with the remote store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use guidesync_renderer::TemplateRenderer;
use guidesync_sync::{pipeline, DirectorySink, Mode, PrintSink, StdoutSink};

use crate::settings::{self, RemoteArgs};
use crate::{summary, GlobalArgs};

/// Arguments for `guidesync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Root of the content tree.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Read `.properties.<profile>` instead of `.properties`.
    #[arg(long)]
    pub profile: Option<String>,

    /// Remove remote articles that have no local document.
    #[arg(long)]
    pub clean: bool,

    /// Render and print documents instead of publishing them.
    #[arg(long)]
    pub print_only: bool,

    /// With --print-only, write one .html file per document here.
    #[arg(long, requires = "print_only")]
    pub out_dir: Option<PathBuf>,

    /// Overwrite categories and sections even when they look current.
    #[arg(long)]
    pub force_update: bool,

    /// Permission group name for newly created articles.
    #[arg(long)]
    pub permission_group: Option<String>,

    /// Directory holding an `article.html.tera` override.
    #[arg(long)]
    pub templates: Option<PathBuf>,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let mut settings = settings::load(global.config.as_deref())?;
        self.remote.apply(&mut settings.remote);
        if self.force_update {
            settings.publish.force_update = true;
        }
        if let Some(group) = &self.permission_group {
            settings.publish.permission_group = Some(group.clone());
        }

        let mode = if self.print_only {
            Mode::PrintOnly
        } else {
            Mode::Publish
        };
        settings::validate(&settings.remote, mode == Mode::Publish)?;
        settings::log_effective(&settings);

        let client = settings::build_client(&settings.remote, mode)?;
        let renderer = TemplateRenderer::new(self.templates.as_deref())
            .context("failed to load article template")?;
        let sink: Box<dyn PrintSink> = match &self.out_dir {
            Some(out) => Box::new(DirectorySink::new(&self.dir, out)),
            None => Box::new(StdoutSink),
        };
        let options =
            settings::sync_options(&settings, mode, self.clean, self.profile.as_deref());

        tracing::info!("syncing {}", self.dir.display());
        let report = pipeline::run(&client, &renderer, sink.as_ref(), options, &self.dir)
            .with_context(|| format!("sync failed for {}", self.dir.display()))?;

        summary::print(&report, global.json)
    }
}
