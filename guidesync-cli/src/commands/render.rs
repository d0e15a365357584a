//! `guidesync render`: render one document locally.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use guidesync_core::{Document, HierarchyContext};
use guidesync_renderer::{DocumentRenderer, TemplateRenderer};
use guidesync_sync::sink::header_block;

use crate::{settings, GlobalArgs};

/// Arguments for `guidesync render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Content file to render.
    pub file: PathBuf,

    /// Directory holding an `article.html.tera` override.
    #[arg(long)]
    pub templates: Option<PathBuf>,
}

impl RenderArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let settings = settings::load(global.config.as_deref())?;
        let document = Document::read(&self.file, &HierarchyContext::new(), &settings.headers)
            .with_context(|| format!("cannot read {}", self.file.display()))?;

        let renderer = TemplateRenderer::new(self.templates.as_deref())
            .context("failed to load article template")?;
        let body = renderer
            .render(&self.file)
            .with_context(|| format!("cannot render {}", self.file.display()))?;

        print!("{}", header_block(&document, ""));
        println!();
        println!("{body}");
        Ok(())
    }
}
