//! [`DocumentRenderer`] capability and the Tera-backed [`TemplateRenderer`].

use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::ArticleContext;
use crate::error::{io_err, RenderError};

/// Name of the template every article is rendered with.
pub const ARTICLE_TEMPLATE: &str = "article.html.tera";

const DEFAULT_ARTICLE: &str = include_str!("templates/article.html.tera");

// ---------------------------------------------------------------------------
// DocumentRenderer
// ---------------------------------------------------------------------------

/// Turns a content file into publishable markup.
///
/// Implementations may be slow; callers treat every error as "this document
/// cannot be processed" and move on.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, path: &Path) -> Result<String, RenderError>;
}

impl<F> DocumentRenderer for F
where
    F: Fn(&Path) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, path: &Path) -> Result<String, RenderError> {
        self(path)
    }
}

/// The article template from `override_dir` when it holds one, otherwise
/// the embedded default.
fn article_template(override_dir: Option<&Path>) -> Result<String, RenderError> {
    let custom = override_dir
        .map(|dir| dir.join(ARTICLE_TEMPLATE))
        .filter(|path| path.is_file());
    match custom {
        Some(path) => {
            tracing::debug!("using article template {}", path.display());
            std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))
        }
        None => Ok(DEFAULT_ARTICLE.to_owned()),
    }
}

// ---------------------------------------------------------------------------
// TemplateRenderer
// ---------------------------------------------------------------------------

/// Tera-based renderer with optional user overrides.
///
/// `user_template_dir` may contain an `article.html.tera` that replaces the
/// embedded default.
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(ARTICLE_TEMPLATE, &article_template(user_template_dir)?)?;
        Ok(TemplateRenderer { tera })
    }

    /// Render already-loaded source text. `origin` is only used for errors.
    pub fn render_source(&self, origin: &Path, source: &str) -> Result<String, RenderError> {
        let ctx = ArticleContext::from_source(source);
        let rendered = self
            .tera
            .render(ARTICLE_TEMPLATE, &ctx.to_tera_context()?)?
            .replace("\r\n", "\n");
        let body = rendered.trim();
        if body.is_empty() {
            return Err(RenderError::Empty {
                path: PathBuf::from(origin),
            });
        }
        Ok(body.to_owned())
    }
}

impl DocumentRenderer for TemplateRenderer {
    fn render(&self, path: &Path) -> Result<String, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        self.render_source(path, &source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> Result<String, RenderError> {
        TemplateRenderer::new(None)
            .unwrap()
            .render_source(Path::new("t.adoc"), source)
    }

    #[test]
    fn paragraphs_are_escaped() {
        let html = render("// title: T\n= T\n\na < b & c\n").unwrap();
        assert_eq!(html, "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn headings_lists_and_listings() {
        let html = render("== Intro\n* x\n* y\n\n----\nfn main() {}\n----\n").unwrap();
        assert!(html.contains("<h2>Intro</h2>"));
        assert!(html.contains("<li>x</li>"));
        assert!(html.contains("<pre><code>fn main() {}</code></pre>"));
        assert!(!html.contains('\r'));
    }

    #[test]
    fn header_only_document_is_empty() {
        let err = render("// title: T\n= T\n").unwrap_err();
        assert!(matches!(err, RenderError::Empty { .. }));
    }

    #[test]
    fn unrelated_templates_in_override_dir_are_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("page.html.tera"), "{{ broken").unwrap();
        let renderer = TemplateRenderer::new(Some(dir.path())).unwrap();
        let html = renderer
            .render_source(Path::new("t.adoc"), "plain words\n")
            .unwrap();
        assert_eq!(html, "<p>plain words</p>");
    }

    #[test]
    fn malformed_override_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(ARTICLE_TEMPLATE), "{% if %}").unwrap();
        assert!(TemplateRenderer::new(Some(dir.path())).is_err());
    }

    #[test]
    fn closures_are_renderers() {
        let r = |p: &Path| -> Result<String, RenderError> { Ok(p.display().to_string()) };
        assert_eq!(r.render(Path::new("a.adoc")).unwrap(), "a.adoc");
    }
}
