//! # guidesync-renderer
//!
//! The document-rendering capability consumed by the sync engine.
//!
//! [`DocumentRenderer`] is a single-method interface: given a content file,
//! return publishable HTML. [`TemplateRenderer`] is the built-in
//! implementation: it lays plain-text paragraphs, headings, lists and listing
//! blocks into a Tera article template that a user template directory may
//! override.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use guidesync_renderer::{DocumentRenderer, TemplateRenderer};
//!
//! fn print_one(path: &Path) {
//!     if let Ok(renderer) = TemplateRenderer::new(None) {
//!         match renderer.render(path) {
//!             Ok(html) => println!("{html}"),
//!             Err(e) => eprintln!("{e}"),
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{ArticleContext, Block};
pub use engine::{DocumentRenderer, TemplateRenderer};
pub use error::RenderError;
