//! guidesync core library: domain types, local metadata readers, outcome
//! tallies, settings.
//!
//! - [`types`]: remote entities, ids and the per-branch [`HierarchyContext`]
//! - [`directives`]: per-directory `.properties` directive files
//! - [`document`]: content-file header parsing into [`Document`]
//! - [`outcome`]: [`OutcomeTally`] and the thread-safe [`OutcomeAggregator`]
//! - [`config`]: YAML [`Settings`] load / defaults
//! - [`error`]: [`CoreError`]

pub mod config;
pub mod directives;
pub mod document;
pub mod error;
pub mod outcome;
pub mod types;

pub use config::Settings;
pub use directives::{DirectiveKeys, LocalDirectiveSet};
pub use document::{Document, HeaderKeys};
pub use error::CoreError;
pub use outcome::{Outcome, OutcomeAggregator, OutcomeTally};
pub use types::{
    names_match, Article, ArticleId, Category, CategoryDraft, CategoryId, GroupId,
    HierarchyContext, PermissionGroup, Section, SectionDraft, SectionId, Translation,
};
