//! # guidesync-sync
//!
//! Reconciles a local content tree with the remote help-center store.
//!
//! [`pipeline::run`] is the entrypoint: it walks the tree with
//! [`TreeSync`], resolving each directory's category and section with
//! [`HierarchyResolver`] and publishing (or printing) each document with
//! [`ArticleReconciler`]. Failures never abort a run; they are counted in the
//! returned [`guidesync_core::OutcomeTally`].

pub mod error;
pub mod hierarchy;
pub mod pipeline;
pub mod reconcile;
pub mod sink;
pub mod tree;

pub use error::SyncError;
pub use hierarchy::HierarchyResolver;
pub use pipeline::{run, run_delete_all, RunReport};
pub use reconcile::{ArticleReconciler, Mode, PublishOptions};
pub use sink::{DirectorySink, PrintSink, StdoutSink};
pub use tree::{SyncOptions, TreeSync};
