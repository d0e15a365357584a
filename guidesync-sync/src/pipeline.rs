//! Run entrypoints used by the CLI: [`run`] for a content tree and
//! [`run_delete_all`] for wiping the store.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use guidesync_client::{ContentApi, ResilientClient, RetryPolicy};
use guidesync_core::{Outcome, OutcomeAggregator, OutcomeTally};
use guidesync_renderer::DocumentRenderer;

use crate::error::SyncError;
use crate::sink::PrintSink;
use crate::tree::{fan_out, SyncOptions, TreeSync, WorkerBudget};

/// Final tally of a run with its wall-clock bounds.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tally: OutcomeTally,
}

impl RunReport {
    /// Elapsed time as `HH:MM:SS`.
    pub fn elapsed_hms(&self) -> String {
        let secs = (self.finished_at - self.started_at).num_seconds().max(0);
        format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
    }

    fn timed(work: impl FnOnce() -> OutcomeTally) -> Self {
        let started_at = Utc::now();
        let tally = work();
        Self {
            started_at,
            finished_at: Utc::now(),
            tally,
        }
    }
}

/// Reconcile the content tree under `root`.
///
/// Only a missing content root is an error; everything that goes wrong
/// during the walk ends up in the tally.
pub fn run<A: ContentApi, P: RetryPolicy>(
    client: &ResilientClient<A, P>,
    renderer: &dyn DocumentRenderer,
    sink: &dyn PrintSink,
    options: SyncOptions,
    root: &Path,
) -> Result<RunReport, SyncError> {
    ensure_dir(root)?;
    let walk = TreeSync::new(client, renderer, sink, options);
    Ok(RunReport::timed(|| walk.run(root)))
}

/// Delete every article in the remote store.
pub fn run_delete_all<A: ContentApi, P: RetryPolicy>(
    client: &ResilientClient<A, P>,
    workers: usize,
) -> RunReport {
    RunReport::timed(|| delete_all(client, workers))
}

fn ensure_dir(root: &Path) -> Result<(), SyncError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(SyncError::RootNotFound {
            path: root.to_path_buf(),
        })
    }
}

/// Delete every article in the store. A failed listing counts as one
/// removal failure.
pub fn delete_all<A: ContentApi, P: RetryPolicy>(
    client: &ResilientClient<A, P>,
    workers: usize,
) -> OutcomeTally {
    let Some(articles) = client.list_all_articles() else {
        tracing::warn!("could not list articles; nothing deleted");
        return OutcomeTally::of(Outcome::RemovalFailed);
    };
    tracing::info!("deleting {} articles", articles.len());
    let totals = OutcomeAggregator::new();
    fan_out(&articles, &WorkerBudget::new(workers), |article| {
        let Some(id) = article.id else { return };
        tracing::info!("removing article '{}' #({id})", article.title);
        totals.record(if client.delete_article(id) {
            Outcome::Removed
        } else {
            Outcome::RemovalFailed
        });
    });
    totals.into_tally()
}
