//! Recursive directory walk.
//!
//! Per directory: resolve the hierarchy from the directive file, reconcile
//! the content files in parallel, remove stale articles when cleaning, then
//! recurse into subdirectories in parallel. Every directory gathers its own
//! [`OutcomeAggregator`] and hands the resulting tally to its parent.
//! All levels draw helper threads from one [`WorkerBudget`], so a walk
//! never has more than `workers` threads busy at once.
//!
//! Symlinked directories are not followed.
//!
//! Children receive a clone of the context as resolved for their parent
//! directory; file processing never mutates it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use guidesync_client::{ContentApi, ResilientClient, RetryPolicy};
use guidesync_core::directives::{read_directives, DirectiveKeys};
use guidesync_core::document::is_content_file;
use guidesync_core::{
    Document, HeaderKeys, HierarchyContext, LocalDirectiveSet, Outcome, OutcomeAggregator,
    OutcomeTally,
};
use guidesync_renderer::DocumentRenderer;

use crate::hierarchy::HierarchyResolver;
use crate::reconcile::{ArticleReconciler, Mode, PublishOptions};
use crate::sink::PrintSink;

/// Everything that shapes a walk apart from its collaborators.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub mode: Mode,
    /// Remove remote articles with no local counterpart.
    pub clean: bool,
    pub force_update: bool,
    /// Upper bound on threads working at once across the whole walk.
    pub workers: usize,
    pub extensions: Vec<String>,
    pub directive_file: String,
    pub directive_keys: DirectiveKeys,
    pub header_keys: HeaderKeys,
    pub publish: PublishOptions,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Publish,
            clean: false,
            force_update: false,
            workers: 4,
            extensions: vec!["adoc".into(), "asciidoc".into()],
            directive_file: ".properties".into(),
            directive_keys: DirectiveKeys::default(),
            header_keys: HeaderKeys::default(),
            publish: PublishOptions::default(),
        }
    }
}

/// Walks a content tree and reconciles it with the remote store.
pub struct TreeSync<'c, A: ContentApi, P: RetryPolicy> {
    client: &'c ResilientClient<A, P>,
    renderer: &'c dyn DocumentRenderer,
    resolver: HierarchyResolver<'c, A, P>,
    reconciler: ArticleReconciler<'c, A, P>,
    budget: WorkerBudget,
    options: SyncOptions,
}

impl<'c, A: ContentApi, P: RetryPolicy> TreeSync<'c, A, P> {
    pub fn new(
        client: &'c ResilientClient<A, P>,
        renderer: &'c dyn DocumentRenderer,
        sink: &'c dyn PrintSink,
        options: SyncOptions,
    ) -> Self {
        let offline = options.mode == Mode::PrintOnly;
        Self {
            client,
            renderer,
            resolver: HierarchyResolver::new(client, options.force_update).offline(offline),
            reconciler: ArticleReconciler::new(client, sink, options.mode, options.publish.clone()),
            budget: WorkerBudget::new(options.workers),
            options,
        }
    }

    /// Walk `root` with an empty hierarchy and return the whole tree's tally.
    pub fn run(&self, root: &Path) -> OutcomeTally {
        self.process_dir(root, HierarchyContext::new())
    }

    fn process_dir(&self, dir: &Path, inherited: HierarchyContext) -> OutcomeTally {
        tracing::info!("> start directory processing: '{}'", dir.display());
        let totals = OutcomeAggregator::new();

        let (files, subdirs) = match list_entries(dir, &self.options.extensions) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("error listing {}: {e}", dir.display());
                totals.record(Outcome::PublishFailed);
                return totals.into_tally();
            }
        };

        let mut ctx = inherited.clone();
        let children_ctx = if self.resolve_directory(dir, &mut ctx) {
            fan_out(&files, &self.budget, |file| {
                totals.record(self.process_file(file, &ctx));
            });
            if self.options.clean {
                totals.absorb(&self.remove_stale(&files, &ctx));
            }
            ctx
        } else {
            tracing::warn!("could not load hierarchy for {}; skipping its files", dir.display());
            totals.record(Outcome::SkippedDirectory);
            inherited
        };

        fan_out(&subdirs, &self.budget, |sub| {
            totals.absorb(&self.process_dir(sub, children_ctx.clone()));
        });

        totals.into_tally()
    }

    fn resolve_directory(&self, dir: &Path, ctx: &mut HierarchyContext) -> bool {
        let map = read_directives(dir, &self.options.directive_file);
        match LocalDirectiveSet::from_map(&map, &self.options.directive_keys) {
            Ok(directives) => self.resolver.resolve(ctx, &directives),
            Err(e) => {
                tracing::warn!("invalid directives in {}: {e}", dir.display());
                false
            }
        }
    }

    fn process_file(&self, path: &Path, dir_ctx: &HierarchyContext) -> Outcome {
        tracing::info!(">> start file processing: '{}'", path.display());
        let mut ctx = dir_ctx.clone();
        if !ctx.is_complete()
            && !self.resolver.resolve_for_file(
                &mut ctx,
                path,
                &self.options.directive_file,
                &self.options.directive_keys,
            )
        {
            tracing::warn!("no section resolved for {}", path.display());
            return Outcome::SkippedDirectory;
        }
        let Some(section) = ctx.section().cloned() else {
            return Outcome::SkippedDirectory;
        };

        let document = match Document::read(path, &ctx, &self.options.header_keys) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("error reading document: {e}");
                return Outcome::PublishFailed;
            }
        };
        if document.hidden {
            tracing::info!("skipping hidden document '{}'", document.title);
            return Outcome::SkippedHidden;
        }
        let body = match self.renderer.render(path) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("error converting file {}: {e}", path.display());
                return Outcome::PublishFailed;
            }
        };
        self.reconciler
            .reconcile(&document.with_rendered_body(body), &section)
    }

    /// Delete every remote article of the resolved section whose title is
    /// not declared by a visible local document in `files`.
    fn remove_stale(&self, files: &[PathBuf], ctx: &HierarchyContext) -> OutcomeTally {
        let mut tally = OutcomeTally::new();
        if self.reconciler.mode() == Mode::PrintOnly {
            tracing::debug!("print-only mode; not removing stale articles");
            return tally;
        }
        let Some(section) = ctx.section() else {
            return tally;
        };
        let Some(remote) = self.client.list_articles(section.id) else {
            tracing::warn!("could not list articles of section '{}'", section.name);
            tally.record(Outcome::RemovalFailed);
            return tally;
        };

        let local: HashSet<String> = files
            .iter()
            .filter_map(|f| Document::read(f, ctx, &self.options.header_keys).ok())
            .filter(|d| !d.hidden)
            .map(|d| d.title)
            .collect();

        for article in remote.iter().filter(|a| !local.contains(&a.title)) {
            let Some(id) = article.id else { continue };
            tracing::info!("removing stale article '{}' #({id})", article.title);
            tally.record(if self.client.delete_article(id) {
                Outcome::Removed
            } else {
                Outcome::RemovalFailed
            });
        }
        tally
    }
}

/// Content files and subdirectories of `dir`, each sorted by path.
/// Directory symlinks are left out so a link back to an ancestor cannot
/// send the walk round in circles.
fn list_entries(
    dir: &Path,
    extensions: &[String],
) -> std::io::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            dirs.push(path);
        } else if file_type.is_symlink() && path.is_dir() {
            tracing::debug!("not following directory symlink {}", path.display());
        } else if path.is_file() && is_content_file(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

/// Helper-thread slots shared by every [`fan_out`] of one walk.
///
/// The calling thread always takes part in its own fan-out, so a budget
/// built for `workers` hands out `workers - 1` extra threads in total.
#[derive(Debug)]
pub(crate) struct WorkerBudget {
    spare: AtomicUsize,
}

impl WorkerBudget {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            spare: AtomicUsize::new(workers.saturating_sub(1)),
        }
    }

    /// Take up to `want` slots; returns how many were granted.
    fn acquire(&self, want: usize) -> usize {
        let mut current = self.spare.load(Ordering::Acquire);
        loop {
            let take = current.min(want);
            if take == 0 {
                return 0;
            }
            match self.spare.compare_exchange_weak(
                current,
                current - take,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return take,
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self, slots: usize) {
        self.spare.fetch_add(slots, Ordering::AcqRel);
    }
}

/// Run `task` over `items` in no particular order, on the calling thread
/// plus as many helper threads as `budget` can spare. Nothing is spawned
/// once the budget is exhausted.
pub(crate) fn fan_out<T: Sync>(items: &[T], budget: &WorkerBudget, task: impl Fn(&T) + Sync) {
    let helpers = budget.acquire(items.len().saturating_sub(1));
    if helpers == 0 {
        items.iter().for_each(&task);
        return;
    }
    let next = AtomicUsize::new(0);
    let drain = || {
        while let Some(item) = items.get(next.fetch_add(1, Ordering::Relaxed)) {
            task(item);
        }
    };
    std::thread::scope(|s| {
        for _ in 0..helpers {
            s.spawn(|| {
                drain();
                budget.release(1);
            });
        }
        drain();
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    #[test]
    fn fan_out_visits_every_item_once() {
        let items: Vec<u32> = (0..100).collect();
        let budget = WorkerBudget::new(8);
        let seen = Mutex::new(Vec::new());
        fan_out(&items, &budget, |i| seen.lock().unwrap().push(*i));
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, items);
        assert_eq!(budget.spare.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn fan_out_handles_empty_and_zero_workers() {
        let empty: Vec<u32> = vec![];
        fan_out(&empty, &WorkerBudget::new(4), |_| panic!("no items"));
        let seen = Mutex::new(0);
        fan_out(&[1, 2, 3], &WorkerBudget::new(0), |_| *seen.lock().unwrap() += 1);
        assert_eq!(*seen.lock().unwrap(), 3);
    }

    #[test]
    fn nested_fan_out_shares_one_thread_budget() {
        let budget = WorkerBudget::new(3);
        let outer: Vec<u32> = (0..4).collect();
        let inner: Vec<u32> = (0..4).collect();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let visits = AtomicUsize::new(0);

        fan_out(&outer, &budget, |_| {
            fan_out(&inner, &budget, |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(5));
                active.fetch_sub(1, Ordering::SeqCst);
                visits.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(visits.load(Ordering::SeqCst), 16);
        assert!(peak.load(Ordering::SeqCst) <= 3, "peak {}", peak.load(Ordering::SeqCst));
        assert_eq!(budget.spare.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn budget_grants_at_most_what_is_spare() {
        let budget = WorkerBudget::new(4);
        assert_eq!(budget.acquire(2), 2);
        assert_eq!(budget.acquire(5), 1);
        assert_eq!(budget.acquire(1), 0);
        budget.release(3);
        assert_eq!(budget.acquire(10), 3);
    }

    #[test]
    fn lists_only_content_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.adoc"), "").unwrap();
        std::fs::write(dir.path().join("a.ASCIIDOC"), "").unwrap();
        std::fs::write(dir.path().join(".properties"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let (files, dirs) = list_entries(dir.path(), &["adoc".into(), "asciidoc".into()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ASCIIDOC", "b.adoc"]);
        assert_eq!(dirs, vec![dir.path().join("sub")]);
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlinks_are_not_listed() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::fs::write(dir.path().join("real/A.adoc"), "").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real/A.adoc"), dir.path().join("B.adoc"))
            .unwrap();

        let (files, dirs) = list_entries(dir.path(), &["adoc".into()]).unwrap();
        assert_eq!(dirs, vec![dir.path().join("real")]);
        assert_eq!(files, vec![dir.path().join("B.adoc")]);
    }
}
