//! Outcome counting.
//!
//! [`OutcomeTally`] is a plain value: a multiset of [`Outcome`]s whose merge
//! is commutative and associative with the empty tally as identity. Zero
//! counts are never stored, so two tallies compare equal exactly when every
//! kind has the same count.
//!
//! [`OutcomeAggregator`] wraps a tally behind a mutex so concurrent workers
//! can record into one shared sink without losing counts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Every kind of result a sync step can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Published,
    PublishedDraft,
    PublishFailed,
    Removed,
    RemovalFailed,
    SkippedHidden,
    SkippedDirectory,
    Printed,
}

impl Outcome {
    /// All kinds in summary order.
    pub fn all() -> &'static [Outcome] {
        &[
            Outcome::Published,
            Outcome::PublishedDraft,
            Outcome::PublishFailed,
            Outcome::Removed,
            Outcome::RemovalFailed,
            Outcome::SkippedHidden,
            Outcome::SkippedDirectory,
            Outcome::Printed,
        ]
    }

    /// Whether this kind represents a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::PublishFailed | Outcome::RemovalFailed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Published => "published",
            Outcome::PublishedDraft => "published-draft",
            Outcome::PublishFailed => "publish-failed",
            Outcome::Removed => "removed",
            Outcome::RemovalFailed => "removal-failed",
            Outcome::SkippedHidden => "skipped-hidden",
            Outcome::SkippedDirectory => "skipped-directory",
            Outcome::Printed => "printed",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// OutcomeTally
// ---------------------------------------------------------------------------

/// Count per [`Outcome`] kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeTally {
    counts: BTreeMap<Outcome, u64>,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tally holding a single occurrence of `outcome`.
    pub fn of(outcome: Outcome) -> Self {
        let mut tally = Self::new();
        tally.record(outcome);
        tally
    }

    pub fn record(&mut self, outcome: Outcome) {
        self.add(outcome, 1);
    }

    pub fn add(&mut self, outcome: Outcome, n: u64) {
        if n == 0 {
            return;
        }
        *self.counts.entry(outcome).or_insert(0) += n;
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    /// Sum over every kind.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Sum over the failure kinds.
    pub fn failures(&self) -> u64 {
        self.counts
            .iter()
            .filter(|(k, _)| k.is_failure())
            .map(|(_, v)| *v)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &OutcomeTally) {
        for (outcome, n) in &other.counts {
            self.add(*outcome, *n);
        }
    }

    /// Non-zero `(kind, count)` pairs in summary order.
    pub fn iter(&self) -> impl Iterator<Item = (Outcome, u64)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<Outcome> for OutcomeTally {
    fn from_iter<I: IntoIterator<Item = Outcome>>(iter: I) -> Self {
        let mut tally = Self::new();
        for outcome in iter {
            tally.record(outcome);
        }
        tally
    }
}

impl Extend<OutcomeTally> for OutcomeTally {
    fn extend<I: IntoIterator<Item = OutcomeTally>>(&mut self, iter: I) {
        for other in iter {
            self.merge(&other);
        }
    }
}

// ---------------------------------------------------------------------------
// OutcomeAggregator
// ---------------------------------------------------------------------------

/// Shared, lock-protected tally for concurrent branches.
#[derive(Debug, Default)]
pub struct OutcomeAggregator {
    inner: Mutex<OutcomeTally>,
}

impl OutcomeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome) {
        self.lock().record(outcome);
    }

    /// Merge a branch's tally into the shared one.
    pub fn absorb(&self, tally: &OutcomeTally) {
        self.lock().merge(tally);
    }

    pub fn snapshot(&self) -> OutcomeTally {
        self.lock().clone()
    }

    pub fn into_tally(self) -> OutcomeTally {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    // A panicking worker cannot leave a half-applied increment behind, so a
    // poisoned lock still holds consistent counts.
    fn lock(&self) -> std::sync::MutexGuard<'_, OutcomeTally> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
