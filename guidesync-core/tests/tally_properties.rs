//! Algebraic properties of tally merging: commutative, associative, with the
//! empty tally as identity, and total-preserving.

use guidesync_core::{Outcome, OutcomeAggregator, OutcomeTally};
use rstest::rstest;

/// Small deterministic generator so failures are reproducible by seed.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn tally(&mut self) -> OutcomeTally {
        let mut tally = OutcomeTally::new();
        let kinds = Outcome::all();
        for _ in 0..(self.next() % 12) {
            let kind = kinds[(self.next() as usize) % kinds.len()];
            tally.add(kind, self.next() % 5);
        }
        tally
    }
}

fn merged(a: &OutcomeTally, b: &OutcomeTally) -> OutcomeTally {
    let mut out = a.clone();
    out.merge(b);
    out
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(1_000_003)]
#[case(u64::MAX / 3)]
fn merge_is_commutative_and_preserves_totals(#[case] seed: u64) {
    let mut rng = Lcg(seed);
    for _ in 0..200 {
        let a = rng.tally();
        let b = rng.tally();
        let ab = merged(&a, &b);
        assert_eq!(ab, merged(&b, &a));
        assert_eq!(ab.total(), a.total() + b.total());
        for kind in Outcome::all() {
            assert_eq!(ab.count(*kind), a.count(*kind) + b.count(*kind));
        }
    }
}

#[rstest]
#[case(3)]
#[case(99)]
#[case(123_456_789)]
fn merge_is_associative(#[case] seed: u64) {
    let mut rng = Lcg(seed);
    for _ in 0..200 {
        let (a, b, c) = (rng.tally(), rng.tally(), rng.tally());
        assert_eq!(merged(&merged(&a, &b), &c), merged(&a, &merged(&b, &c)));
    }
}

#[rstest]
#[case(5)]
#[case(77)]
fn empty_tally_is_identity(#[case] seed: u64) {
    let mut rng = Lcg(seed);
    let zero = OutcomeTally::new();
    for _ in 0..100 {
        let a = rng.tally();
        assert_eq!(merged(&a, &zero), a);
        assert_eq!(merged(&zero, &a), a);
    }
}

#[test]
fn aggregator_order_does_not_matter() {
    let mut rng = Lcg(2024);
    let parts: Vec<OutcomeTally> = (0..50).map(|_| rng.tally()).collect();

    let forward = OutcomeAggregator::new();
    parts.iter().for_each(|t| forward.absorb(t));

    let backward = OutcomeAggregator::new();
    parts.iter().rev().for_each(|t| backward.absorb(t));

    let mut folded = OutcomeTally::new();
    folded.extend(parts.iter().cloned());

    assert_eq!(forward.snapshot(), backward.into_tally());
    assert_eq!(forward.into_tally(), folded);
}
