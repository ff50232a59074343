//! Semi-naive evaluation with per-timestep deltas
//!
//! Round 0 fires every rule once against the full fact sets. After that, a
//! rule with positive body literals `L1..Lk` is evaluated as a union of `k`
//! delta joins: the i-th join forces `Li` to match an atom added in the
//! previous round while the other literals match the full set. Negated
//! literals always check the full set. The run terminates when every
//! timestep's delta is empty.
//!
//! The parallel mode partitions a round into (timestep, rule) tasks on the
//! rayon pool. Fact insertion and provenance recording are already atomic in
//! the store, so tasks only merge their newly-inserted atoms after the round
//! barrier to form the next deltas.

use crate::facts::TimelineStore;
use crate::interval::Timestep;
use crate::reasoner::evaluation::{fire_head, match_body, EvaluationStats, Interpretation};
use crate::reasoner::provenance::ProvenanceStore;
use crate::reasoner::types::{Atom, Rule, TimedFact};
use ahash::AHashSet;
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Delta-driven evaluator, optionally parallel within rounds
pub struct SemiNaiveEvaluator {
    rules: Vec<Rule>,
    base: Vec<TimedFact>,
    parallel: bool,
}

impl SemiNaiveEvaluator {
    /// Create a sequential semi-naive evaluator
    pub fn new(rules: Vec<Rule>, base: Vec<TimedFact>) -> Self {
        SemiNaiveEvaluator {
            rules,
            base,
            parallel: false,
        }
    }

    /// Create a semi-naive evaluator that runs each round's (timestep, rule)
    /// tasks on the rayon pool
    pub fn parallel(rules: Vec<Rule>, base: Vec<TimedFact>) -> Self {
        SemiNaiveEvaluator {
            rules,
            base,
            parallel: true,
        }
    }

    /// Run to the fixed point over `[0, horizon]`
    pub fn evaluate(&self, horizon: Timestep) -> Interpretation {
        let start = Instant::now();
        let store = TimelineStore::new(horizon);
        let provenance = ProvenanceStore::new();
        let mut stats = EvaluationStats::default();

        for fact in &self.base {
            store.add_base(fact);
        }

        // Round 0: every rule against the full sets. Anything inserted here
        // seeds the deltas for the first delta round.
        stats.rounds += 1;
        let tasks = eligible_tasks(&self.rules, horizon, None);
        stats.rule_firings += tasks.len();
        let inserted = if self.parallel {
            run_tasks_parallel(&tasks, &store, &provenance, None)
        } else {
            run_tasks(&tasks, &store, &provenance, None)
        };
        stats.facts_inserted += inserted.len();

        let mut delta = deltas_from(horizon, inserted);
        run_delta_rounds(
            &self.rules,
            &store,
            &provenance,
            horizon,
            &mut delta,
            self.parallel,
            &mut stats,
        );

        stats.evaluation_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        Interpretation::from_parts(horizon, store, provenance, stats)
    }
}

/// Build per-timestep delta sets from newly inserted atoms.
pub(crate) fn deltas_from(
    horizon: Timestep,
    inserted: Vec<(Atom, Timestep)>,
) -> Vec<AHashSet<Atom>> {
    let mut delta: Vec<AHashSet<Atom>> = (0..=horizon).map(|_| AHashSet::new()).collect();
    for (atom, t) in inserted {
        delta[t].insert(atom);
    }
    delta
}

/// Delta rounds until every timestep's delta is empty.
///
/// `delta` holds the atoms added since the last round; the store already
/// contains them. Also used by the incremental reasoner, seeded with newly
/// added base facts.
pub(crate) fn run_delta_rounds(
    rules: &[Rule],
    store: &TimelineStore,
    provenance: &ProvenanceStore,
    horizon: Timestep,
    delta: &mut Vec<AHashSet<Atom>>,
    parallel: bool,
    stats: &mut EvaluationStats,
) {
    while delta.iter().any(|d| !d.is_empty()) {
        stats.rounds += 1;

        let tasks = eligible_tasks(rules, horizon, Some(delta));
        stats.rule_firings += tasks.len();

        let inserted = if parallel {
            run_tasks_parallel(&tasks, store, provenance, Some(delta))
        } else {
            run_tasks(&tasks, store, provenance, Some(delta))
        };
        stats.facts_inserted += inserted.len();

        debug!(
            round = stats.rounds,
            new_facts = inserted.len(),
            "delta round complete"
        );

        *delta = deltas_from(horizon, inserted);
    }
}

/// (timestep, rule) pairs worth evaluating this round.
fn eligible_tasks<'r>(
    rules: &'r [Rule],
    horizon: Timestep,
    delta: Option<&Vec<AHashSet<Atom>>>,
) -> Vec<(Timestep, &'r Rule)> {
    let mut tasks = Vec::new();
    for t in 0..=horizon {
        // In a delta round, only timesteps that received new atoms can
        // produce new matches.
        if let Some(delta) = delta {
            if delta[t].is_empty() {
                continue;
            }
        }
        for rule in rules {
            if !rule.is_active_at(t) {
                continue;
            }
            if t as i64 + rule.delay > horizon as i64 {
                continue;
            }
            tasks.push((t, rule));
        }
    }
    tasks
}

/// Evaluate one (timestep, rule) task and return its newly inserted atoms.
fn run_task(
    t: Timestep,
    rule: &Rule,
    store: &TimelineStore,
    provenance: &ProvenanceStore,
    delta: Option<&Vec<AHashSet<Atom>>>,
) -> Vec<(Atom, Timestep)> {
    let mut inserted = Vec::new();

    match delta {
        None => {
            for sub in match_body(rule, t, store, true, None) {
                inserted.extend(fire_head(rule, &sub, t, store, provenance));
            }
        }
        Some(delta) => {
            // Union of one delta join per positive literal.
            for pos in rule.positive_indices() {
                for sub in match_body(rule, t, store, true, Some((&delta[t], pos))) {
                    inserted.extend(fire_head(rule, &sub, t, store, provenance));
                }
            }
        }
    }

    inserted
}

fn run_tasks(
    tasks: &[(Timestep, &Rule)],
    store: &TimelineStore,
    provenance: &ProvenanceStore,
    delta: Option<&Vec<AHashSet<Atom>>>,
) -> Vec<(Atom, Timestep)> {
    let mut inserted = Vec::new();
    for &(t, rule) in tasks {
        inserted.extend(run_task(t, rule, store, provenance, delta));
    }
    inserted
}

fn run_tasks_parallel(
    tasks: &[(Timestep, &Rule)],
    store: &TimelineStore,
    provenance: &ProvenanceStore,
    delta: Option<&Vec<AHashSet<Atom>>>,
) -> Vec<(Atom, Timestep)> {
    tasks
        .par_iter()
        .map(|&(t, rule)| run_task(t, rule, store, provenance, delta))
        .reduce(Vec::new, |mut acc, mut chunk| {
            acc.append(&mut chunk);
            acc
        })
}
