//! Temporal forward chaining to a fixed point
//!
//! The naive engine repeats full rounds over every timestep and rule until no
//! new fact is added. The indexed variant narrows body matching to atoms of
//! the literal's predicate; the result is identical, only performance
//! differs.
//!
//! Negation-as-failure is evaluated against the live fact set at the same
//! time `t` as the positive body literals. No stratification is required or
//! checked: a rule may both depend on `not p` and (transitively) derive `p`.
//! It fires while `not p` is observed and stops once `p` is present, and
//! facts derived that way are kept (inflationary semantics).

use crate::facts::TimelineStore;
use crate::interval::Timestep;
use crate::reasoner::provenance::{DerivationInfo, DerivationTree, ProvenanceStore};
use crate::reasoner::types::{Atom, Rule, Substitution, TimedFact};
use crate::reasoner::unification::unify;
use ahash::AHashSet;
use std::time::Instant;
use tracing::debug;

/// Counters describing one reasoning run
#[derive(Debug, Clone, Default)]
pub struct EvaluationStats {
    /// Rounds until the fixed point
    pub rounds: usize,
    /// Rule-at-timestep evaluations
    pub rule_firings: usize,
    /// Derived atoms newly inserted
    pub facts_inserted: usize,
    /// Wall time of the run
    pub evaluation_time_ms: f64,
}

/// The result of a reasoning run: facts per timestep plus provenance.
///
/// The fact sets are frozen once the fixed-point loop terminates; an
/// interpretation only offers read access.
pub struct Interpretation {
    horizon: Timestep,
    store: TimelineStore,
    provenance: ProvenanceStore,
    /// Counters from the run that produced this interpretation
    pub stats: EvaluationStats,
}

impl Interpretation {
    pub(crate) fn from_parts(
        horizon: Timestep,
        store: TimelineStore,
        provenance: ProvenanceStore,
        stats: EvaluationStats,
    ) -> Self {
        Interpretation {
            horizon,
            store,
            provenance,
            stats,
        }
    }

    pub(crate) fn into_parts(self) -> (TimelineStore, ProvenanceStore, EvaluationStats) {
        (self.store, self.provenance, self.stats)
    }

    /// The horizon `T` of the run
    pub fn horizon(&self) -> Timestep {
        self.horizon
    }

    /// Snapshot of the atoms true at `t`
    pub fn facts_at(&self, t: Timestep) -> Vec<Atom> {
        self.store.at(t)
    }

    /// Whether `atom` holds at `t`
    pub fn holds_at(&self, atom: &Atom, t: Timestep) -> bool {
        self.store.contains(atom, t)
    }

    /// Total number of facts across all timesteps
    pub fn fact_count(&self) -> usize {
        self.store.total()
    }

    /// Whether `(atom, t)` was derived by a rule (base facts have no record)
    pub fn is_derived(&self, atom: &Atom, t: Timestep) -> bool {
        self.provenance.is_derived(atom, t)
    }

    /// One-step textual explanation of a derived fact
    pub fn explain(&self, atom: &Atom, t: Timestep) -> Option<String> {
        self.provenance.explain(atom, t)
    }

    /// Recursive derivation tree with cycle cutting
    pub fn derivation_tree(&self, atom: &Atom, t: Timestep) -> DerivationTree {
        self.provenance.derivation_tree(atom, t)
    }

    /// The underlying provenance store
    pub fn provenance(&self) -> &ProvenanceStore {
        &self.provenance
    }
}

/// Candidate selection for one body literal at time `t`.
fn candidates(
    store: &TimelineStore,
    t: Timestep,
    predicate: &str,
    indexed: bool,
) -> Vec<Atom> {
    if indexed {
        store.with_predicate(t, predicate)
    } else {
        store.at(t)
    }
}

/// All substitutions grounding every body literal of `rule` at time `t`.
///
/// Positive literals must match an atom in the store (or, for the literal at
/// `delta_pos`, in the delta set); negated literals must have no match in the
/// store under the current partial substitution.
pub(crate) fn match_body(
    rule: &Rule,
    t: Timestep,
    store: &TimelineStore,
    indexed: bool,
    delta: Option<(&AHashSet<Atom>, usize)>,
) -> Vec<Substitution> {
    let mut subs = vec![Substitution::new()];

    for (idx, literal) in rule.body.iter().enumerate() {
        let mut next = Vec::new();

        if literal.negated {
            let pool = candidates(store, t, &literal.atom.predicate, indexed);
            for sub in &subs {
                let pattern = literal.atom.apply(sub);
                let blocked = pool.iter().any(|atom| unify(&pattern, atom, sub).is_some());
                if !blocked {
                    next.push(sub.clone());
                }
            }
        } else {
            let pool: Vec<Atom> = match delta {
                Some((delta_set, pos)) if pos == idx => delta_set.iter().cloned().collect(),
                _ => candidates(store, t, &literal.atom.predicate, indexed),
            };

            for sub in &subs {
                let pattern = literal.atom.apply(sub);
                for atom in &pool {
                    if let Some(extended) = unify(&pattern, atom, sub) {
                        next.push(extended);
                    }
                }
            }
        }

        subs = next;
        if subs.is_empty() {
            break;
        }
    }

    subs
}

/// Ground the head under `sub` and add it at every offset timestep inside the
/// horizon. Returns the `(atom, timestep)` pairs that were newly inserted;
/// provenance is recorded for every valid firing.
pub(crate) fn fire_head(
    rule: &Rule,
    sub: &Substitution,
    t: Timestep,
    store: &TimelineStore,
    provenance: &ProvenanceStore,
) -> Vec<(Atom, Timestep)> {
    let head = rule.head.apply(sub);
    if !head.is_ground() {
        // Unsafe rule whose head variables stayed unbound: silent no-fire.
        return Vec::new();
    }

    let sources: Vec<(Atom, Timestep)> = rule
        .body
        .iter()
        .filter(|l| !l.negated)
        .map(|l| (l.atom.apply(sub), t))
        .collect();

    let horizon = store.horizon() as i64;
    let base_time = t as i64 + rule.delay;
    let mut inserted = Vec::new();

    for k in rule.head_offset.start..=rule.head_offset.end {
        let tt = base_time + k;
        if tt < 0 || tt > horizon {
            continue;
        }
        let tt = tt as Timestep;

        let fresh = store.insert(head.clone(), tt);
        // Base facts stay base even when a rule re-derives them.
        if !store.is_base(&head, tt) {
            provenance.record(
                head.clone(),
                tt,
                DerivationInfo {
                    rule: rule.name.clone(),
                    sources: sources.clone(),
                    substitution: sub.clone(),
                },
            );
        }
        if fresh {
            inserted.push((head.clone(), tt));
        }
    }

    inserted
}

/// Forward-chaining evaluator, full rounds until the fixed point
pub struct Evaluator {
    rules: Vec<Rule>,
    base: Vec<TimedFact>,
    indexed: bool,
}

impl Evaluator {
    /// Create a naive evaluator (full scans at each timestep)
    pub fn new(rules: Vec<Rule>, base: Vec<TimedFact>) -> Self {
        Evaluator {
            rules,
            base,
            indexed: false,
        }
    }

    /// Create an evaluator that matches through the predicate index
    pub fn indexed(rules: Vec<Rule>, base: Vec<TimedFact>) -> Self {
        Evaluator {
            rules,
            base,
            indexed: true,
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

        let mut changed = true;
        while changed {
            changed = false;
            stats.rounds += 1;

            for t in 0..=horizon {
                for rule in &self.rules {
                    if !rule.is_active_at(t) {
                        continue;
                    }
                    if t as i64 + rule.delay > horizon as i64 {
                        continue;
                    }

                    stats.rule_firings += 1;
                    for sub in match_body(rule, t, &store, self.indexed, None) {
                        let inserted = fire_head(rule, &sub, t, &store, &provenance);
                        if !inserted.is_empty() {
                            stats.facts_inserted += inserted.len();
                            changed = true;
                        }
                    }
                }
            }

            debug!(
                round = stats.rounds,
                facts = store.total(),
                "forward chaining round complete"
            );
        }

        stats.evaluation_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        Interpretation::from_parts(horizon, store, provenance, stats)
    }
}
