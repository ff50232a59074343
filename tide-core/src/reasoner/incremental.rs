//! Incremental re-reasoning over a growing base
//!
//! Wraps the engine and remembers rules, base facts, and the last
//! interpretation. Facts added after an initial run are replayed by seeding
//! the semi-naive deltas at the timesteps the new facts support, so only the
//! derivations that depend on them are recomputed. The model is monotone
//! (facts are only ever added), which makes the seeded continuation agree
//! with a from-scratch rerun.
//!
//! Rule additions invalidate the cached interpretation and force a full
//! rerun.

use crate::interval::Timestep;
use crate::reasoner::evaluation::Interpretation;
use crate::reasoner::semi_naive::{deltas_from, run_delta_rounds, SemiNaiveEvaluator};
use crate::reasoner::types::{Rule, TimedFact};
use tracing::debug;

/// Engine wrapper that replays new facts into an existing interpretation
pub struct IncrementalReasoner {
    rules: Vec<Rule>,
    base: Vec<TimedFact>,
    pending: Vec<TimedFact>,
    horizon: Timestep,
    current: Option<Interpretation>,
}

impl IncrementalReasoner {
    /// Create a reasoner over the given rules
    pub fn new(rules: Vec<Rule>) -> Self {
        IncrementalReasoner {
            rules,
            base: Vec::new(),
            pending: Vec::new(),
            horizon: 0,
            current: None,
        }
    }

    /// Add a rule; the cached interpretation is invalidated
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
        self.current = None;
    }

    /// Queue a base fact for the next (incremental) run
    pub fn add_fact(&mut self, fact: TimedFact) {
        self.pending.push(fact);
    }

    /// Current rules
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Base facts accepted so far, excluding queued ones
    pub fn base_facts(&self) -> &[TimedFact] {
        &self.base
    }

    /// Run from scratch over `[0, horizon]`
    pub fn reason(&mut self, horizon: Timestep) -> &Interpretation {
        self.horizon = horizon;
        self.base.append(&mut self.pending);

        let interp =
            SemiNaiveEvaluator::new(self.rules.clone(), self.base.clone()).evaluate(horizon);
        self.current.insert(interp)
    }

    /// Replay queued facts into the last interpretation.
    ///
    /// Falls back to a full run when no interpretation exists yet. With no
    /// queued facts this is a no-op returning the cached result.
    pub fn incremental_reason(&mut self) -> &Interpretation {
        let interp = match self.current.take() {
            None => return self.reason(self.horizon),
            Some(interp) => interp,
        };
        if self.pending.is_empty() {
            return self.current.insert(interp);
        }

        let horizon = self.horizon;
        let (store, provenance, mut stats) = interp.into_parts();

        // Seed deltas with the timesteps the new facts newly support.
        let mut seeded = Vec::new();
        for fact in self.pending.drain(..) {
            for interval in &fact.intervals {
                for t in interval.timesteps(horizon) {
                    if store.insert_base(fact.atom.clone(), t) {
                        seeded.push((fact.atom.clone(), t));
                    }
                }
            }
            self.base.push(fact);
        }
        debug!(seeded = seeded.len(), "incremental replay starting");

        let mut delta = deltas_from(horizon, seeded);
        run_delta_rounds(
            &self.rules,
            &store,
            &provenance,
            horizon,
            &mut delta,
            false,
            &mut stats,
        );

        self.current
            .insert(Interpretation::from_parts(horizon, store, provenance, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::reasoner::types::{Atom, Literal, Term};

    fn ground(pred: &str, args: &[&str]) -> Atom {
        Atom::new(pred, args.iter().map(|a| Term::constant(*a)).collect())
    }

    fn base(pred: &str, args: &[&str], start: i64, end: i64) -> TimedFact {
        TimedFact::new(
            ground(pred, args),
            format!("{}/{}", pred, args.join(",")),
            vec![Interval::new(start, end)],
        )
    }

    fn transitive_rules() -> Vec<Rule> {
        vec![
            Rule::new(
                "r1",
                Atom::new("friend", vec![Term::var("x"), Term::var("y")]),
                vec![Literal::positive(Atom::new(
                    "knows",
                    vec![Term::var("x"), Term::var("y")],
                ))],
            ),
            Rule::new(
                "r2",
                Atom::new("friend", vec![Term::var("x"), Term::var("z")]),
                vec![
                    Literal::positive(Atom::new("friend", vec![Term::var("x"), Term::var("y")])),
                    Literal::positive(Atom::new("knows", vec![Term::var("y"), Term::var("z")])),
                ],
            ),
        ]
    }

    #[test]
    fn test_incremental_matches_full_rerun() {
        let mut reasoner = IncrementalReasoner::new(transitive_rules());
        reasoner.add_fact(base("knows", &["Alice", "Bob"], 0, 10));
        reasoner.add_fact(base("knows", &["Bob", "Charlie"], 0, 10));
        reasoner.reason(10);

        reasoner.add_fact(base("knows", &["Charlie", "Alice"], 0, 10));
        let incremental = reasoner.incremental_reason();

        let mut per_time: Vec<Vec<Atom>> = Vec::new();
        for t in 0..=10 {
            let mut facts = incremental.facts_at(t);
            facts.sort_by_key(|a| a.to_string());
            per_time.push(facts);
        }

        // Full rerun with the augmented base must agree everywhere.
        let full = SemiNaiveEvaluator::new(
            transitive_rules(),
            vec![
                base("knows", &["Alice", "Bob"], 0, 10),
                base("knows", &["Bob", "Charlie"], 0, 10),
                base("knows", &["Charlie", "Alice"], 0, 10),
            ],
        )
        .evaluate(10);

        for t in 0..=10 {
            let mut expected = full.facts_at(t);
            expected.sort_by_key(|a| a.to_string());
            assert_eq!(per_time[t], expected, "divergence at t={}", t);
        }

        // The loop closes: everyone becomes a friend of everyone, including
        // themselves, once enough delay steps have passed.
        assert!(incremental.holds_at(&ground("friend", &["Charlie", "Alice"]), 1));
        assert!(incremental.holds_at(&ground("friend", &["Alice", "Alice"]), 3));
        assert!(incremental.holds_at(&ground("friend", &["Bob", "Alice"]), 2));
    }

    #[test]
    fn test_incremental_without_changes_is_stable() {
        let mut reasoner = IncrementalReasoner::new(transitive_rules());
        reasoner.add_fact(base("knows", &["Alice", "Bob"], 0, 5));
        let count = reasoner.reason(5).fact_count();

        let again = reasoner.incremental_reason();
        assert_eq!(again.fact_count(), count);
    }

    #[test]
    fn test_rule_addition_forces_full_run() {
        let mut reasoner = IncrementalReasoner::new(vec![]);
        reasoner.add_fact(base("knows", &["Alice", "Bob"], 0, 5));
        assert_eq!(reasoner.reason(5).fact_count(), 6);

        reasoner.add_rule(Rule::new(
            "lift",
            Atom::new("friend", vec![Term::var("x"), Term::var("y")]),
            vec![Literal::positive(Atom::new(
                "knows",
                vec![Term::var("x"), Term::var("y")],
            ))],
        ));
        let interp = reasoner.incremental_reason();
        assert!(interp.holds_at(&ground("friend", &["Alice", "Bob"]), 1));
    }
}
