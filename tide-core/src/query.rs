//! Pattern queries over a finished interpretation

use crate::interval::Timestep;
use crate::reasoner::evaluation::Interpretation;
use crate::reasoner::types::{Atom, Substitution};
use crate::reasoner::unification::unify;
use std::collections::HashSet;
use std::sync::Arc;

/// Which timesteps a query ranges over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSpec {
    /// A single timestep
    At(Timestep),
    /// A closed range of timesteps
    Range(Timestep, Timestep),
    /// Every timestep of the interpretation
    Any,
}

/// A pattern with optional pre-bound variables and a time filter
#[derive(Debug, Clone)]
pub struct Query {
    /// Pattern atom; variables capture bindings
    pub pattern: Atom,
    /// Variables bound before matching
    pub bindings: Substitution,
    /// Time filter
    pub time: TimeSpec,
}

/// One matching atom with the substitution that matched it
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// The matched ground atom
    pub atom: Atom,
    /// Timestep it holds at
    pub time: Timestep,
    /// Bindings including any pre-bound variables
    pub bindings: Substitution,
}

impl Query {
    /// Query matching at any timestep
    pub fn new(pattern: Atom) -> Self {
        Query {
            pattern,
            bindings: Substitution::new(),
            time: TimeSpec::Any,
        }
    }

    /// Restrict to a single timestep
    pub fn at(mut self, t: Timestep) -> Self {
        self.time = TimeSpec::At(t);
        self
    }

    /// Restrict to a closed timestep range
    pub fn between(mut self, start: Timestep, end: Timestep) -> Self {
        self.time = TimeSpec::Range(start, end);
        self
    }

    /// Pre-bind a variable
    pub fn bind(mut self, variable: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.bind(
            Arc::from(variable.into().into_boxed_str()),
            Arc::from(value.into().into_boxed_str()),
        );
        self
    }

    /// Run against an interpretation.
    ///
    /// Every result satisfies: the atom is in the interpretation at the
    /// reported time, and the pattern under the result's bindings equals the
    /// atom.
    pub fn execute(&self, interp: &Interpretation) -> Vec<QueryResult> {
        let (lo, hi) = match self.time {
            TimeSpec::At(t) => (t, t),
            TimeSpec::Range(start, end) => (start, end.min(interp.horizon())),
            TimeSpec::Any => (0, interp.horizon()),
        };
        if lo > interp.horizon() || lo > hi {
            return Vec::new();
        }

        let pattern = self.pattern.apply(&self.bindings);
        let mut results = Vec::new();

        for t in lo..=hi {
            for atom in interp.facts_at(t) {
                if let Some(bindings) = unify(&pattern, &atom, &self.bindings) {
                    results.push(QueryResult {
                        atom,
                        time: t,
                        bindings,
                    });
                }
            }
        }

        results
    }
}

/// Distinct values bound to `variable` across the results
pub fn unique_bindings(results: &[QueryResult], variable: &str) -> HashSet<Arc<str>> {
    results
        .iter()
        .filter_map(|r| r.bindings.get(variable).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::reasoner::evaluation::Evaluator;
    use crate::reasoner::types::{Term, TimedFact};

    fn ground(pred: &str, args: &[&str]) -> Atom {
        Atom::new(pred, args.iter().map(|a| Term::constant(*a)).collect())
    }

    fn sample() -> Interpretation {
        let facts = vec![
            TimedFact::new(ground("knows", &["Alice", "Bob"]), "f1", vec![Interval::new(0, 4)]),
            TimedFact::new(
                ground("knows", &["Alice", "Charlie"]),
                "f2",
                vec![Interval::new(2, 6)],
            ),
            TimedFact::new(ground("knows", &["Bob", "Charlie"]), "f3", vec![Interval::new(0, 6)]),
        ];
        Evaluator::new(vec![], facts).evaluate(6)
    }

    #[test]
    fn test_query_at_single_timestep() {
        let interp = sample();
        let results = Query::new(Atom::new("knows", vec![Term::var("a"), Term::var("b")]))
            .at(0)
            .execute(&interp);
        assert_eq!(results.len(), 2);
        for r in &results {
            assert_eq!(r.time, 0);
            assert!(interp.holds_at(&r.atom, r.time));
        }
    }

    #[test]
    fn test_query_range_and_any() {
        let interp = sample();
        let pattern = Atom::new("knows", vec![Term::constant("Alice"), Term::var("who")]);

        let ranged = Query::new(pattern.clone()).between(2, 4).execute(&interp);
        assert_eq!(ranged.len(), 6); // both Alice edges over t in 2..=4

        let all = Query::new(pattern).execute(&interp);
        let who = unique_bindings(&all, "who");
        assert_eq!(who.len(), 2);
        assert!(who.contains(&Arc::from("Bob")));
        assert!(who.contains(&Arc::from("Charlie")));
    }

    #[test]
    fn test_query_prebound_variable() {
        let interp = sample();
        let results = Query::new(Atom::new("knows", vec![Term::var("a"), Term::var("b")]))
            .bind("a", "Bob")
            .at(1)
            .execute(&interp);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].bindings.get("a").unwrap().as_ref(), "Bob");
        assert_eq!(results[0].bindings.get("b").unwrap().as_ref(), "Charlie");
    }

    #[test]
    fn test_query_outside_horizon_is_empty() {
        let interp = sample();
        let pattern = Atom::new("knows", vec![Term::var("a"), Term::var("b")]);
        assert!(Query::new(pattern.clone()).at(99).execute(&interp).is_empty());

        // Range end past the horizon is clamped rather than an error.
        let clamped = Query::new(pattern).between(5, 99).execute(&interp);
        assert!(!clamped.is_empty());
        assert!(clamped.iter().all(|r| r.time <= 6));
    }
}
