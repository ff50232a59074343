//! Integrity constraints checked against an interpretation
//!
//! Constraints never influence reasoning; they are validated after the fact
//! and reported with the offending atoms and timesteps.

use crate::interval::Timestep;
use crate::reasoner::evaluation::Interpretation;
use crate::reasoner::types::Atom;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A single integrity constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// At every timestep, no two atoms of `predicate` may share the value at
    /// `key_arg`
    Unique {
        /// Constrained predicate
        predicate: Arc<str>,
        /// Index of the key argument
        key_arg: usize,
    },
    /// At every timestep, the number of atoms of `predicate` must lie in
    /// `[min, max]`
    Cardinality {
        /// Constrained predicate
        predicate: Arc<str>,
        /// Minimum count (inclusive)
        min: usize,
        /// Maximum count (inclusive)
        max: usize,
    },
}

impl Constraint {
    /// Uniqueness constraint on `predicate` keyed by argument `key_arg`
    pub fn unique(predicate: impl Into<String>, key_arg: usize) -> Self {
        Constraint::Unique {
            predicate: Arc::from(predicate.into().into_boxed_str()),
            key_arg,
        }
    }

    /// Cardinality constraint on `predicate` with inclusive bounds
    pub fn cardinality(predicate: impl Into<String>, min: usize, max: usize) -> Self {
        Constraint::Cardinality {
            predicate: Arc::from(predicate.into().into_boxed_str()),
            min,
            max,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Unique { predicate, key_arg } => {
                write!(f, "unique({}, arg {})", predicate, key_arg)
            }
            Constraint::Cardinality {
                predicate,
                min,
                max,
            } => write!(f, "cardinality({}, {}..={})", predicate, min, max),
        }
    }
}

/// Offending atoms at one timestep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Timestep of the violation
    pub time: Timestep,
    /// Atoms involved
    pub atoms: Vec<Atom>,
}

/// Result for one constraint
#[derive(Debug, Clone)]
pub struct ConstraintOutcome {
    /// The checked constraint
    pub constraint: Constraint,
    /// True iff no violation was found
    pub passed: bool,
    /// Violations per timestep
    pub violations: Vec<Violation>,
}

/// Results for every registered constraint
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Per-constraint outcomes in registration order
    pub outcomes: Vec<ConstraintOutcome>,
}

impl ValidationReport {
    /// True iff every constraint passed
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// Outcomes that failed
    pub fn failures(&self) -> Vec<&ConstraintOutcome> {
        self.outcomes.iter().filter(|o| !o.passed).collect()
    }
}

/// Validates a list of constraints against an interpretation
#[derive(Debug, Clone, Default)]
pub struct ConstraintValidator {
    constraints: Vec<Constraint>,
}

impl ConstraintValidator {
    /// Create an empty validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constraint
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Register a constraint in place
    pub fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Check every constraint at every timestep of the interpretation
    pub fn validate(&self, interp: &Interpretation) -> ValidationReport {
        let outcomes = self
            .constraints
            .iter()
            .map(|c| self.check(c, interp))
            .collect();
        ValidationReport { outcomes }
    }

    fn check(&self, constraint: &Constraint, interp: &Interpretation) -> ConstraintOutcome {
        let mut violations = Vec::new();

        for t in 0..=interp.horizon() {
            match constraint {
                Constraint::Unique { predicate, key_arg } => {
                    let mut groups: HashMap<Arc<str>, Vec<Atom>> = HashMap::new();
                    for atom in interp.facts_at(t) {
                        if atom.predicate != *predicate {
                            continue;
                        }
                        if let Some(key) = atom.terms.get(*key_arg).and_then(|t| t.as_constant()) {
                            groups.entry(key.clone()).or_default().push(atom);
                        }
                    }
                    let mut clashing: Vec<Atom> = groups
                        .into_values()
                        .filter(|g| g.len() > 1)
                        .flatten()
                        .collect();
                    if !clashing.is_empty() {
                        clashing.sort_by_key(|a| a.to_string());
                        violations.push(Violation {
                            time: t,
                            atoms: clashing,
                        });
                    }
                }
                Constraint::Cardinality {
                    predicate,
                    min,
                    max,
                } => {
                    let atoms: Vec<Atom> = interp
                        .facts_at(t)
                        .into_iter()
                        .filter(|a| a.predicate == *predicate)
                        .collect();
                    if atoms.len() < *min || atoms.len() > *max {
                        violations.push(Violation { time: t, atoms });
                    }
                }
            }
        }

        ConstraintOutcome {
            constraint: constraint.clone(),
            passed: violations.is_empty(),
            violations,
        }
    }
}
