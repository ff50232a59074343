//! The temporal reasoning pipeline
//!
//! This module provides the interpreted forward-chaining engine:
//!
//! - **Types**: terms, atoms, literals, timed facts, rules, substitutions
//! - **Unification**: one-way pattern-to-ground matching
//! - **Evaluation**: naive and predicate-indexed fixed-point loops
//! - **Semi-naive**: delta-driven rounds, optionally parallel per round
//! - **Provenance**: derivation records, explanations, derivation trees
//! - **Incremental**: replaying new facts into an existing interpretation
//! - **Constraints / conflicts**: post-hoc validation and static rule checks
//!
//! Evaluation strategy notes:
//! - Bottom-up with per-timestep fact sets; head offsets broadcast
//!   conclusions across neighbouring timesteps
//! - Negation-as-failure reads the live fact set at the literal's timestep;
//!   no stratification is required (inflationary semantics, documented in
//!   `evaluation`)
//! - All variants reach the same fixed point; they differ only in how much
//!   work each round does

pub mod conflicts;
pub mod constraints;
pub mod evaluation;
pub mod incremental;
pub mod provenance;
pub mod semi_naive;
pub mod types;
pub mod unification;

pub use conflicts::{ConflictAnalysis, ConflictDetector, OverlapConflict};
pub use constraints::{
    Constraint, ConstraintOutcome, ConstraintValidator, ValidationReport, Violation,
};
pub use evaluation::{EvaluationStats, Evaluator, Interpretation};
pub use incremental::IncrementalReasoner;
pub use provenance::{DerivationInfo, DerivationTree, ProvenanceStore};
pub use semi_naive::SemiNaiveEvaluator;
pub use types::{Atom, Literal, Rule, Substitution, Term, TimedFact};
pub use unification::{matches, patterns_unify, unify};
