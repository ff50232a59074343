//! TIDE Core - temporal deductive reasoning engine
//!
//! This crate computes the fixed point of inferred facts at each discrete
//! timestep in a bounded horizon, from ground timed facts and rules with
//! negation-as-failure, bounded temporal offsets, and active windows.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod engine;
pub mod error;
pub mod facts;
pub mod graph;
pub mod interval;
pub mod parser;
pub mod query;
pub mod reasoner;

pub use engine::{Strategy, TemporalEngine};
pub use error::{Result, TideError};
pub use facts::TimelineStore;
pub use graph::{edges_to_facts, nodes_to_facts, GraphEdge, GraphNode};
pub use interval::{intervals_from_timesteps, Interval, Timestep};
pub use parser::{parse_atom, parse_rule, parse_rules, parse_timed_fact};
pub use query::{unique_bindings, Query, QueryResult, TimeSpec};
pub use reasoner::{
    Atom, ConflictAnalysis, Constraint, ConstraintValidator, DerivationInfo, DerivationTree,
    EvaluationStats, Evaluator, IncrementalReasoner, Interpretation, Literal, ProvenanceStore,
    Rule, SemiNaiveEvaluator, Substitution, Term, TimedFact,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
