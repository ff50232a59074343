//! Engine facade owning rules, base facts, and the evaluation strategy
//!
//! The engine is an isolated object: all state lives in the instance, and a
//! reasoning run borrows it immutably and returns a fresh interpretation.

use crate::error::Result;
use crate::graph::{edges_to_facts, GraphEdge};
use crate::interval::Timestep;
use crate::parser::{parse_rule, parse_timed_fact};
use crate::reasoner::conflicts::{ConflictAnalysis, ConflictDetector};
use crate::reasoner::evaluation::{Evaluator, Interpretation};
use crate::reasoner::semi_naive::SemiNaiveEvaluator;
use crate::reasoner::types::{Rule, TimedFact};
use tracing::info;

/// Evaluation strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Full scans per timestep, rounds until fixed point
    Naive,
    /// Like naive, matching through the per-timestep predicate index
    Indexed,
    /// Delta-driven rounds after an initial full round
    #[default]
    SemiNaive,
    /// Semi-naive with (timestep, rule) tasks on the rayon pool
    Parallel,
}

/// A temporal reasoning engine instance
#[derive(Debug, Default)]
pub struct TemporalEngine {
    rules: Vec<Rule>,
    facts: Vec<TimedFact>,
    strategy: Strategy,
}

impl TemporalEngine {
    /// Create an engine with the default (semi-naive) strategy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with an explicit strategy
    pub fn with_strategy(strategy: Strategy) -> Self {
        TemporalEngine {
            strategy,
            ..Self::default()
        }
    }

    /// Change the evaluation strategy
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    /// Current strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Add a rule object
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Parse and add one rule line
    pub fn add_rule_text(&mut self, name: &str, text: &str) -> Result<()> {
        let rule = parse_rule(name, text)?;
        self.rules.push(rule);
        Ok(())
    }

    /// Add a base fact
    pub fn add_fact(&mut self, fact: TimedFact) {
        self.facts.push(fact);
    }

    /// Parse and add one fact line
    pub fn add_fact_text(&mut self, id: &str, text: &str) -> Result<()> {
        let fact = parse_timed_fact(id, text)?;
        self.facts.push(fact);
        Ok(())
    }

    /// Convert graph edges into base facts over `[0, horizon]`
    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = GraphEdge>, horizon: Timestep) {
        self.facts.extend(edges_to_facts(edges, horizon));
    }

    /// Accepted rules
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Accepted base facts
    pub fn facts(&self) -> &[TimedFact] {
        &self.facts
    }

    /// Run the configured evaluator over `[0, horizon]`
    pub fn reason(&self, horizon: Timestep) -> Interpretation {
        info!(
            rules = self.rules.len(),
            facts = self.facts.len(),
            horizon,
            strategy = ?self.strategy,
            "starting reasoning run"
        );

        let interp = match self.strategy {
            Strategy::Naive => {
                Evaluator::new(self.rules.clone(), self.facts.clone()).evaluate(horizon)
            }
            Strategy::Indexed => {
                Evaluator::indexed(self.rules.clone(), self.facts.clone()).evaluate(horizon)
            }
            Strategy::SemiNaive => {
                SemiNaiveEvaluator::new(self.rules.clone(), self.facts.clone()).evaluate(horizon)
            }
            Strategy::Parallel => {
                SemiNaiveEvaluator::parallel(self.rules.clone(), self.facts.clone())
                    .evaluate(horizon)
            }
        };

        info!(
            facts = interp.fact_count(),
            rounds = interp.stats.rounds,
            elapsed_ms = interp.stats.evaluation_time_ms,
            "reasoning run complete"
        );
        interp
    }

    /// Static conflict analysis over the accepted rules
    pub fn analyze_conflicts(&self) -> ConflictAnalysis {
        ConflictDetector::new(&self.rules).analyze()
    }
}
