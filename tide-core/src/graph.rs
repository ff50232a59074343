//! Conversion of graph edge descriptions into base facts
//!
//! The loader that produces the edges lives outside the core; this module
//! only consumes an iterable of edges and materializes them as timed facts
//! over the full horizon.

use crate::interval::{Interval, Timestep};
use crate::reasoner::types::{Atom, Term, TimedFact};

/// One edge of a graph description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Predicate naming the relation
    pub predicate: String,
    /// Optional attribute value carried by the edge
    pub value: Option<String>,
}

impl GraphEdge {
    /// Create an edge without a value
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        predicate: impl Into<String>,
    ) -> Self {
        GraphEdge {
            source: source.into(),
            target: target.into(),
            predicate: predicate.into(),
            value: None,
        }
    }

    /// Attach an attribute value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A node with attribute pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Node id
    pub id: String,
    /// Attribute name/value pairs
    pub attributes: Vec<(String, String)>,
}

impl GraphNode {
    /// Create a node without attributes
    pub fn new(id: impl Into<String>) -> Self {
        GraphNode {
            id: id.into(),
            attributes: Vec::new(),
        }
    }

    /// Attach an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// Convert edges to timed facts `predicate(source, target)` over `[0, horizon]`.
///
/// An edge value, when present, becomes a third argument.
pub fn edges_to_facts(
    edges: impl IntoIterator<Item = GraphEdge>,
    horizon: Timestep,
) -> Vec<TimedFact> {
    edges
        .into_iter()
        .map(|edge| {
            let mut terms = vec![
                Term::constant(edge.source.clone()),
                Term::constant(edge.target.clone()),
            ];
            if let Some(value) = &edge.value {
                terms.push(Term::constant(value.clone()));
            }
            TimedFact::new(
                Atom::new(edge.predicate.clone(), terms),
                format!("edge:{}:{}->{}", edge.predicate, edge.source, edge.target),
                vec![Interval::new(0, horizon as i64)],
            )
        })
        .collect()
}

/// Convert node attributes to timed facts `attr(id, value)` over `[0, horizon]`
pub fn nodes_to_facts(
    nodes: impl IntoIterator<Item = GraphNode>,
    horizon: Timestep,
) -> Vec<TimedFact> {
    let mut facts = Vec::new();
    for node in nodes {
        for (name, value) in &node.attributes {
            facts.push(TimedFact::new(
                Atom::new(
                    name.clone(),
                    vec![Term::constant(node.id.clone()), Term::constant(value.clone())],
                ),
                format!("node:{}:{}", node.id, name),
                vec![Interval::new(0, horizon as i64)],
            ));
        }
    }
    facts
}
