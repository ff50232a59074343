//! Static conflict analysis over a rule set
//!
//! Two checks run without any facts:
//! - Overlapping heads: two rules whose head patterns can ground to the same
//!   atom. Often intentional (multiple derivation paths), sometimes a
//!   misspelled predicate.
//! - Circular dependencies: strongly connected components of the predicate
//!   dependency graph, where an edge `p -> q` means some rule reads `p` in
//!   its body and writes `q` in its head. Recursion is legal; the report
//!   makes it visible.

use crate::reasoner::types::Rule;
use crate::reasoner::unification::patterns_unify;
use std::collections::HashMap;
use std::sync::Arc;

/// A pair of rules whose heads can denote the same ground atom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapConflict {
    /// Shared head predicate
    pub predicate: Arc<str>,
    /// Names of the two overlapping rules
    pub rules: (Arc<str>, Arc<str>),
}

/// Structured result of the static analysis
#[derive(Debug, Clone, Default)]
pub struct ConflictAnalysis {
    /// Overlapping head pairs, one entry per unordered rule pair
    pub overlapping_heads: Vec<OverlapConflict>,
    /// Predicate cycles: every non-singleton SCC, plus singletons with a
    /// self-edge
    pub cycles: Vec<Vec<Arc<str>>>,
}

impl ConflictAnalysis {
    /// True iff neither check found anything
    pub fn is_clean(&self) -> bool {
        self.overlapping_heads.is_empty() && self.cycles.is_empty()
    }
}

/// Runs the static checks over a rule set
pub struct ConflictDetector {
    rules: Vec<Rule>,
}

impl ConflictDetector {
    /// Create a detector over the given rules
    pub fn new(rules: &[Rule]) -> Self {
        ConflictDetector {
            rules: rules.to_vec(),
        }
    }

    /// Run both checks
    pub fn analyze(&self) -> ConflictAnalysis {
        ConflictAnalysis {
            overlapping_heads: self.overlapping_heads(),
            cycles: self.circular_dependencies(),
        }
    }

    /// Unordered rule pairs with unifiable head patterns
    pub fn overlapping_heads(&self) -> Vec<OverlapConflict> {
        let mut out = Vec::new();
        for (i, left) in self.rules.iter().enumerate() {
            for right in self.rules.iter().skip(i + 1) {
                if patterns_unify(&left.head, &right.head) {
                    out.push(OverlapConflict {
                        predicate: left.head.predicate.clone(),
                        rules: (left.name.clone(), right.name.clone()),
                    });
                }
            }
        }
        out
    }

    /// Strongly connected components of the predicate dependency graph.
    ///
    /// Reported components are sorted internally for stable output.
    pub fn circular_dependencies(&self) -> Vec<Vec<Arc<str>>> {
        // Node table over every predicate mentioned anywhere.
        let mut ids: HashMap<Arc<str>, usize> = HashMap::new();
        let mut names: Vec<Arc<str>> = Vec::new();
        let mut intern = |pred: &Arc<str>, names: &mut Vec<Arc<str>>| -> usize {
            *ids.entry(pred.clone()).or_insert_with(|| {
                names.push(pred.clone());
                names.len() - 1
            })
        };

        let mut edges: Vec<Vec<usize>> = Vec::new();
        let mut self_edges: Vec<bool> = Vec::new();
        for rule in &self.rules {
            let head = intern(&rule.head.predicate, &mut names);
            while edges.len() < names.len() {
                edges.push(Vec::new());
                self_edges.push(false);
            }
            for literal in &rule.body {
                let body = intern(&literal.atom.predicate, &mut names);
                while edges.len() < names.len() {
                    edges.push(Vec::new());
                    self_edges.push(false);
                }
                // Body predicate feeds the head predicate.
                edges[body].push(head);
                if body == head {
                    self_edges[body] = true;
                }
            }
        }

        let components = tarjan_scc(&edges);

        let mut cycles: Vec<Vec<Arc<str>>> = Vec::new();
        for component in components {
            if component.len() > 1 || (component.len() == 1 && self_edges[component[0]]) {
                let mut preds: Vec<Arc<str>> =
                    component.iter().map(|&n| names[n].clone()).collect();
                preds.sort();
                cycles.push(preds);
            }
        }
        cycles.sort();
        cycles
    }
}

/// Iterative Tarjan SCC over an adjacency list.
fn tarjan_scc(edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = edges.len();
    let mut index = vec![usize::MAX; n];
    let mut lowlink = vec![usize::MAX; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0;
    let mut components = Vec::new();

    // Explicit DFS frames: (node, next child position).
    for start in 0..n {
        if index[start] != usize::MAX {
            continue;
        }
        let mut frames: Vec<(usize, usize)> = vec![(start, 0)];
        while !frames.is_empty() {
            let depth = frames.len() - 1;
            let (node, child) = frames[depth];

            if child == 0 {
                index[node] = next_index;
                lowlink[node] = next_index;
                next_index += 1;
                stack.push(node);
                on_stack[node] = true;
            }

            if child < edges[node].len() {
                let next = edges[node][child];
                frames[depth].1 += 1;
                if index[next] == usize::MAX {
                    frames.push((next, 0));
                } else if on_stack[next] {
                    lowlink[node] = lowlink[node].min(index[next]);
                }
            } else {
                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[node]);
                }
                if lowlink[node] == index[node] {
                    let mut component = Vec::new();
                    loop {
                        let popped = stack.pop().expect("tarjan stack underflow");
                        on_stack[popped] = false;
                        component.push(popped);
                        if popped == node {
                            break;
                        }
                    }
                    components.push(component);
                }
            }
        }
    }

    components
}
