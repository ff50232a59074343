//! Provenance tracking for derived facts
//!
//! Records, for each derived `(atom, time)`, which rule fired, which grounded
//! body atoms supported it at which times, and under which substitution.
//! Base facts never get a record, which is what distinguishes derived from
//! base. Essential for explaining conclusions and for incremental
//! re-reasoning.

use crate::interval::Timestep;
use crate::reasoner::types::{Atom, Substitution};
use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

/// One recorded justification for a derived fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationInfo {
    /// Name of the rule that fired
    pub rule: Arc<str>,
    /// Grounded positive body atoms with the times they were read at
    pub sources: Vec<(Atom, Timestep)>,
    /// The substitution that grounded the rule
    pub substitution: Substitution,
}

/// Append-only map from derived `(atom, time)` to its derivations.
///
/// Appends go through a concurrent map so parallel rule firings can record
/// without a barrier. A single derived fact may accumulate multiple
/// derivation records from distinct firings.
#[derive(Debug, Default)]
pub struct ProvenanceStore {
    records: DashMap<(Atom, Timestep), Vec<DerivationInfo>>,
}

impl ProvenanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a derivation record for `(atom, t)`, skipping exact duplicates
    /// (re-derivations of the same firing in later rounds).
    pub fn record(&self, atom: Atom, t: Timestep, info: DerivationInfo) {
        let mut entry = self.records.entry((atom, t)).or_default();
        if !entry.contains(&info) {
            entry.push(info);
        }
    }

    /// True iff `(atom, t)` has at least one derivation record
    pub fn is_derived(&self, atom: &Atom, t: Timestep) -> bool {
        self.records.contains_key(&(atom.clone(), t))
    }

    /// All derivation records for `(atom, t)`
    pub fn derivations(&self, atom: &Atom, t: Timestep) -> Vec<DerivationInfo> {
        self.records
            .get(&(atom.clone(), t))
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Number of derived `(atom, time)` keys
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no derivations were recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Human-readable one-step explanation naming the first derivation
    pub fn explain(&self, atom: &Atom, t: Timestep) -> Option<String> {
        let info = self.derivations(atom, t).into_iter().next()?;

        let mut out = format!("{} @ {} by rule '{}'", atom, t, info.rule);
        if !info.sources.is_empty() {
            out.push_str(" from ");
            for (i, (source, st)) in info.sources.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{} @ {}", source, st);
            }
        }
        let _ = write!(out, " with {}", info.substitution);
        Some(out)
    }

    /// Full recursive derivation tree for `(atom, t)`.
    ///
    /// Leaves are base facts (no record). A repetition of an `(atom, time)`
    /// already on the current path is cut and marked as a cycle instead of
    /// recursing.
    pub fn derivation_tree(&self, atom: &Atom, t: Timestep) -> DerivationTree {
        let mut path = HashSet::new();
        self.build_tree(atom, t, &mut path)
    }

    fn build_tree(
        &self,
        atom: &Atom,
        t: Timestep,
        path: &mut HashSet<(Atom, Timestep)>,
    ) -> DerivationTree {
        let key = (atom.clone(), t);
        if !path.insert(key.clone()) {
            return DerivationTree::Cycle {
                atom: atom.clone(),
                time: t,
            };
        }

        let tree = match self.derivations(atom, t).into_iter().next() {
            None => DerivationTree::Base {
                atom: atom.clone(),
                time: t,
            },
            Some(info) => DerivationTree::Derived {
                atom: atom.clone(),
                time: t,
                rule: info.rule.clone(),
                premises: info
                    .sources
                    .iter()
                    .map(|(source, st)| self.build_tree(source, *st, path))
                    .collect(),
            },
        };

        path.remove(&key);
        tree
    }
}

/// Recursive structure showing how a fact was derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationTree {
    /// A base fact: present without any derivation record
    Base {
        /// The atom
        atom: Atom,
        /// Timestep it was read at
        time: Timestep,
    },
    /// A derived fact with its premises expanded
    Derived {
        /// The atom
        atom: Atom,
        /// Timestep it holds at
        time: Timestep,
        /// Rule that produced it
        rule: Arc<str>,
        /// Sub-trees for the supporting atoms
        premises: Vec<DerivationTree>,
    },
    /// A repetition of an ancestor on the current path
    Cycle {
        /// The atom
        atom: Atom,
        /// Timestep of the repetition
        time: Timestep,
    },
}

impl DerivationTree {
    /// Render the tree as indented text
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match self {
            DerivationTree::Base { atom, time } => {
                let _ = writeln!(out, "{}- {} @ {} (base fact)", pad, atom, time);
            }
            DerivationTree::Cycle { atom, time } => {
                let _ = writeln!(out, "{}- {} @ {} (cycle)", pad, atom, time);
            }
            DerivationTree::Derived {
                atom,
                time,
                rule,
                premises,
            } => {
                let _ = writeln!(out, "{}- {} @ {} (by {})", pad, atom, time, rule);
                for premise in premises {
                    premise.render_into(out, indent + 1);
                }
            }
        }
    }

    /// Depth of the tree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        match self {
            DerivationTree::Base { .. } | DerivationTree::Cycle { .. } => 1,
            DerivationTree::Derived { premises, .. } => {
                1 + premises.iter().map(|p| p.depth()).max().unwrap_or(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::types::Term;

    fn atom(pred: &str, args: &[&str]) -> Atom {
        Atom::new(pred, args.iter().map(|a| Term::constant(*a)).collect())
    }

    fn info(rule: &str, sources: Vec<(Atom, Timestep)>) -> DerivationInfo {
        DerivationInfo {
            rule: Arc::from(rule),
            sources,
            substitution: Substitution::new(),
        }
    }

    #[test]
    fn test_record_and_query() {
        let store = ProvenanceStore::new();
        let derived = atom("friend", &["Alice", "Bob"]);

        assert!(!store.is_derived(&derived, 2));
        store.record(
            derived.clone(),
            2,
            info("r1", vec![(atom("knows", &["Alice", "Bob"]), 1)]),
        );
        assert!(store.is_derived(&derived, 2));
        assert!(!store.is_derived(&derived, 3));
        assert_eq!(store.derivations(&derived, 2).len(), 1);
    }

    #[test]
    fn test_duplicate_records_are_collapsed() {
        let store = ProvenanceStore::new();
        let derived = atom("p", &["A"]);
        let record = info("r", vec![(atom("q", &["A"]), 0)]);

        store.record(derived.clone(), 1, record.clone());
        store.record(derived.clone(), 1, record);
        assert_eq!(store.derivations(&derived, 1).len(), 1);

        // A genuinely different derivation is kept
        store.record(derived.clone(), 1, info("other", vec![(atom("z", &["A"]), 0)]));
        assert_eq!(store.derivations(&derived, 1).len(), 2);
    }

    #[test]
    fn test_explain_mentions_rule_and_sources() {
        let store = ProvenanceStore::new();
        let derived = atom("friend", &["Alice", "Charlie"]);
        store.record(
            derived.clone(),
            2,
            info(
                "transitive",
                vec![
                    (atom("friend", &["Alice", "Bob"]), 1),
                    (atom("knows", &["Bob", "Charlie"]), 1),
                ],
            ),
        );

        let text = store.explain(&derived, 2).unwrap();
        assert!(text.contains("transitive"));
        assert!(text.contains("knows(Bob,Charlie) @ 1"));

        assert!(store.explain(&atom("base", &["X"]), 0).is_none());
    }

    #[test]
    fn test_tree_reaches_base_facts() {
        let store = ProvenanceStore::new();
        let mid = atom("friend", &["Alice", "Bob"]);
        let top = atom("friend", &["Alice", "Charlie"]);

        store.record(mid.clone(), 1, info("lift", vec![(atom("knows", &["Alice", "Bob"]), 0)]));
        store.record(
            top.clone(),
            2,
            info(
                "transitive",
                vec![(mid.clone(), 1), (atom("knows", &["Bob", "Charlie"]), 1)],
            ),
        );

        let tree = store.derivation_tree(&top, 2);
        assert_eq!(tree.depth(), 3);
        let rendered = tree.render();
        assert!(rendered.contains("base fact"));
        assert!(rendered.contains("(by transitive)"));
    }

    #[test]
    fn test_tree_cuts_cycles() {
        let store = ProvenanceStore::new();
        let a = atom("p", &["A"]);
        let b = atom("q", &["A"]);

        store.record(a.clone(), 1, info("r1", vec![(b.clone(), 1)]));
        store.record(b.clone(), 1, info("r2", vec![(a.clone(), 1)]));

        let tree = store.derivation_tree(&a, 1);
        assert!(tree.render().contains("(cycle)"));
    }
}
