//! Core data structures for the temporal reasoner
//!
//! This module defines the fundamental types:
//! - Terms (variables and constants, classified lexically)
//! - Atoms (predicates with terms)
//! - Literals (positive or negated body atoms)
//! - Timed facts (ground atoms holding over intervals)
//! - Rules (temporal Horn clauses with delay and head offsets)
//! - Substitutions (variable bindings)
//!
//! Design principles:
//! - Arc-based for zero-copy sharing across timesteps and threads
//! - Structural equality throughout
//! - Immutable after construction

use crate::interval::{Interval, Timestep};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A term: variable or constant.
///
/// Built from text, a bare symbol whose first character is lowercase is a
/// variable; everything else (uppercase-initial identifiers, numbers, quoted
/// strings) is a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Variable (e.g. x, person)
    Variable(Arc<str>),
    /// Constant symbol (e.g. Alice, Room1)
    Constant(Arc<str>),
}

impl Term {
    /// Classify a raw symbol by lexical case: first char lowercase means variable
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol.chars().next() {
            Some(c) if c.is_lowercase() => Term::Variable(Arc::from(symbol)),
            _ => Term::Constant(Arc::from(symbol)),
        }
    }

    /// Create a variable term
    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(Arc::from(name.into().into_boxed_str()))
    }

    /// Create a constant term
    pub fn constant(value: impl Into<String>) -> Self {
        Term::Constant(Arc::from(value.into().into_boxed_str()))
    }

    /// Check if term is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Check if term is a constant
    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Constant(_))
    }

    /// Get variable name if this is a variable
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Get constant symbol if this is a constant
    pub fn as_constant(&self) -> Option<&Arc<str>> {
        match self {
            Term::Constant(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(name) => write!(f, "{}", name),
            Term::Constant(value) => write!(f, "{}", value),
        }
    }
}

/// A predicate applied to an ordered sequence of terms
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    /// Predicate name
    pub predicate: Arc<str>,
    /// Arguments
    pub terms: Vec<Term>,
}

impl Atom {
    /// Create a new atom
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Atom {
            predicate: Arc::from(predicate.into().into_boxed_str()),
            terms,
        }
    }

    /// Get the arity (number of terms)
    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Get all variable names in this atom
    pub fn variables(&self) -> Vec<&str> {
        self.terms.iter().filter_map(|t| t.as_variable()).collect()
    }

    /// Check if the atom is ground (no variables)
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(|t| t.is_constant())
    }

    /// Apply a substitution, producing a new atom
    pub fn apply(&self, sub: &Substitution) -> Atom {
        Atom {
            predicate: self.predicate.clone(),
            terms: self.terms.iter().map(|t| sub.apply_to_term(t)).collect(),
        }
    }

    /// Replace every variable with a constant of the same symbol.
    ///
    /// Fact text is ground by definition, so lowercase-initial arguments in a
    /// fact are constants even though the lexical rule would call them
    /// variables.
    pub fn coerce_ground(self) -> Atom {
        Atom {
            predicate: self.predicate,
            terms: self
                .terms
                .into_iter()
                .map(|t| match t {
                    Term::Variable(name) => Term::Constant(name),
                    t => t,
                })
                .collect(),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", term)?;
        }
        write!(f, ")")
    }
}

/// A body atom with polarity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// The atom pattern
    pub atom: Atom,
    /// Negation-as-failure marker
    pub negated: bool,
}

impl Literal {
    /// Create a positive literal
    pub fn positive(atom: Atom) -> Self {
        Literal {
            atom,
            negated: false,
        }
    }

    /// Create a negated literal
    pub fn negated(atom: Atom) -> Self {
        Literal {
            atom,
            negated: true,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not ")?;
        }
        write!(f, "{}", self.atom)
    }
}

/// A ground atom that holds over a union of closed intervals.
///
/// The `id` is opaque and reserved for provenance of base facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedFact {
    /// The ground atom
    pub atom: Atom,
    /// Opaque identifier
    pub id: Arc<str>,
    /// Nonempty sequence of intervals during which the atom holds
    pub intervals: Vec<Interval>,
}

impl TimedFact {
    /// Create a new timed fact
    pub fn new(atom: Atom, id: impl Into<String>, intervals: Vec<Interval>) -> Self {
        TimedFact {
            atom,
            id: Arc::from(id.into().into_boxed_str()),
            intervals,
        }
    }

    /// Check whether the fact holds at time `t` before horizon clamping
    pub fn holds_at(&self, t: i64) -> bool {
        self.intervals.iter().any(|iv| iv.contains(t))
    }
}

impl fmt::Display for TimedFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.atom)?;
        for iv in &self.intervals {
            write!(f, "@{}", iv)?;
        }
        Ok(())
    }
}

/// A temporal rule: when the body matches at time `t` (and the rule is
/// active at `t`), the head is added at every `t + delay + k` for
/// `k` in the head offset interval, clamped to the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier used in provenance
    pub name: Arc<str>,
    /// Head pattern (may contain variables)
    pub head: Atom,
    /// Offsets applied around the head base time, default `[0,0]`
    pub head_offset: Interval,
    /// Offset from body-match time to the head base time, default 1
    pub delay: i64,
    /// Ordered body literals
    pub body: Vec<Literal>,
    /// Windows during which the rule may fire; empty means always active
    pub active: Vec<Interval>,
}

impl Rule {
    /// Create a rule with default delay 1, head offset `[0,0]`, always active
    pub fn new(name: impl Into<String>, head: Atom, body: Vec<Literal>) -> Self {
        Rule {
            name: Arc::from(name.into().into_boxed_str()),
            head,
            head_offset: Interval::new(0, 0),
            delay: 1,
            body,
            active: Vec::new(),
        }
    }

    /// Set the delay
    pub fn with_delay(mut self, delay: i64) -> Self {
        debug_assert!(delay >= 0, "delay must be non-negative");
        self.delay = delay;
        self
    }

    /// Set the head offset interval
    pub fn with_head_offset(mut self, offset: Interval) -> Self {
        self.head_offset = offset;
        self
    }

    /// Restrict the rule to the given active windows
    pub fn with_active(mut self, active: Vec<Interval>) -> Self {
        self.active = active;
        self
    }

    /// Whether the rule may fire at timestep `t`
    pub fn is_active_at(&self, t: Timestep) -> bool {
        self.active.is_empty() || self.active.iter().any(|iv| iv.contains(t as i64))
    }

    /// Indices of the positive body literals
    pub fn positive_indices(&self) -> Vec<usize> {
        self.body
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.negated)
            .map(|(i, _)| i)
            .collect()
    }

    /// Check rule safety: every head variable appears in a positive body literal
    pub fn is_safe(&self) -> bool {
        let positive_vars: std::collections::HashSet<&str> = self
            .body
            .iter()
            .filter(|l| !l.negated)
            .flat_map(|l| l.atom.variables())
            .collect();

        self.head.variables().iter().all(|v| positive_vars.contains(v))
    }

    /// Predicates this rule's body depends on
    pub fn dependencies(&self) -> Vec<Arc<str>> {
        self.body.iter().map(|l| l.atom.predicate.clone()).collect()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if self.head_offset != Interval::new(0, 0) {
            write!(f, " : {}", self.head_offset)?;
        }
        write!(f, " <-{} ", self.delay)?;
        for (i, literal) in self.body.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", literal)?;
        }
        Ok(())
    }
}

/// Variable bindings accumulated during matching.
///
/// Bindings always map a variable name to a constant symbol, never to
/// another variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    bindings: HashMap<Arc<str>, Arc<str>>,
}

impl Substitution {
    /// Create an empty substitution
    pub fn new() -> Self {
        Substitution {
            bindings: HashMap::new(),
        }
    }

    /// Add a binding
    pub fn bind(&mut self, variable: Arc<str>, value: Arc<str>) {
        self.bindings.insert(variable, value);
    }

    /// Get the binding for a variable
    pub fn get(&self, variable: &str) -> Option<&Arc<str>> {
        self.bindings.get(variable)
    }

    /// Check if a variable is bound
    pub fn contains(&self, variable: &str) -> bool {
        self.bindings.contains_key(variable)
    }

    /// Apply to a term: bound variables become constants
    pub fn apply_to_term(&self, term: &Term) -> Term {
        match term {
            Term::Variable(name) => match self.bindings.get(name.as_ref()) {
                Some(value) => Term::Constant(value.clone()),
                None => term.clone(),
            },
            Term::Constant(_) => term.clone(),
        }
    }

    /// Merge two substitutions; `None` when they disagree on a variable
    pub fn merge(&self, other: &Substitution) -> Option<Substitution> {
        let mut result = self.clone();
        for (var, val) in &other.bindings {
            if let Some(existing) = result.bindings.get(var) {
                if existing != val {
                    return None;
                }
            } else {
                result.bindings.insert(var.clone(), val.clone());
            }
        }
        Some(result)
    }

    /// All bindings
    pub fn bindings(&self) -> &HashMap<Arc<str>, Arc<str>> {
        &self.bindings
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the substitution is empty
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<_> = self.bindings.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        write!(f, "{{")?;
        for (i, (var, val)) in pairs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", var, val)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_classification() {
        assert!(Term::from_symbol("x").is_variable());
        assert!(Term::from_symbol("person").is_variable());
        assert!(Term::from_symbol("Alice").is_constant());
        assert!(Term::from_symbol("42").is_constant());
        assert!(Term::from_symbol("_tag").is_constant());
    }

    #[test]
    fn test_atom_basics() {
        let atom = Atom::new("knows", vec![Term::var("x"), Term::constant("Bob")]);
        assert_eq!(atom.predicate.as_ref(), "knows");
        assert_eq!(atom.arity(), 2);
        assert_eq!(atom.variables(), vec!["x"]);
        assert!(!atom.is_ground());
        assert_eq!(atom.to_string(), "knows(x,Bob)");
    }

    #[test]
    fn test_coerce_ground() {
        let atom = Atom::new("bird", vec![Term::from_symbol("tweety")]).coerce_ground();
        assert!(atom.is_ground());
        assert_eq!(atom.terms[0], Term::constant("tweety"));
    }

    #[test]
    fn test_substitution_apply() {
        let mut sub = Substitution::new();
        sub.bind(Arc::from("x"), Arc::from("Alice"));

        let atom = Atom::new("friend", vec![Term::var("x"), Term::var("y")]);
        let applied = atom.apply(&sub);
        assert_eq!(applied.terms[0], Term::constant("Alice"));
        assert_eq!(applied.terms[1], Term::var("y"));
    }

    #[test]
    fn test_substitution_merge_conflict() {
        let mut a = Substitution::new();
        a.bind(Arc::from("x"), Arc::from("Alice"));

        let mut b = Substitution::new();
        b.bind(Arc::from("x"), Arc::from("Bob"));

        assert!(a.merge(&b).is_none());

        let mut c = Substitution::new();
        c.bind(Arc::from("y"), Arc::from("Bob"));
        let merged = a.merge(&c).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_rule_activity() {
        let rule = Rule::new(
            "r",
            Atom::new("p", vec![Term::var("x")]),
            vec![Literal::positive(Atom::new("q", vec![Term::var("x")]))],
        )
        .with_active(vec![Interval::new(0, 3)]);

        assert!(rule.is_active_at(0));
        assert!(rule.is_active_at(3));
        assert!(!rule.is_active_at(4));

        let always = Rule::new("a", Atom::new("p", vec![Term::var("x")]), vec![]);
        assert!(always.is_active_at(999));
    }

    #[test]
    fn test_rule_safety() {
        let safe = Rule::new(
            "safe",
            Atom::new("p", vec![Term::var("x")]),
            vec![Literal::positive(Atom::new("q", vec![Term::var("x")]))],
        );
        assert!(safe.is_safe());

        let unsafe_rule = Rule::new(
            "unsafe",
            Atom::new("p", vec![Term::var("x")]),
            vec![Literal::negated(Atom::new("q", vec![Term::var("x")]))],
        );
        assert!(!unsafe_rule.is_safe());
    }

    #[test]
    fn test_timed_fact_holds() {
        let fact = TimedFact::new(
            Atom::new("at", vec![Term::constant("Alice"), Term::constant("RoomA")]),
            "f1",
            vec![Interval::new(0, 5), Interval::new(8, 9)],
        );
        assert!(fact.holds_at(3));
        assert!(!fact.holds_at(6));
        assert!(fact.holds_at(8));
    }
}
