//! One-way pattern-to-ground unification
//!
//! Matching a body pattern against a ground atom extends a substitution
//! environment. Predicate or arity mismatch is a plain no-match, never an
//! error.

use super::types::{Atom, Substitution, Term};
use std::collections::HashMap;
use std::sync::Arc;

/// Unify a pattern atom against a ground atom under an existing substitution.
///
/// Returns a fresh extended substitution on success; the input substitution is
/// never mutated.
pub fn unify(pattern: &Atom, ground: &Atom, sub: &Substitution) -> Option<Substitution> {
    if pattern.predicate != ground.predicate || pattern.terms.len() != ground.terms.len() {
        return None;
    }

    let mut out = sub.clone();
    for (pat, fact) in pattern.terms.iter().zip(ground.terms.iter()) {
        let value = match fact {
            Term::Constant(value) => value,
            // The ground side must be ground; a stray variable is a no-match.
            Term::Variable(_) => return None,
        };

        match pat {
            Term::Constant(expected) => {
                if expected != value {
                    return None;
                }
            }
            Term::Variable(name) => match out.get(name) {
                Some(bound) => {
                    if bound != value {
                        return None;
                    }
                }
                None => out.bind(name.clone(), value.clone()),
            },
        }
    }

    Some(out)
}

/// All extensions of `sub` that match `pattern` against the given atoms.
pub fn matches<'a>(
    pattern: &Atom,
    atoms: impl IntoIterator<Item = &'a Atom>,
    sub: &Substitution,
) -> Vec<Substitution> {
    atoms
        .into_iter()
        .filter_map(|atom| unify(pattern, atom, sub))
        .collect()
}

/// Whether two patterns (variables allowed on both sides) can denote the same
/// ground atom. Variable scopes of the two sides are kept distinct.
pub fn patterns_unify(left: &Atom, right: &Atom) -> bool {
    if left.predicate != right.predicate || left.terms.len() != right.terms.len() {
        return false;
    }

    // Union-find over scoped variable names, with at most one constant per
    // class.
    let mut parent: HashMap<String, String> = HashMap::new();
    let mut constant: HashMap<String, Arc<str>> = HashMap::new();

    fn find(parent: &mut HashMap<String, String>, key: &str) -> String {
        let mut current = key.to_string();
        while let Some(next) = parent.get(&current) {
            if next == &current {
                break;
            }
            current = next.clone();
        }
        current
    }

    let mut bind_constant = |parent: &mut HashMap<String, String>,
                             constant: &mut HashMap<String, Arc<str>>,
                             key: String,
                             value: &Arc<str>|
     -> bool {
        let root = find(parent, &key);
        match constant.get(&root) {
            Some(existing) => existing == value,
            None => {
                constant.insert(root, value.clone());
                true
            }
        }
    };

    for (l, r) in left.terms.iter().zip(right.terms.iter()) {
        let ok = match (l, r) {
            (Term::Constant(a), Term::Constant(b)) => a == b,
            (Term::Variable(v), Term::Constant(c)) => {
                bind_constant(&mut parent, &mut constant, format!("l:{}", v), c)
            }
            (Term::Constant(c), Term::Variable(v)) => {
                bind_constant(&mut parent, &mut constant, format!("r:{}", v), c)
            }
            (Term::Variable(a), Term::Variable(b)) => {
                let ra = find(&mut parent, &format!("l:{}", a));
                let rb = find(&mut parent, &format!("r:{}", b));
                if ra != rb {
                    match (constant.get(&ra).cloned(), constant.get(&rb).cloned()) {
                        (Some(ca), Some(cb)) if ca != cb => false,
                        (ca, cb) => {
                            parent.insert(ra.clone(), rb.clone());
                            if let Some(c) = ca.or(cb) {
                                constant.insert(rb, c);
                            }
                            true
                        }
                    }
                } else {
                    true
                }
            }
        };
        if !ok {
            return false;
        }
    }

    true
}
