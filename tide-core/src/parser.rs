//! Parser for the textual rule and fact syntax
//!
//! Rule form: `HEAD [: [s,e]] <- [DELAY] LITERAL (, LITERAL)*`
//!
//! - The line is split on the first `<-`.
//! - The head may carry an offset interval after a `:`; missing means `[0,0]`.
//! - On the right, a leading numeric token is the delay; otherwise the delay
//!   is 1 and the whole right side is the body.
//! - Body literals are separated by `), ` and each segment is repaired by
//!   re-appending the `)` the split consumed. A consequence worth knowing:
//!   argument constants must not themselves contain `)`.
//! - A literal may be prefixed with `not ` (case-insensitive) for
//!   negation-as-failure.
//!
//! Fact form: `PRED(ARG1,...,ARGN)` with optional `@[s,e]` interval suffixes.
//! Fact arguments are constants regardless of case, since a fact is ground by
//! definition.

use crate::error::{Result, TideError};
use crate::interval::Interval;
use crate::reasoner::types::{Atom, Literal, Rule, Term, TimedFact};

/// Parse a single atom of the form `pred(arg1,...,argN)`
pub fn parse_atom(input: &str) -> Result<Atom> {
    let input = input.trim();

    let open = input.find('(').ok_or_else(|| malformed_atom(input))?;
    if !input.ends_with(')') {
        return Err(malformed_atom(input));
    }

    let predicate = input[..open].trim();
    if predicate.is_empty() {
        return Err(malformed_atom(input));
    }

    let args_text = &input[open + 1..input.len() - 1];
    if args_text.trim().is_empty() {
        return Err(malformed_atom(input));
    }

    let terms = args_text
        .split(',')
        .map(|arg| parse_term(arg.trim(), input))
        .collect::<Result<Vec<Term>>>()?;

    Ok(Atom::new(predicate, terms))
}

fn malformed_atom(input: &str) -> TideError {
    TideError::ParseError(format!(
        "'{}' is not of the form pred(arg1,...,argN)",
        input.trim()
    ))
}

fn parse_term(text: &str, context: &str) -> Result<Term> {
    if text.is_empty() {
        return Err(malformed_atom(context));
    }

    // Quoted strings are constants; the quote character keeps them out of
    // the lowercase-means-variable rule.
    let bytes = text.as_bytes();
    if text.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[text.len() - 1] == bytes[0]
    {
        return Ok(Term::constant(&text[1..text.len() - 1]));
    }

    Ok(Term::from_symbol(text))
}

/// Parse one rule line under the given name
pub fn parse_rule(name: impl Into<String>, input: &str) -> Result<Rule> {
    let (left, right) = input.split_once("<-").ok_or_else(|| {
        TideError::ParseError(format!("rule '{}' is missing '<-'", input.trim()))
    })?;

    // Head, optionally followed by `: [s,e]`.
    let (head_text, head_offset) = match left.split_once(':') {
        Some((head, interval)) => (head, parse_interval_text(interval)?),
        None => (left, Interval::new(0, 0)),
    };
    let head = parse_atom(head_text)?;

    // Leading numeric token on the right is the delay.
    let right = right.trim();
    let (delay, body_text) = match right.split_once(char::is_whitespace) {
        Some((token, rest)) => match token.parse::<i64>() {
            Ok(delay) => (delay, rest),
            Err(_) => (1, right),
        },
        None => (1, right),
    };
    if delay < 0 {
        return Err(TideError::ParseError(format!(
            "delay must be non-negative, got {}",
            delay
        )));
    }

    let mut body = Vec::new();
    for segment in split_body(body_text) {
        body.push(parse_literal(&segment)?);
    }

    Ok(Rule::new(name, head, body)
        .with_delay(delay)
        .with_head_offset(head_offset))
}

/// Parse a multi-line rule program.
///
/// Blank lines and `#` comments are skipped. A line may carry a `name:`
/// prefix (a colon before the first parenthesis); unnamed rules get
/// positional names `r0`, `r1`, ...
pub fn parse_rules(input: &str) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let default_name = format!("r{}", rules.len());
        let (name, rest) = match (line.find(':'), line.find('(')) {
            (Some(colon), Some(paren)) if colon < paren => {
                (line[..colon].trim().to_string(), &line[colon + 1..])
            }
            _ => (default_name, line),
        };

        rules.push(parse_rule(name, rest)?);
    }

    Ok(rules)
}

/// Parse a fact of the form `pred(a,b)` with optional `@[s,e]` suffixes.
///
/// Without an interval suffix the fact defaults to the maximal interval and
/// is clamped to the horizon when materialized.
pub fn parse_timed_fact(id: impl Into<String>, input: &str) -> Result<TimedFact> {
    let input = input.trim();
    let mut parts = input.split('@');

    let atom_text = parts.next().unwrap_or_default();
    let atom = parse_atom(atom_text)?.coerce_ground();

    let mut intervals = Vec::new();
    for part in parts {
        intervals.push(parse_interval_text(part)?);
    }
    if intervals.is_empty() {
        intervals.push(Interval::new(0, i64::MAX));
    }

    Ok(TimedFact::new(atom, id, intervals))
}

/// Parse `[s,e]` into an interval
fn parse_interval_text(text: &str) -> Result<Interval> {
    let text = text.trim();
    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| malformed_interval(text))?;

    let bounds: Vec<&str> = inner.split(',').map(|b| b.trim()).collect();
    if bounds.len() != 2 {
        return Err(malformed_interval(text));
    }

    let start: i64 = bounds[0].parse().map_err(|_| malformed_interval(text))?;
    let end: i64 = bounds[1].parse().map_err(|_| malformed_interval(text))?;
    if end < start {
        return Err(TideError::ParseError(format!(
            "interval '{}' has end before start",
            text
        )));
    }

    Ok(Interval::new(start, end))
}

fn malformed_interval(text: &str) -> TideError {
    TideError::ParseError(format!("'{}' is not an interval of the form [s,e]", text))
}

/// Split a body on `), `, repairing the consumed parenthesis
fn split_body(input: &str) -> Vec<String> {
    input
        .split("), ")
        .map(|segment| {
            let segment = segment.trim();
            if segment.ends_with(')') {
                segment.to_string()
            } else {
                format!("{})", segment)
            }
        })
        .collect()
}

fn parse_literal(segment: &str) -> Result<Literal> {
    let segment = segment.trim();
    match strip_not(segment) {
        Some(rest) => Ok(Literal::negated(parse_atom(rest)?)),
        None => Ok(Literal::positive(parse_atom(segment)?)),
    }
}

/// Strip a leading `not` marker (case-insensitive, whitespace-tolerant)
fn strip_not(segment: &str) -> Option<&str> {
    let head = segment.get(..3)?;
    if head.eq_ignore_ascii_case("not") {
        let tail = &segment[3..];
        if tail.starts_with(char::is_whitespace) {
            return Some(tail.trim_start());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_atom_classifies_terms() {
        let atom = parse_atom("knows(x, Bob)").unwrap();
        assert_eq!(atom.predicate.as_ref(), "knows");
        assert!(atom.terms[0].is_variable());
        assert!(atom.terms[1].is_constant());
    }

    #[test]
    fn test_parse_atom_quoted_string_is_constant() {
        let atom = parse_atom("tagged(x, \"lowercase value\")").unwrap();
        assert_eq!(
            atom.terms[1],
            Term::constant("lowercase value"),
        );
    }

    #[test]
    fn test_parse_atom_rejects_malformed() {
        assert!(parse_atom("knows").is_err());
        assert!(parse_atom("knows(x").is_err());
        assert!(parse_atom("(x,y)").is_err());
        assert!(parse_atom("knows()").is_err());
    }

    #[test]
    fn test_parse_rule_defaults() {
        let rule = parse_rule("r1", "friend(x,y) <- knows(x,y)").unwrap();
        assert_eq!(rule.delay, 1);
        assert_eq!(rule.head_offset, Interval::new(0, 0));
        assert_eq!(rule.body.len(), 1);
        assert!(!rule.body[0].negated);
    }

    #[test]
    fn test_parse_rule_with_delay() {
        let rule = parse_rule("r", "friend(x,z) <-1 friend(x,y), knows(y,z)").unwrap();
        assert_eq!(rule.delay, 1);
        assert_eq!(rule.body.len(), 2);

        let zero = parse_rule("r", "canAccess(u,r) <-0 guest(u), permission(Guest,r)").unwrap();
        assert_eq!(zero.delay, 0);
    }

    #[test]
    fn test_parse_rule_with_head_interval() {
        let rule = parse_rule("alarm", "alarm(x) : [0,3] <-1 triggered(x)").unwrap();
        assert_eq!(rule.head_offset, Interval::new(0, 3));
        assert_eq!(rule.delay, 1);
    }

    #[test]
    fn test_parse_rule_with_negation() {
        let rule = parse_rule("fly", "canFly(x) <-1 bird(x), not penguin(x)").unwrap();
        assert_eq!(rule.body.len(), 2);
        assert!(!rule.body[0].negated);
        assert!(rule.body[1].negated);
        assert_eq!(rule.body[1].atom.predicate.as_ref(), "penguin");

        // Case-insensitive, extra whitespace
        let shouty = parse_rule("fly", "canFly(x) <-1 bird(x), NOT  penguin(x)").unwrap();
        assert!(shouty.body[1].negated);
    }

    #[test]
    fn test_not_prefix_does_not_eat_predicates() {
        let rule = parse_rule("n", "alerted(x) <-1 notify(x)").unwrap();
        assert!(!rule.body[0].negated);
        assert_eq!(rule.body[0].atom.predicate.as_ref(), "notify");
    }

    #[test]
    fn test_parse_rule_errors() {
        // No arrow
        assert!(parse_rule("r", "friend(x,y) knows(x,y)").is_err());
        // Malformed head interval
        assert!(parse_rule("r", "a(x) : [3] <- b(x)").is_err());
        assert!(parse_rule("r", "a(x) : [5,2] <- b(x)").is_err());
        assert!(parse_rule("r", "a(x) : [0,1,2] <- b(x)").is_err());
        // Malformed body literal
        assert!(parse_rule("r", "a(x) <- b").is_err());
        // Negative delay
        assert!(parse_rule("r", "a(x) <- -2 b(x)").is_err());
    }

    #[test]
    fn test_parse_rules_program() {
        let program = r#"
            # friendship
            lift: friend(x,y) <-1 knows(x,y)
            friend(x,z) <-1 friend(x,y), knows(y,z)
        "#;
        let rules = parse_rules(program).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name.as_ref(), "lift");
        assert_eq!(rules[1].name.as_ref(), "r1");
    }

    #[test]
    fn test_parse_timed_fact() {
        let fact = parse_timed_fact("f1", "knows(Alice,Bob)@[0,10]").unwrap();
        assert_eq!(fact.intervals, vec![Interval::new(0, 10)]);
        assert!(fact.atom.is_ground());

        let multi = parse_timed_fact("f2", "at(Alice,RoomA)@[0,2]@[5,8]").unwrap();
        assert_eq!(multi.intervals.len(), 2);
    }

    #[test]
    fn test_parse_timed_fact_lowercase_args_are_ground() {
        let fact = parse_timed_fact("f", "bird(tweety)@[0,10]").unwrap();
        assert!(fact.atom.is_ground());
        assert_eq!(fact.atom.terms[0], Term::constant("tweety"));
    }

    #[test]
    fn test_parse_timed_fact_defaults_to_open_horizon() {
        let fact = parse_timed_fact("f", "bird(tweety)").unwrap();
        assert_eq!(fact.intervals.len(), 1);
        assert_eq!(fact.intervals[0].start, 0);
    }
}
