//! The worker service object
//!
//! A synchronous facade over the single-node engine, holding the facts and
//! rules this shard was assigned. The distributed layer calls it through the
//! HTTP binding; tests call it directly. Errors never escape `reason`: they
//! come back as a failed `WorkResult`.

use crate::api::{WorkResult, WorkerStats};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;
use tide_core::{
    intervals_from_timesteps, Atom, Rule, Strategy, TemporalEngine, Timestep, TimedFact,
};
use tracing::{info, warn};

#[derive(Default)]
struct WorkerInner {
    rules: Vec<Rule>,
    facts: Vec<TimedFact>,
    derived: Vec<TimedFact>,
    reason_calls: u64,
    last_derived_count: usize,
}

/// A single reasoning shard
pub struct ReasonerWorker {
    inner: Mutex<WorkerInner>,
    started: Instant,
}

impl Default for ReasonerWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReasonerWorker {
    /// Create an empty worker
    pub fn new() -> Self {
        ReasonerWorker {
            inner: Mutex::new(WorkerInner::default()),
            started: Instant::now(),
        }
    }

    /// Accept a base fact
    pub fn add_fact(&self, fact: TimedFact) {
        self.inner.lock().facts.push(fact);
    }

    /// Accept a rule
    pub fn add_rule(&self, rule: Rule) {
        self.inner.lock().rules.push(rule);
    }

    /// Accept derived facts computed by other shards; they join the base for
    /// subsequent runs
    pub fn add_derived_facts(&self, facts: Vec<TimedFact>) {
        self.inner.lock().derived.extend(facts);
    }

    /// Run local reasoning over `[start_time, end_time]`.
    ///
    /// The engine runs to horizon `end_time`; the result reports derived
    /// facts whose times fall inside the requested range, compacted back
    /// into timed facts.
    pub fn reason(&self, start_time: Timestep, end_time: Timestep) -> WorkResult {
        let run_start = Instant::now();

        if start_time > end_time {
            warn!(start_time, end_time, "rejecting inverted reason range");
            return WorkResult::failure(
                format!(
                    "start_time {} exceeds end_time {}",
                    start_time, end_time
                ),
                elapsed_ms(run_start),
            );
        }

        // Copy the assignment out so reasoning runs without holding the lock.
        let (rules, base) = {
            let inner = self.inner.lock();
            let mut base = inner.facts.clone();
            base.extend(inner.derived.iter().cloned());
            (inner.rules.clone(), base)
        };

        let mut engine = TemporalEngine::with_strategy(Strategy::SemiNaive);
        for rule in rules {
            engine.add_rule(rule);
        }
        for fact in base {
            engine.add_fact(fact);
        }

        let interp = engine.reason(end_time);

        // Collect derived atoms inside the window, grouped per atom.
        let mut times_by_atom: HashMap<Atom, Vec<Timestep>> = HashMap::new();
        for t in start_time..=end_time {
            for atom in interp.facts_at(t) {
                if interp.is_derived(&atom, t) {
                    times_by_atom.entry(atom).or_default().push(t);
                }
            }
        }

        let mut derived_facts: Vec<TimedFact> = times_by_atom
            .into_iter()
            .enumerate()
            .map(|(i, (atom, times))| {
                TimedFact::new(atom, format!("derived:{}", i), intervals_from_timesteps(&times))
            })
            .collect();
        derived_facts.sort_by_key(|f| f.atom.to_string());

        {
            let mut inner = self.inner.lock();
            inner.reason_calls += 1;
            inner.last_derived_count = derived_facts.len();
        }

        let execution_ms = elapsed_ms(run_start);
        info!(
            start_time,
            end_time,
            derived = derived_facts.len(),
            execution_ms,
            "local reasoning complete"
        );
        WorkResult::ok(derived_facts, execution_ms)
    }

    /// Drop all facts, rules, and counters
    pub fn reset(&self) {
        *self.inner.lock() = WorkerInner::default();
    }

    /// Liveness: the worker is healthy when its state is reachable
    pub fn is_healthy(&self) -> bool {
        self.inner.try_lock().is_some()
    }

    /// Current counters
    pub fn stats(&self) -> WorkerStats {
        let inner = self.inner.lock();
        WorkerStats {
            fact_count: inner.facts.len(),
            rule_count: inner.rules.len(),
            derived_fact_count: inner.derived.len(),
            reason_calls: inner.reason_calls,
            last_derived_count: inner.last_derived_count,
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_core::{parse_rule, parse_timed_fact, Interval};

    fn worker_with_friendship() -> ReasonerWorker {
        let worker = ReasonerWorker::new();
        worker.add_rule(parse_rule("r1", "friend(x,y) <-1 knows(x,y)").unwrap());
        worker.add_rule(parse_rule("r2", "friend(x,z) <-1 friend(x,y), knows(y,z)").unwrap());
        worker.add_fact(parse_timed_fact("f1", "knows(Alice,Bob)@[0,10]").unwrap());
        worker.add_fact(parse_timed_fact("f2", "knows(Bob,Charlie)@[0,10]").unwrap());
        worker
    }

    fn ground(pred: &str, args: &[&str]) -> Atom {
        use tide_core::Term;
        Atom::new(pred, args.iter().map(|a| Term::constant(*a)).collect())
    }

    #[test]
    fn test_reason_reports_derived_in_range() {
        let worker = worker_with_friendship();
        let result = worker.reason(0, 10);

        assert!(result.success);
        assert!(result.error.is_none());
        assert!(!result.derived_facts.is_empty());

        let alice_charlie = result
            .derived_facts
            .iter()
            .find(|f| f.atom == ground("friend", &["Alice", "Charlie"]))
            .expect("transitive friendship derived");
        // Derived from t=2 through the horizon, compacted into one interval
        assert_eq!(alice_charlie.intervals, vec![Interval::new(2, 10)]);
    }

    #[test]
    fn test_reason_window_filters_times() {
        let worker = worker_with_friendship();
        let result = worker.reason(3, 5);

        assert!(result.success);
        for fact in &result.derived_facts {
            for interval in &fact.intervals {
                assert!(interval.start >= 3 && interval.end <= 5);
            }
        }
    }

    #[test]
    fn test_inverted_range_fails_without_panicking() {
        let worker = worker_with_friendship();
        let result = worker.reason(5, 2);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("exceeds"));
    }

    #[test]
    fn test_derived_facts_from_peers_join_the_base() {
        let worker = ReasonerWorker::new();
        worker.add_rule(parse_rule("lift", "reach(x,y) <-0 hop(x,y)").unwrap());
        worker.add_derived_facts(vec![parse_timed_fact("peer", "hop(A,B)@[0,4]").unwrap()]);

        let result = worker.reason(0, 4);
        assert!(result.success);
        assert!(result
            .derived_facts
            .iter()
            .any(|f| f.atom == ground("reach", &["A", "B"])));
    }

    #[test]
    fn test_reset_clears_state() {
        let worker = worker_with_friendship();
        worker.reason(0, 5);
        assert!(worker.stats().reason_calls > 0);

        worker.reset();
        let stats = worker.stats();
        assert_eq!(stats.fact_count, 0);
        assert_eq!(stats.rule_count, 0);
        assert_eq!(stats.reason_calls, 0);

        let result = worker.reason(0, 5);
        assert!(result.success);
        assert!(result.derived_facts.is_empty());
    }

    #[test]
    fn test_stats_and_health() {
        let worker = worker_with_friendship();
        assert!(worker.is_healthy());

        let stats = worker.stats();
        assert_eq!(stats.fact_count, 2);
        assert_eq!(stats.rule_count, 2);
        assert_eq!(stats.reason_calls, 0);

        worker.reason(0, 10);
        assert_eq!(worker.stats().reason_calls, 1);
        assert!(worker.stats().last_derived_count > 0);
    }

    #[test]
    fn test_rules_and_facts_round_trip_through_serde() {
        let rule = parse_rule("r1", "friend(x,z) <-1 friend(x,y), not blocked(x,y)").unwrap();
        let encoded = serde_json::to_vec(&rule).unwrap();
        let decoded: Rule = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(rule, decoded);

        let fact = parse_timed_fact("f", "at(Alice,RoomA)@[0,2]@[5,8]").unwrap();
        let encoded = serde_json::to_string(&fact).unwrap();
        let decoded: TimedFact = serde_json::from_str(&encoded).unwrap();
        assert_eq!(fact, decoded);
    }
}
