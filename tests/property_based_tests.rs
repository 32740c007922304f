//! Property-based tests for the aggregate and the proxy
//!
//! Core properties:
//! 1. Export order does not depend on insertion order
//! 2. Export is repeatable without intervening records
//! 3. Cumulative values equal the sum of recorded durations
//! 4. Unmarked operations are transparent and never recorded
//! 5. Marked operations record exactly the simulated duration

use calltime::{profiled_interface, ManualClock, OperationId, Profiler, ProfilingState};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const TYPES: &[&str] = &["app::Crawler", "app::ParallelCrawler", "app::Parser"];
const OPERATIONS: &[OperationId] = &[
    OperationId {
        name: "crawl",
        signature: "fn crawl(&self, url: &str)",
    },
    OperationId {
        name: "parse",
        signature: "fn parse(&self, body: &str)",
    },
    OperationId {
        name: "parse",
        signature: "fn parse(&self, body: &str, strict: bool)",
    },
];

fn records() -> impl Strategy<Value = Vec<(usize, usize, u64)>> {
    prop::collection::vec((0..TYPES.len(), 0..OPERATIONS.len(), 0u64..10_000), 0..64)
}

fn fill(state: &ProfilingState, records: &[(usize, usize, u64)]) {
    for &(ty, op, micros) in records {
        state.record(TYPES[ty], OPERATIONS[op], Duration::from_micros(micros));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_export_independent_of_insertion_order(records in records()) {
        let forward = ProfilingState::new();
        fill(&forward, &records);

        let mut reversed_records = records.clone();
        reversed_records.reverse();
        let reversed = ProfilingState::new();
        fill(&reversed, &reversed_records);

        prop_assert_eq!(forward.export(), reversed.export());
    }

    #[test]
    fn prop_export_is_repeatable(records in records()) {
        let state = ProfilingState::new();
        fill(&state, &records);

        let first = state.export();
        let second = state.export();
        prop_assert_eq!(&first, &second);

        let mut first_text = Vec::new();
        let mut second_text = Vec::new();
        state.write_text(&mut first_text).unwrap();
        state.write_text(&mut second_text).unwrap();
        prop_assert_eq!(first_text, second_text);
    }

    #[test]
    fn prop_export_is_sorted(records in records()) {
        let state = ProfilingState::new();
        fill(&state, &records);

        let keys: Vec<_> = state
            .export()
            .iter()
            .map(|e| (e.target_type, e.operation, e.signature))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }

    #[test]
    fn prop_cumulative_value_is_sum(records in records()) {
        let state = ProfilingState::new();
        fill(&state, &records);

        let mut expected: BTreeMap<(&str, OperationId), (u64, Duration)> = BTreeMap::new();
        for &(ty, op, micros) in &records {
            let entry = expected.entry((TYPES[ty], OPERATIONS[op])).or_default();
            entry.0 += 1;
            entry.1 += Duration::from_micros(micros);
        }

        let exported = state.export();
        prop_assert_eq!(exported.len(), expected.len());
        for entry in exported {
            let op = OperationId { name: entry.operation, signature: entry.signature };
            let (calls, elapsed) = expected[&(entry.target_type, op)];
            prop_assert_eq!(entry.calls, calls);
            prop_assert_eq!(entry.elapsed, elapsed);
        }
    }
}

profiled_interface! {
    pub trait Scorer {
        profiled fn score(&self, text: &str) -> Result<u32, String>;
        passthrough fn weight(&self, text: &str, factor: u32) -> u64;
    }
}

struct LengthScorer {
    clock: Arc<ManualClock>,
    cost_per_byte: Duration,
}

impl Scorer for LengthScorer {
    fn score(&self, text: &str) -> Result<u32, String> {
        self.clock.advance(self.cost_per_byte * text.len() as u32);
        if text.contains('!') {
            Err(format!("rejected: {text}"))
        } else {
            Ok(text.len() as u32)
        }
    }

    fn weight(&self, text: &str, factor: u32) -> u64 {
        text.chars().filter(|c| c.is_alphabetic()).count() as u64 * u64::from(factor)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_unmarked_operation_is_transparent(
        inputs in prop::collection::vec(("[a-z!]{0,12}", 0u32..100), 1..20),
    ) {
        let clock = Arc::new(ManualClock::new());
        let profiler = Profiler::new(clock.clone());
        let direct = LengthScorer { clock: clock.clone(), cost_per_byte: Duration::from_micros(10) };
        let proxied = profiler
            .wrap::<dyn Scorer, _>(LengthScorer { clock, cost_per_byte: Duration::from_micros(10) })
            .unwrap();

        for (text, factor) in &inputs {
            prop_assert_eq!(proxied.weight(text, *factor), direct.weight(text, *factor));
        }
        prop_assert!(profiler.state().is_empty());
    }

    #[test]
    fn prop_marked_operation_records_simulated_time(
        texts in prop::collection::vec("[a-z!]{0,12}", 1..20),
    ) {
        let clock = Arc::new(ManualClock::new());
        let profiler = Profiler::new(clock.clone());
        let cost = Duration::from_micros(25);
        let proxied = profiler
            .wrap::<dyn Scorer, _>(LengthScorer { clock: clock.clone(), cost_per_byte: cost })
            .unwrap();

        let mut expected = Duration::ZERO;
        for text in &texts {
            let outcome = proxied.score(text);
            if text.contains('!') {
                prop_assert_eq!(outcome, Err(format!("rejected: {text}")));
            } else {
                prop_assert_eq!(outcome, Ok(text.len() as u32));
            }
            expected += cost * text.len() as u32;
        }

        let stats = profiler
            .state()
            .stats(std::any::type_name::<LengthScorer>(), "score")
            .unwrap();
        prop_assert_eq!(stats.calls, texts.len() as u64);
        prop_assert_eq!(stats.elapsed, expected);
        prop_assert_eq!(clock.elapsed(), expected);
    }
}
