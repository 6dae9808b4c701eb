//! Stress tests for the delivery dispatcher.
//!
//! These tests verify:
//! 1. Index invariants hold across long randomized command sequences
//! 2. The completion sweep never leaves an overdue order behind
//! 3. Determinism is preserved across runs
//!
//! ## Running Stress Tests
//!
//! ```bash
//! # Run all stress tests (release mode recommended)
//! cargo test --release --test stress_test -- --nocapture
//! ```

use std::time::Instant;

use delivery_dispatch::{BalancedIndex, DispatchEngine, DispatchError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

/// Number of commands in the randomized engine runs
const COMMAND_COUNT: usize = 20_000;

/// Full consistency check interval (the check is O(n^2))
const CHECK_EVERY: usize = 250;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Outcome counters for one randomized run
#[derive(Debug, Default)]
struct RunStats {
    created: usize,
    delivered: usize,
    cancelled: usize,
    updated: usize,
    refused: usize,
}

/// Drive an engine with a seeded command mix.
///
/// Time advances monotonically. Cancels and updates target random ids that
/// may be pending, delivered or already gone.
fn run_deterministic_sequence(seed: u64, count: usize, check: bool) -> (DispatchEngine, RunStats) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut engine = DispatchEngine::with_capacity(1_024);
    let mut stats = RunStats::default();
    let mut now: u64 = 0;
    let mut next_id: u64 = 1;

    for step in 0..count {
        match rng.gen_range(0..10) {
            0..=5 => {
                now += rng.gen_range(0..=20);
                let value = rng.gen_range(1..=500);
                let duration = rng.gen_range(1..=5);

                let created = engine.create_order(next_id, now, value, duration).unwrap();
                next_id += 1;
                stats.created += 1;

                // Sweep reports ascending ETAs, all strictly before now
                assert!(created.delivered.windows(2).all(|w| w[0].delivered_at <= w[1].delivered_at));
                assert!(created.delivered.iter().all(|d| d.delivered_at < now));
                assert!(created.eta >= now + duration);
                stats.delivered += created.delivered.len();

                // Nothing overdue survives the sweep
                if let Some(&first) = engine.eta_order().first() {
                    assert!(engine.order(first).unwrap().eta >= now);
                }
            }
            6 | 7 => {
                let id = rng.gen_range(1..next_id.max(2));
                match engine.cancel_order(id, now) {
                    Ok(_) => stats.cancelled += 1,
                    Err(DispatchError::NotFound { .. }) | Err(DispatchError::AlreadyDelivered { .. }) => {
                        stats.refused += 1
                    }
                    Err(err) => panic!("unexpected error {err}"),
                }
            }
            _ => {
                let id = rng.gen_range(1..next_id.max(2));
                let duration = rng.gen_range(1..=5);
                match engine.update_time(id, now, duration) {
                    Ok(_) => stats.updated += 1,
                    Err(_) => stats.refused += 1,
                }
            }
        }

        if check && step % CHECK_EVERY == 0 {
            assert!(engine.check_consistency(), "inconsistent after step {step}");
        }
    }

    (engine, stats)
}

// ============================================================================
// STRESS TESTS
// ============================================================================

/// Randomized command mix with periodic full consistency checks.
#[test]
fn stress_random_commands() {
    println!("\n=== STRESS TEST: {} Commands ===\n", COMMAND_COUNT);

    let start = Instant::now();
    let (engine, stats) = run_deterministic_sequence(42, COMMAND_COUNT, true);
    let elapsed = start.elapsed();

    println!("  Created:           {:>12}", stats.created);
    println!("  Delivered:         {:>12}", stats.delivered);
    println!("  Cancelled:         {:>12}", stats.cancelled);
    println!("  Updated:           {:>12}", stats.updated);
    println!("  Refused:           {:>12}", stats.refused);
    println!("  Still tracked:     {:>12}", engine.len());
    println!("  Elapsed time:      {:>12.2?}", elapsed);
    println!("  State root:        {}", engine.state_root_hex());

    assert!(engine.check_consistency());
    assert!(stats.created > 0 && stats.delivered > 0);
    assert_eq!(
        stats.created,
        stats.delivered + stats.cancelled + engine.len(),
        "every created order is delivered, cancelled, or still tracked"
    );

    // Every remaining order keeps eta >= creation time
    for id in engine.eta_order() {
        let order = engine.order(id).unwrap();
        assert!(order.eta >= order.creation_time);
    }

    println!("\n=== STRESS TEST PASSED ===\n");
}

/// Verify determinism: Same sequence produces identical state root.
#[test]
fn verify_determinism() {
    println!("\n=== DETERMINISM TEST ===\n");

    const TEST_COUNT: usize = 5_000;
    const SEED: u64 = 12345;

    let (run1, _) = run_deterministic_sequence(SEED, TEST_COUNT, false);
    let (run2, _) = run_deterministic_sequence(SEED, TEST_COUNT, false);

    println!("  Run 1 state root: {}", run1.state_root_hex());
    println!("  Run 2 state root: {}", run2.state_root_hex());
    assert_eq!(run1.state_root(), run2.state_root(), "State roots must match for determinism");

    let (run3, _) = run_deterministic_sequence(SEED + 1, TEST_COUNT, false);
    println!("  Different seed:   {}", run3.state_root_hex());
    assert_ne!(run1.state_root(), run3.state_root(), "Different seeds should produce different roots");

    println!("\n=== DETERMINISM VERIFIED ===\n");
}

/// Large index workload: AVL invariant and ordering after bulk churn.
#[test]
fn stress_index_churn() {
    println!("\n=== INDEX CHURN TEST ===\n");

    const NODE_COUNT: u64 = 10_000;

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut index: BalancedIndex<u64> = BalancedIndex::with_capacity(NODE_COUNT as usize);

    let start = Instant::now();
    for id in 0..NODE_COUNT {
        index.insert(rng.gen_range(-1_000.0..1_000.0), id);
    }
    let insert_time = start.elapsed();

    // Height stays within the AVL bound of ~1.44 log2(n)
    let bound = (1.45 * ((NODE_COUNT + 2) as f64).log2()).ceil() as u32;
    assert!(index.height() <= bound, "height {} above {}", index.height(), bound);
    assert!(index.is_balanced());

    let start = Instant::now();
    for id in (0..NODE_COUNT).step_by(3) {
        assert_eq!(index.remove_by_payload_id(id), Some(id));
    }
    let remove_time = start.elapsed();

    assert!(index.is_balanced());
    assert_eq!(index.len(), (NODE_COUNT - NODE_COUNT.div_ceil(3)) as usize);

    println!("  Inserted {} nodes in {:.2?}", NODE_COUNT, insert_time);
    println!("  Removed every 3rd by id in {:.2?}", remove_time);
    println!("  Final height: {}", index.height());

    println!("\n=== INDEX CHURN PASSED ===\n");
}
