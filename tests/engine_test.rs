//! Scenario tests for the dispatch engine.
//!
//! Each test drives the public engine API through a short command trace and
//! checks ETAs, ranks, the completion sweep and the consistency of both
//! indices.

use delivery_dispatch::engine::{Action, DispatchEngine, DispatchError};
use delivery_dispatch::types::{Delivery, OrderRecord};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Everything observable about an engine, for before/after comparisons
#[derive(Debug, PartialEq)]
struct Snapshot {
    records: Vec<OrderRecord>,
    priority_order: Vec<u64>,
    eta_order: Vec<u64>,
    state_root: [u8; 32],
}

fn snapshot(engine: &DispatchEngine) -> Snapshot {
    let eta_order = engine.eta_order();
    let records = eta_order
        .iter()
        .map(|&id| engine.order(id).unwrap().clone())
        .collect();
    Snapshot {
        records,
        priority_order: engine.priority_order(),
        eta_order,
        state_root: engine.state_root(),
    }
}

/// Orders 1 (ETA 5) and 2 (ETA 13) from the reference trace
fn two_order_engine() -> DispatchEngine {
    let mut engine = DispatchEngine::new();
    engine.create_order(1, 0, 100, 5).unwrap();
    engine.create_order(2, 1, 50, 3).unwrap();
    engine
}

// ============================================================================
// CREATION AND RANKING
// ============================================================================

#[test]
fn reference_trace() {
    let mut engine = DispatchEngine::new();

    let first = engine.create_order(1, 0, 100, 5).unwrap();
    assert_eq!(first.eta, 5);
    assert!((engine.order(1).unwrap().priority - 0.6).abs() < 1e-9);

    let second = engine.create_order(2, 1, 50, 3).unwrap();
    assert!((engine.order(2).unwrap().priority - (-0.4)).abs() < 1e-9);
    assert_eq!(second.eta, 13);
    assert!(second.delivered.is_empty());

    assert_eq!(engine.order(1).unwrap().eta, 5);
    assert_eq!(engine.priority_order(), vec![1, 2]);
    assert_eq!(engine.eta_order(), vec![1, 2]);
    assert!(engine.check_consistency());
}

#[test]
fn departure_boundary_is_not_in_flight() {
    // At time 0 order 1 (ETA 5, duration 5) departs exactly now: it is not
    // anchored, so a higher-priority order created at time 0 goes first
    let mut engine = DispatchEngine::new();
    engine.create_order(1, 0, 100, 5).unwrap();

    let created = engine.create_order(2, 0, 500, 2).unwrap();

    assert_eq!(created.eta, 2);
    assert_eq!(engine.order(1).unwrap().eta, 9);
    assert_eq!(engine.eta_order(), vec![2, 1]);
    assert!(engine.check_consistency());
}

#[test]
fn in_flight_order_is_anchored() {
    // One time unit later order 1 is on the road and keeps its ETA even
    // though order 2 outranks it
    let mut engine = DispatchEngine::new();
    engine.create_order(1, 0, 100, 5).unwrap();

    let created = engine.create_order(2, 1, 500, 2).unwrap();

    assert_eq!(engine.priority_order(), vec![2, 1]);
    assert_eq!(created.eta, 3);
    assert_eq!(engine.order(1).unwrap().eta, 5);
    assert_eq!(engine.get_rank(1).unwrap().ahead, 1);
    assert!(engine.check_consistency());
}

#[test]
fn anchored_eta_survives_repeated_recompute() {
    let mut engine = two_order_engine();
    let before = snapshot(&engine);

    for _ in 0..5 {
        assert_eq!(engine.recompute_etas(None), Ok(0));
        assert_eq!(engine.order(1).unwrap().eta, 5);
    }

    assert_eq!(snapshot(&engine), before);
}

#[test]
fn new_order_waits_for_round_trips() {
    let mut engine = DispatchEngine::new();
    engine.create_order(1, 0, 1_000, 4).unwrap();
    engine.create_order(2, 0, 800, 3).unwrap();
    let third = engine.create_order(3, 0, 600, 2).unwrap();

    // 4 + 4 back, 3 + 3 back, then 2 out
    assert_eq!(engine.order(1).unwrap().eta, 4);
    assert_eq!(engine.order(2).unwrap().eta, 11);
    assert_eq!(third.eta, 16);
    assert_eq!(engine.get_rank(3).unwrap().ahead, 2);
}

#[test]
fn duplicate_create_is_rejected_without_mutation() {
    let mut engine = two_order_engine();
    let before = snapshot(&engine);

    assert_eq!(
        engine.create_order(2, 40, 1, 1),
        Err(DispatchError::DuplicateOrder { id: 2 })
    );
    assert_eq!(engine.current_time(), 1);
    assert_eq!(snapshot(&engine), before);
}

// ============================================================================
// GUARDED MUTATION
// ============================================================================

#[test]
fn cancel_unknown_order() {
    let mut engine = two_order_engine();
    let before = snapshot(&engine);

    assert_eq!(engine.cancel_order(99, 0), Err(DispatchError::NotFound { id: 99 }));
    assert_eq!(engine.update_time(99, 0, 1), Err(DispatchError::NotFound { id: 99 }));
    assert_eq!(engine.get_rank(99), Err(DispatchError::NotFound { id: 99 }));
    assert_eq!(snapshot(&engine), before);
}

#[test]
fn cancel_delivered_order_is_refused() {
    let mut engine = two_order_engine();
    let before = snapshot(&engine);

    // ETA 5 <= 5 counts as delivered
    assert_eq!(
        engine.cancel_order(1, 5),
        Err(DispatchError::AlreadyDelivered { id: 1, action: Action::Cancel })
    );
    assert_eq!(
        engine.update_time(1, 7, 2),
        Err(DispatchError::AlreadyDelivered { id: 1, action: Action::Update })
    );
    assert_eq!(snapshot(&engine), before);
    assert!(engine.check_consistency());
}

#[test]
fn cancel_pending_order() {
    let mut engine = two_order_engine();

    let cancelled = engine.cancel_order(2, 4).unwrap();

    assert_eq!(cancelled.id, 2);
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.order(2), Err(DispatchError::NotFound { id: 2 }));
    assert_eq!(engine.eta_order(), vec![1]);
    assert!(engine.check_consistency());
}

#[test]
fn update_time_ripples_to_later_orders() {
    let mut engine = DispatchEngine::new();
    engine.create_order(1, 0, 1_000, 4).unwrap();
    engine.create_order(2, 0, 800, 3).unwrap();
    engine.create_order(3, 0, 600, 2).unwrap();

    let updated = engine.update_time(1, 0, 1).unwrap();

    assert_eq!(updated.eta, 1);
    // 1 + 1 back, then 3
    assert_eq!(engine.order(2).unwrap().eta, 5);
    // 5 + 3 back, then 2
    assert_eq!(engine.order(3).unwrap().eta, 10);
    // Priority does not depend on duration
    assert_eq!(engine.priority_order(), vec![1, 2, 3]);
    assert!(engine.check_consistency());
}

#[test]
fn update_time_keeps_anchored_predecessor() {
    let mut engine = two_order_engine();

    let updated = engine.update_time(2, 2, 4).unwrap();

    // Order 1 is in flight at the engine clock (1), back at 10
    assert_eq!(engine.order(1).unwrap().eta, 5);
    assert_eq!(updated.eta, 14);
    assert!(engine.check_consistency());
}

// ============================================================================
// COMPLETION SWEEP
// ============================================================================

#[test]
fn sweep_retires_passed_orders_in_eta_order() {
    let mut engine = two_order_engine();

    let created = engine.create_order(3, 14, 100, 1).unwrap();

    assert_eq!(
        created.delivered,
        vec![
            Delivery { id: 1, delivered_at: 5 },
            Delivery { id: 2, delivered_at: 13 },
        ]
    );
    // The vehicle is back from order 2 at 16
    assert_eq!(created.eta, 17);
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.order(1), Err(DispatchError::NotFound { id: 1 }));
    assert!(engine.check_consistency());
}

#[test]
fn sweep_stops_at_first_pending_order() {
    let mut engine = two_order_engine();

    // ETA 13 is not before 13, so only order 1 is retired
    let created = engine.create_order(3, 13, 100, 1).unwrap();

    assert_eq!(created.delivered, vec![Delivery { id: 1, delivered_at: 5 }]);
    assert_eq!(engine.order(2).unwrap().eta, 13);
    assert!(engine.eta_order().contains(&2));
    assert!(engine.check_consistency());
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn range_query_is_inclusive_and_ascending() {
    let mut engine = DispatchEngine::new();
    engine.create_order(1, 0, 1_000, 4).unwrap();
    engine.create_order(2, 0, 800, 3).unwrap();
    engine.create_order(3, 0, 600, 2).unwrap();

    let ids = |from, to| -> Vec<u64> {
        engine.orders_between(from, to).iter().map(|o| o.id).collect()
    };

    assert_eq!(ids(0, 100), vec![1, 2, 3]);
    assert_eq!(ids(4, 11), vec![1, 2]);
    assert_eq!(ids(5, 10), Vec::<u64>::new());
    assert_eq!(ids(16, 16), vec![3]);
    assert_eq!(ids(20, 0), Vec::<u64>::new());
}

#[test]
fn finish_hands_back_pending_orders() {
    let mut engine = DispatchEngine::new();
    engine.create_order(1, 0, 1_000, 4).unwrap();
    engine.create_order(2, 0, 800, 3).unwrap();
    engine.cancel_order(1, 0).unwrap();

    let pending = engine.finish();

    assert_eq!(pending.len(), 1);
    assert_eq!((pending[0].id, pending[0].eta), (2, 11));
}

// ============================================================================
// SCHEDULE LIMITS
// ============================================================================

#[test]
fn overflowing_create_is_rejected_without_mutation() {
    let mut engine = two_order_engine();
    let before = snapshot(&engine);

    assert_eq!(
        engine.create_order(3, 2, 100, u64::MAX),
        Err(DispatchError::ScheduleOverflow { id: 3 })
    );
    assert_eq!(engine.current_time(), 1);
    assert_eq!(snapshot(&engine), before);
    assert!(engine.check_consistency());

    // The engine keeps working afterwards
    assert_eq!(engine.create_order(3, 2, 100, 1).unwrap().id, 3);
    assert!(engine.check_consistency());
}

#[test]
fn overflowing_update_is_rejected_without_mutation() {
    let mut engine = two_order_engine();
    let before = snapshot(&engine);

    assert_eq!(
        engine.update_time(2, 2, u64::MAX - 5),
        Err(DispatchError::ScheduleOverflow { id: 2 })
    );
    assert_eq!(snapshot(&engine), before);
}
