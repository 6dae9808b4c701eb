//! Single-vehicle dispatch engine.
//!
//! ## Architecture
//!
//! The engine keeps one order set under three views:
//!
//! - **orders**: `HashMap<OrderId, OrderRecord>`, the records themselves
//! - **priority_index**: [`BalancedIndex`] keyed by priority score
//! - **eta_index**: [`BalancedIndex`] keyed by ETA
//!
//! Both indices store order ids as payloads. After every public call each
//! tracked order sits in both indices under its current `priority` and `eta`.
//!
//! ## Rescheduling
//!
//! [`DispatchEngine::recompute_etas`] walks the orders in descending priority
//! with a scheduling clock that starts at the current time:
//!
//! ```text
//! in flight (departure < now < eta)   keep eta
//! delivered, not yet swept (eta<=now) keep eta
//! the order being created             eta = max(now, clock) + duration
//! any other order                     eta = clock + duration
//! then                                clock = eta + duration  (return leg)
//! ```
//!
//! When any indexed ETA moved, the ETA index is rebuilt in one pass from a
//! snapshot sorted by the new ETAs instead of re-keying orders one by one.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::engine::{Action, DispatchError};
use crate::index::BalancedIndex;
use crate::types::{Cancelled, Created, Delivery, OrderId, OrderRecord, Rank, Updated};

/// Delivery dispatcher for a single vehicle.
///
/// One engine is built per simulation run and torn down with
/// [`DispatchEngine::finish`], which reports nothing.
#[derive(Debug, Clone, Default)]
pub struct DispatchEngine {
    /// Order ids keyed by priority score (ascending)
    priority_index: BalancedIndex<OrderId>,

    /// Order ids keyed by ETA (ascending)
    eta_index: BalancedIndex<OrderId>,

    /// Tracked orders
    orders: HashMap<OrderId, OrderRecord>,

    /// Simulated clock, advanced by `create_order`
    current_time: u64,
}

impl DispatchEngine {
    /// Create an empty engine at time 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with room for `capacity` orders
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            priority_index: BalancedIndex::with_capacity(capacity),
            eta_index: BalancedIndex::with_capacity(capacity),
            orders: HashMap::with_capacity(capacity),
            current_time: 0,
        }
    }

    // ========================================================================
    // Size and Clock
    // ========================================================================

    /// Number of tracked orders
    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if no order is tracked
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Current simulated time
    #[inline]
    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Create and schedule a new order
    ///
    /// Advances the clock to `time`, ranks the order, re-times every order
    /// that has not started, then retires orders whose ETA has passed.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::DuplicateOrder`] if `id` is already tracked
    /// - [`DispatchError::ScheduleOverflow`] if the new schedule does not fit
    ///   in `u64`
    ///
    /// The engine is left untouched on error, including the clock.
    pub fn create_order(
        &mut self,
        id: OrderId,
        time: u64,
        value: u64,
        duration: u64,
    ) -> Result<Created, DispatchError> {
        if self.orders.contains_key(&id) {
            warn!(order_id = id, "rejected duplicate order");
            return Err(DispatchError::DuplicateOrder { id });
        }

        let previous_time = self.current_time;
        self.current_time = time;

        let order = OrderRecord::new(id, time, value, duration);
        self.priority_index.insert(order.priority, id);
        self.orders.insert(id, order);

        if let Err(err) = self.recompute_etas(Some(id)) {
            self.priority_index.remove_by_payload_id(id);
            self.orders.remove(&id);
            self.current_time = previous_time;
            warn!(order_id = id, time, duration, %err, "rejected order");
            return Err(err);
        }

        let eta = self.orders[&id].eta;
        self.eta_index.insert(eta as f64, id);

        let delivered = self.completion_sweep();

        info!(order_id = id, time, value, duration, eta, "order created");
        Ok(Created { id, eta, delivered })
    }

    /// Cancel an order that has not been delivered by `time`
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NotFound`] if `id` is not tracked
    /// - [`DispatchError::AlreadyDelivered`] if its ETA is at or before `time`
    pub fn cancel_order(&mut self, id: OrderId, time: u64) -> Result<Cancelled, DispatchError> {
        self.check_pending(id, time, Action::Cancel)?;

        self.retire(id);

        info!(order_id = id, time, "order cancelled");
        Ok(Cancelled { id })
    }

    /// Change the delivery duration of an order and reschedule everything
    ///
    /// The priority index is untouched since priority does not depend on
    /// duration.
    ///
    /// # Errors
    ///
    /// Same as [`DispatchEngine::cancel_order`], plus
    /// [`DispatchError::ScheduleOverflow`] when the new duration does not fit
    /// the schedule. The old duration is kept in that case.
    pub fn update_time(
        &mut self,
        id: OrderId,
        time: u64,
        new_duration: u64,
    ) -> Result<Updated, DispatchError> {
        self.check_pending(id, time, Action::Update)?;

        let Some(order) = self.orders.get_mut(&id) else {
            return Err(DispatchError::NotFound { id });
        };
        let old_duration = std::mem::replace(&mut order.delivery_duration, new_duration);

        if let Err(err) = self.recompute_etas(None) {
            if let Some(order) = self.orders.get_mut(&id) {
                order.delivery_duration = old_duration;
            }
            warn!(order_id = id, time, new_duration, %err, "rejected duration update");
            return Err(err);
        }

        let eta = self.orders[&id].eta;
        info!(order_id = id, time, new_duration, eta, "delivery time updated");
        Ok(Updated { id, eta })
    }

    /// Number of orders served before `id`
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] if `id` is not tracked.
    pub fn get_rank(&self, id: OrderId) -> Result<Rank, DispatchError> {
        if !self.orders.contains_key(&id) {
            return Err(DispatchError::NotFound { id });
        }

        let ahead = self
            .priority_index
            .in_order_traversal()
            .into_iter()
            .rev()
            .position(|other| other == id)
            .ok_or(DispatchError::NotFound { id })?;

        Ok(Rank { id, ahead })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up a tracked order
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] if `id` is not tracked.
    pub fn order(&self, id: OrderId) -> Result<&OrderRecord, DispatchError> {
        self.orders.get(&id).ok_or(DispatchError::NotFound { id })
    }

    /// Orders with `from <= eta <= to`, ascending by ETA
    ///
    /// ```
    /// use delivery_dispatch::engine::DispatchEngine;
    ///
    /// let mut engine = DispatchEngine::new();
    /// engine.create_order(1, 0, 100, 5).unwrap();
    /// engine.create_order(2, 1, 50, 3).unwrap();
    ///
    /// let ids: Vec<u64> = engine.orders_between(5, 13).iter().map(|o| o.id).collect();
    /// assert_eq!(ids, vec![1, 2]);
    /// assert!(engine.orders_between(6, 12).is_empty());
    /// ```
    pub fn orders_between(&self, from: u64, to: u64) -> Vec<&OrderRecord> {
        if from > to {
            return Vec::new();
        }
        self.eta_index
            .range(from as f64, to as f64)
            .into_iter()
            .filter_map(|id| self.orders.get(&id))
            .collect()
    }

    /// Order with the earliest ETA strictly after `after`
    pub fn next_delivery(&self, after: u64) -> Option<&OrderRecord> {
        self.eta_index
            .find_predecessor(after as f64)
            .and_then(|id| self.orders.get(&id))
    }

    /// Order ids in service order (descending priority)
    pub fn priority_order(&self) -> Vec<OrderId> {
        let mut ids = self.priority_index.in_order_traversal();
        ids.reverse();
        ids
    }

    /// Order ids ascending by ETA
    pub fn eta_order(&self) -> Vec<OrderId> {
        self.eta_index.in_order_traversal()
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Re-time every order that has not started
    ///
    /// `new_order` is the order being created, if any. It is not in the ETA
    /// index yet, so the caller indexes it afterwards.
    ///
    /// # Returns
    ///
    /// How many already indexed orders received a new ETA
    ///
    /// # Errors
    ///
    /// [`DispatchError::ScheduleOverflow`] if an ETA or return time would
    /// exceed `u64::MAX`. No ETA is changed in that case.
    pub fn recompute_etas(&mut self, new_order: Option<OrderId>) -> Result<usize, DispatchError> {
        let schedule = self.plan_etas(new_order)?;
        let mut retimed = 0;

        for (id, eta) in schedule {
            let Some(order) = self.orders.get_mut(&id) else {
                continue;
            };
            if order.eta != eta {
                order.eta = eta;
                if Some(id) != new_order {
                    retimed += 1;
                }
            }
        }

        if retimed > 0 {
            self.rebuild_eta_index();
        }

        debug!(now = self.current_time, retimed, tracked = self.orders.len(), "recomputed ETAs");
        Ok(retimed)
    }

    /// New ETA of every order that gets one, in service order
    ///
    /// Orders delivered but not yet swept are skipped. They only hold the
    /// vehicle until their return.
    fn plan_etas(&self, new_order: Option<OrderId>) -> Result<Vec<(OrderId, u64)>, DispatchError> {
        let now = self.current_time;
        let mut clock = now;
        let mut schedule = Vec::with_capacity(self.orders.len());

        for id in self.priority_order() {
            let Some(order) = self.orders.get(&id) else {
                continue;
            };
            let overflow = DispatchError::ScheduleOverflow { id };
            let duration = order.delivery_duration;

            let eta = if Some(id) == new_order {
                now.max(clock).checked_add(duration).ok_or(overflow)?
            } else if order.is_in_flight(now) {
                // Anchored
                order.eta
            } else if order.is_delivered_by(now) {
                let back = order.eta.checked_add(duration).ok_or(overflow)?;
                clock = clock.max(back);
                continue;
            } else {
                clock.checked_add(duration).ok_or(overflow)?
            };

            clock = eta.checked_add(duration).ok_or(overflow)?;
            schedule.push((id, eta));
        }

        Ok(schedule)
    }

    /// Retire every order whose ETA is before the current time
    ///
    /// Walks the ETA index in ascending order and stops at the first order
    /// that is not yet due.
    pub fn completion_sweep(&mut self) -> Vec<Delivery> {
        let now = self.current_time;
        let mut delivered = Vec::new();

        for id in self.eta_index.in_order_traversal() {
            match self.orders.get(&id) {
                Some(order) if order.eta < now => {}
                Some(_) => break,
                None => continue,
            }

            if let Some(order) = self.retire(id) {
                let delivery = Delivery::from_order(&order);
                info!(order_id = id, delivered_at = delivery.delivered_at, "order delivered");
                delivered.push(delivery);
            }
        }

        delivered
    }

    /// Tear the engine down
    ///
    /// Nothing is delivered. The orders still tracked are handed back in
    /// ascending ETA order.
    pub fn finish(mut self) -> Vec<OrderRecord> {
        let remaining: Vec<OrderRecord> = self
            .eta_index
            .in_order_traversal()
            .into_iter()
            .filter_map(|id| self.orders.remove(&id))
            .collect();

        debug!(remaining = remaining.len(), now = self.current_time, "engine finished");
        remaining
    }

    // ========================================================================
    // State Root
    // ========================================================================

    /// SHA-256 over every tracked order in ascending ETA order
    ///
    /// Each order contributes `id, creation_time, value, delivery_duration,
    /// eta` as little-endian `u64`s. Identical command sequences give
    /// identical roots.
    pub fn state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for id in self.eta_index.in_order_traversal() {
            if let Some(order) = self.orders.get(&id) {
                hasher.update(order.id.to_le_bytes());
                hasher.update(order.creation_time.to_le_bytes());
                hasher.update(order.value.to_le_bytes());
                hasher.update(order.delivery_duration.to_le_bytes());
                hasher.update(order.eta.to_le_bytes());
            }
        }

        let mut root = [0u8; 32];
        root.copy_from_slice(&hasher.finalize());
        root
    }

    /// State root as a hex string
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root())
    }

    /// Check that both indices hold exactly the tracked orders under their
    /// current keys and are balanced
    ///
    /// O(n^2); meant for tests and debugging.
    pub fn check_consistency(&self) -> bool {
        if self.priority_index.len() != self.orders.len()
            || self.eta_index.len() != self.orders.len()
            || !self.priority_index.is_balanced()
            || !self.eta_index.is_balanced()
        {
            return false;
        }

        self.orders.values().all(|order| {
            self.priority_index.find_by_payload_id(order.id) == Some(order.priority)
                && self.eta_index.find_by_payload_id(order.id) == Some(order.eta as f64)
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn check_pending(&self, id: OrderId, time: u64, action: Action) -> Result<(), DispatchError> {
        let order = self.orders.get(&id).ok_or(DispatchError::NotFound { id })?;
        if order.is_delivered_by(time) {
            warn!(order_id = id, time, eta = order.eta, %action, "order already delivered");
            return Err(DispatchError::AlreadyDelivered { id, action });
        }
        Ok(())
    }

    /// Remove an order from the table and both indices
    fn retire(&mut self, id: OrderId) -> Option<OrderRecord> {
        let order = self.orders.remove(&id)?;
        self.priority_index.remove_by_payload_id(id);
        self.eta_index.remove_by_payload_id(id);
        Some(order)
    }

    fn rebuild_eta_index(&mut self) {
        let orders = &self.orders;
        let eta_of = |id: &OrderId| orders.get(id).map_or(0, |order| order.eta);

        let mut snapshot = self.eta_index.in_order_traversal();
        snapshot.sort_by_key(eta_of);
        self.eta_index
            .rebuild_from_sorted(&snapshot, |id| eta_of(id) as f64);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
