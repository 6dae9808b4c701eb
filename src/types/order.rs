//! Order record for the delivery dispatcher.
//!
//! ## Priority Score
//!
//! Every order carries a priority derived once, at creation:
//!
//! ```text
//! priority = 0.3 * (value / 50) - 0.7 * creation_time
//! ```
//!
//! Higher scores are served first. The score is never recomputed, so a
//! change of delivery duration leaves an order's rank untouched.
//!
//! ## ETA
//!
//! `eta` is an absolute simulated time owned by the dispatch engine. A freshly
//! built record has `eta == 0` until its first scheduling pass.

/// Divisor applied to the raw order value before weighting.
pub const VALUE_SCALE: f64 = 50.0;

/// Weight of the normalized value in the priority score.
pub const VALUE_WEIGHT: f64 = 0.3;

/// Weight of the creation time in the priority score (subtracted).
pub const TIME_WEIGHT: f64 = 0.7;

/// Caller-supplied order identity.
pub type OrderId = u64;

/// One tracked order and its derived scheduling attributes.
///
/// ## Example
///
/// ```
/// use delivery_dispatch::types::OrderRecord;
///
/// let order = OrderRecord::new(1, 0, 100, 5);
/// assert_eq!(order.normalized_value(), 2.0);
/// assert!((order.priority - 0.6).abs() < 1e-9);
/// assert_eq!(order.eta, 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// Unique order identifier
    pub id: OrderId,

    /// Simulated clock value at creation
    pub creation_time: u64,

    /// Monetary value of the order
    pub value: u64,

    /// One-way service time, also charged for the return leg
    pub delivery_duration: u64,

    /// Ranking score, higher serves first
    pub priority: f64,

    /// Absolute completion time assigned by the engine
    pub eta: u64,
}

impl OrderRecord {
    /// Create a new, not yet scheduled order
    ///
    /// # Arguments
    ///
    /// * `id` - Unique order identifier
    /// * `creation_time` - Current simulated time
    /// * `value` - Order value
    /// * `delivery_duration` - One-way delivery time
    pub fn new(id: OrderId, creation_time: u64, value: u64, delivery_duration: u64) -> Self {
        Self {
            id,
            creation_time,
            value,
            delivery_duration,
            priority: priority_score(value, creation_time),
            eta: 0,
        }
    }

    /// Value divided by [`VALUE_SCALE`]
    #[inline]
    pub fn normalized_value(&self) -> f64 {
        self.value as f64 / VALUE_SCALE
    }

    /// Time at which the vehicle leaves for this order
    ///
    /// Saturates at zero for records that have not been scheduled yet.
    #[inline]
    pub fn departure_time(&self) -> u64 {
        self.eta.saturating_sub(self.delivery_duration)
    }

    /// Check whether the delivery is under way at `now`
    ///
    /// True when the ETA lies in the future but the departure is already in
    /// the past: `departure < now < eta`. Such an order is anchored and its
    /// ETA is not moved by rescheduling.
    #[inline]
    pub fn is_in_flight(&self, now: u64) -> bool {
        self.eta > now && now > self.departure_time()
    }

    /// Check whether the order counts as delivered relative to `time`
    #[inline]
    pub fn is_delivered_by(&self, time: u64) -> bool {
        self.eta <= time
    }
}

/// Compute the priority score for an order value created at `creation_time`
pub fn priority_score(value: u64, creation_time: u64) -> f64 {
    VALUE_WEIGHT * (value as f64 / VALUE_SCALE) - TIME_WEIGHT * creation_time as f64
}

// ============================================================================
// Unit Tests
// ============================================================================
