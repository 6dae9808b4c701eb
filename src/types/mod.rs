//! Core data types for the delivery dispatcher
//!
//! ## Types
//!
//! - [`OrderRecord`]: A tracked order with its priority and ETA
//! - [`Delivery`]: An order retired by the completion sweep
//! - [`Created`], [`Updated`], [`Cancelled`], [`Rank`]: Command outcomes
//!
//! Times, values and durations are plain `u64` simulated units. The priority
//! score is the only floating-point quantity.

mod order;
mod outcome;

// Re-export all types at module level
pub use order::{priority_score, OrderId, OrderRecord, TIME_WEIGHT, VALUE_SCALE, VALUE_WEIGHT};
pub use outcome::{Cancelled, Created, Delivery, Rank, Updated};
