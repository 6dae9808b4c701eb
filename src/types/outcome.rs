//! Reportable results of dispatch engine calls.
//!
//! Each outcome renders to exactly one protocol line through `Display`.

use std::fmt;

use crate::types::{OrderId, OrderRecord};

/// An order retired by the completion sweep or by engine teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Delivered order
    pub id: OrderId,

    /// Time at which the delivery completed (the order's ETA)
    pub delivered_at: u64,
}

impl Delivery {
    /// Build a delivery report from a retired order
    pub fn from_order(order: &OrderRecord) -> Self {
        Self {
            id: order.id,
            delivered_at: order.eta,
        }
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order {} has been delivered at time {}", self.id, self.delivered_at)
    }
}

/// Result of a successful `create_order`.
///
/// `delivered` holds the deliveries retired by the completion sweep that ran
/// after scheduling; they are reported ahead of the creation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    /// New order
    pub id: OrderId,

    /// ETA assigned to the new order
    pub eta: u64,

    /// Orders retired by the sweep, ascending ETA
    pub delivered: Vec<Delivery>,
}

impl fmt::Display for Created {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order {} has been created - ETA: {}", self.id, self.eta)
    }
}

/// Result of a successful `update_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Updated {
    /// Updated order
    pub id: OrderId,

    /// ETA after rescheduling
    pub eta: u64,
}

impl fmt::Display for Updated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order {} delivery time updated - New ETA: {}", self.id, self.eta)
    }
}

/// Result of a successful `cancel_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled {
    /// Cancelled order
    pub id: OrderId,
}

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order {} has been canceled", self.id)
    }
}

/// Rank of an order in descending priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    /// Queried order
    pub id: OrderId,

    /// Number of orders served before it
    pub ahead: usize,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order {} will be delivered after {} orders", self.id, self.ahead)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
