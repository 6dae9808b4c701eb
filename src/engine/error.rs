//! Failure outcomes of dispatch engine calls.
//!
//! Every variant is reported to the caller and leaves the engine untouched.
//! The `Display` text of each variant is the protocol's error line.

use std::fmt;

use thiserror::Error;

use crate::types::OrderId;

/// Mutating command that was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `cancel_order`
    Cancel,
    /// `update_time`
    Update,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Cancel => f.write_str("cancel"),
            Action::Update => f.write_str("update"),
        }
    }
}

/// Reported failure of an engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The id is not tracked (never created, cancelled, or delivered)
    #[error("Order {id} not found")]
    NotFound { id: OrderId },

    /// The order's ETA is at or before the time supplied with the command
    #[error("Cannot {action}. Order {id} has already been delivered")]
    AlreadyDelivered { id: OrderId, action: Action },

    /// `create_order` with an id that is already tracked
    #[error("Order {id} already exists")]
    DuplicateOrder { id: OrderId },

    /// Rescheduling would push the ETA or return of `id` past `u64::MAX`
    #[error("Cannot schedule. Order {id} would be delivered after the end of time")]
    ScheduleOverflow { id: OrderId },
}
