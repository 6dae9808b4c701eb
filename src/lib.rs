//! # Delivery Dispatch
//!
//! Single-vehicle delivery dispatcher with priority ranking and cascading
//! ETA scheduling.
//!
//! ## Architecture
//!
//! - **Types**: Order records and command outcomes
//! - **Index**: AVL tree with slab-based node storage
//! - **Engine**: Dispatcher owning a priority index, an ETA index and the
//!   order table
//! - **Protocol**: Text commands in, text lines out
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Identical command sequences produce identical state roots
//! 2. **Sequential service**: One vehicle, each order is a full round trip
//! 3. **Arena storage**: Tree nodes live in a slab, links are slot keys
//! 4. **Synchronous Execution**: One command runs to completion before the next

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: OrderRecord and command outcomes
pub mod types;

/// Balanced index: AVL tree with slab-based storage
pub mod index;

/// Dispatch engine: scheduling and order lifecycle
pub mod engine;

/// Command protocol: parsing, execution and rendering
pub mod protocol;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use engine::{DispatchEngine, DispatchError};
pub use index::{BalancedIndex, IndexNode, PayloadId};
pub use protocol::{Command, ParseError, Session};
pub use types::{Delivery, OrderId, OrderRecord};
