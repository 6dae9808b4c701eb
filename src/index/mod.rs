//! Balanced index module for the delivery dispatcher.
//!
//! ## Architecture
//!
//! The index is an AVL tree whose nodes live in a slab arena:
//!
//! - **Slab-based storage**: nodes are addressed by `usize` slot keys
//! - **Functional rebalancing**: every recursive helper takes a subtree root
//!   and returns the (possibly new) subtree root
//! - **Secondary identity**: payloads expose an id so a node can be found or
//!   removed without trusting its key
//!
//! ## Components
//!
//! - [`IndexNode`]: One arena slot (key, payload, height, children)
//! - [`BalancedIndex`]: The tree itself
//! - [`PayloadId`]: Secondary identity of a payload
//!
//! ## Complexity
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | insert / remove by key | O(log n) |
//! | find_predecessor | O(log n) |
//! | remove / find by payload id | O(n) |
//! | in-order traversal | O(n) |
//! | rebuild from sorted | O(n) |
//!
//! ## Example
//!
//! ```
//! use delivery_dispatch::index::BalancedIndex;
//!
//! let mut index: BalancedIndex<u64> = BalancedIndex::new();
//! index.insert(5.0, 1);
//! index.insert(13.0, 2);
//! index.insert(9.0, 3);
//!
//! assert_eq!(index.in_order_traversal(), vec![1, 3, 2]);
//! assert_eq!(index.find_predecessor(9.0), Some(2));
//! ```

pub mod avl;
pub mod node;

pub use avl::BalancedIndex;
pub use node::{IndexNode, PayloadId};
