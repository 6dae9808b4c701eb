//! Dispatch engine module.
//!
//! ## Design Principles
//!
//! 1. **Single server**: one vehicle, deliveries are strictly sequential
//! 2. **Round trips**: each order occupies the vehicle for its duration out
//!    and its duration back
//! 3. **Anchoring**: a delivery already under way keeps its ETA
//! 4. **Synchronous Execution**: one command runs to completion before the next
//!
//! ## Scheduling Rules
//!
//! - Orders are served in **descending priority**
//! - Every mutation (new order, changed duration) re-times all orders that
//!   have not started yet
//! - Orders whose ETA has passed are retired by the **completion sweep**
//!
//! ## Example
//!
//! ```
//! use delivery_dispatch::engine::DispatchEngine;
//!
//! let mut engine = DispatchEngine::new();
//!
//! let first = engine.create_order(1, 0, 100, 5).unwrap();
//! assert_eq!(first.eta, 5);
//!
//! // Order 1 is on the road at time 1, so order 2 waits for the round trip
//! let second = engine.create_order(2, 1, 50, 3).unwrap();
//! assert_eq!(second.eta, 13);
//! assert_eq!(engine.get_rank(2).unwrap().ahead, 1);
//! ```

pub mod dispatcher;
pub mod error;

pub use dispatcher::DispatchEngine;
pub use error::{Action, DispatchError};
