//! Textual command protocol around the dispatch engine.
//!
//! - [`Command`]: A parsed protocol line
//! - [`ParseError`]: Why a line could not be parsed
//! - [`Session`]: Executes commands against one engine and renders the output
//!
//! ## Example
//!
//! ```
//! use delivery_dispatch::protocol::Session;
//!
//! let mut session = Session::new();
//! let out = session.handle_line("createOrder(1, 0, 100, 5)").unwrap();
//! assert_eq!(out, vec!["Order 1 has been created - ETA: 5"]);
//!
//! let out = session.handle_line("print(1)").unwrap();
//! assert_eq!(out, vec!["[1 0 100 5 5]"]);
//! ```

mod command;
mod session;

pub use command::{Command, ParseError};
pub use session::{render_order, Session, EMPTY_RANGE};
