//! Text session: protocol lines in, output lines out.
//!
//! A [`Session`] owns one [`DispatchEngine`] for the length of a run and
//! turns each command into the lines the protocol prints for it.

use tracing::debug;

use crate::engine::DispatchEngine;
use crate::protocol::{Command, ParseError};
use crate::types::OrderRecord;

/// Output line when a range query matches nothing.
pub const EMPTY_RANGE: &str = "There are no orders in that time period";

/// Render an order as `[id creationTime value duration eta]`
pub fn render_order(order: &OrderRecord) -> String {
    format!(
        "[{} {} {} {} {}]",
        order.id, order.creation_time, order.value, order.delivery_duration, order.eta
    )
}

/// One simulation run driven by protocol commands.
#[derive(Debug, Default)]
pub struct Session {
    engine: DispatchEngine,
    quit: bool,
}

impl Session {
    /// Start a session with an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session around an existing engine
    pub fn with_engine(engine: DispatchEngine) -> Self {
        Self { engine, quit: false }
    }

    /// The engine driven by this session
    #[inline]
    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// Check whether `Quit()` has been executed
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.quit
    }

    /// Parse and execute one line
    ///
    /// Blank lines produce no output.
    ///
    /// # Errors
    ///
    /// The [`ParseError`] of a line that is not a valid command. Nothing is
    /// executed in that case.
    pub fn handle_line(&mut self, line: &str) -> Result<Vec<String>, ParseError> {
        match line.parse::<Command>() {
            Ok(command) => Ok(self.execute(command)),
            Err(ParseError::Empty) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Execute one command and return its output lines
    pub fn execute(&mut self, command: Command) -> Vec<String> {
        debug!(?command, "executing");
        let engine = &mut self.engine;

        match command {
            Command::CreateOrder { id, time, value, duration } => {
                match engine.create_order(id, time, value, duration) {
                    Ok(created) => {
                        let mut lines: Vec<String> =
                            created.delivered.iter().map(ToString::to_string).collect();
                        lines.push(created.to_string());
                        lines
                    }
                    Err(err) => vec![err.to_string()],
                }
            }
            Command::CancelOrder { id, time } => {
                vec![display_result(engine.cancel_order(id, time))]
            }
            Command::UpdateTime { id, time, duration } => {
                vec![display_result(engine.update_time(id, time, duration))]
            }
            Command::Print { id } => vec![match engine.order(id) {
                Ok(order) => render_order(order),
                Err(err) => err.to_string(),
            }],
            Command::PrintRange { from, to } => {
                let lines: Vec<String> = engine
                    .orders_between(from, to)
                    .into_iter()
                    .map(render_order)
                    .collect();
                if lines.is_empty() {
                    vec![EMPTY_RANGE.to_string()]
                } else {
                    lines
                }
            }
            Command::GetRankOfOrder { id } => vec![display_result(engine.get_rank(id))],
            Command::Quit => {
                self.quit = true;
                Vec::new()
            }
        }
    }

    /// End the session without further output
    ///
    /// Returns the orders that were still pending, ascending by ETA.
    pub fn finish(self) -> Vec<OrderRecord> {
        self.engine.finish()
    }
}

fn display_result<T, E>(result: Result<T, E>) -> String
where
    T: ToString,
    E: ToString,
{
    match result {
        Ok(value) => value.to_string(),
        Err(err) => err.to_string(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
