//! Command line protocol.
//!
//! One command per line, written as a call with integer arguments:
//!
//! ```text
//! createOrder(1001, 1, 200, 3)
//! print(2, 15)
//! Quit()
//! ```
//!
//! Whitespace around the line and around each argument is ignored.

use std::str::FromStr;

use thiserror::Error;

use crate::types::OrderId;

/// A parsed protocol command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `createOrder(id, time, value, duration)`
    CreateOrder {
        id: OrderId,
        time: u64,
        value: u64,
        duration: u64,
    },
    /// `cancelOrder(id, time)`
    CancelOrder { id: OrderId, time: u64 },
    /// `updateTime(id, time, newDuration)`
    UpdateTime {
        id: OrderId,
        time: u64,
        duration: u64,
    },
    /// `print(id)`
    Print { id: OrderId },
    /// `print(t1, t2)`
    PrintRange { from: u64, to: u64 },
    /// `getRankOfOrder(id)`
    GetRankOfOrder { id: OrderId },
    /// `Quit()`
    Quit,
}

/// Why a line is not a valid command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("malformed command `{0}`")]
    Malformed(String),

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` expects {expected} argument(s), found {found}")]
    Arity {
        command: String,
        expected: &'static str,
        found: usize,
    },

    #[error("invalid argument `{0}`")]
    InvalidArgument(String),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let (name, rest) = line
            .split_once('(')
            .ok_or_else(|| ParseError::Malformed(line.to_string()))?;
        let inner = rest
            .strip_suffix(')')
            .ok_or_else(|| ParseError::Malformed(line.to_string()))?;
        let name = name.trim();
        let args = parse_args(inner)?;

        let arity = |expected: &'static str| ParseError::Arity {
            command: name.to_string(),
            expected,
            found: args.len(),
        };

        match (name, args.as_slice()) {
            ("createOrder", &[id, time, value, duration]) => Ok(Command::CreateOrder {
                id,
                time,
                value,
                duration,
            }),
            ("createOrder", _) => Err(arity("4")),
            ("cancelOrder", &[id, time]) => Ok(Command::CancelOrder { id, time }),
            ("cancelOrder", _) => Err(arity("2")),
            ("updateTime", &[id, time, duration]) => Ok(Command::UpdateTime { id, time, duration }),
            ("updateTime", _) => Err(arity("3")),
            ("print", &[id]) => Ok(Command::Print { id }),
            ("print", &[from, to]) => Ok(Command::PrintRange { from, to }),
            ("print", _) => Err(arity("1 or 2")),
            ("getRankOfOrder", &[id]) => Ok(Command::GetRankOfOrder { id }),
            ("getRankOfOrder", _) => Err(arity("1")),
            ("Quit", []) => Ok(Command::Quit),
            ("Quit", _) => Err(arity("0")),
            _ => Err(ParseError::UnknownCommand(name.to_string())),
        }
    }
}

fn parse_args(inner: &str) -> Result<Vec<u64>, ParseError> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|arg| {
            let arg = arg.trim();
            arg.parse::<u64>()
                .map_err(|_| ParseError::InvalidArgument(arg.to_string()))
        })
        .collect()
}

// ============================================================================
// Unit Tests
// ============================================================================
