use std::io;

use thiserror::Error;

use crate::regex::ParseError;

/// Errors reported by automaton construction, algebra and queries.
#[derive(Debug, Error)]
pub enum Error {
    /// The regex could not be parsed or compiled.
    #[error("syntax error in regex `{regex}`: {reason}")]
    Syntax { regex: String, reason: ParseError },
    /// The automaton was never built, or it has been destroyed.
    #[error("automaton is not defined")]
    UndefinedAutomaton,
    /// A comparison was attempted with an undefined operand.
    #[error("cannot compare with an undefined automaton")]
    UndefinedComparison,
    /// Reading or writing an automaton file failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The path count of a cyclic automaton was requested.
    #[error("automaton is cyclic, its length is unbounded")]
    CyclicLength,
    /// A symbol collides with a reserved symbol.
    #[error("`{0}` uses a reserved symbol")]
    ReservedSymbol(String),
    /// A multitape automaton needs at least one tape.
    #[error("invalid tape count {0}")]
    TapeCount(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
