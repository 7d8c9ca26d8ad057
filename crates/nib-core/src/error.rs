//! Error types shared across the core crate.

use thiserror::Error;

/// Failures while parsing path data text. All of these are fatal to the
/// parse call; nothing is recovered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("unknown path command `{0}`")]
    UnknownCommand(char),

    #[error("path command `{cmd}` expects {expected} coordinates, found {found}")]
    WrongArgCount { cmd: char, expected: usize, found: usize },

    #[error("invalid number in path data: `{0}`")]
    InvalidNumber(String),

    #[error("path data is empty")]
    Empty,
}
