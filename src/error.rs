//! Errors raised by the command and mapping interpreter.
//!
//! Every variant is recoverable: the input loop shows it as a transient
//! status message and carries on.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Ambiguous: {name} (could be {})", .candidates.join(", "))]
    AmbiguousCommand {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Argument required for command: {0}")]
    MissingArgument(String),

    #[error("Trailing characters: {0}")]
    TrailingArguments(String),

    #[error("unknown key: {0}")]
    UnknownKeyNotation(String),

    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("unmatched < in mapping at position {0}")]
    UnmatchedBracket(usize),

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid pattern: {0}")]
    PatternSyntaxInvalid(String),

    #[error("recursive mapping: {0}")]
    RecursiveMapping(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Skipped {0}, try again later...")]
    RefreshSkipped(&'static str),

    #[error("cannot open empty result")]
    NoSelection,

    #[error("{0}")]
    Launch(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
