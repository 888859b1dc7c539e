//! Errors produced while reading expressions from text or assembling them by hand.

use thiserror::Error;

/// Failure to split the input text into tokens.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unrecognised character '{character}' at position {position}")]
    UnrecognizedCharacter { character: char, position: usize },
}

/// Failure to assemble a tree from a well-formed token stream.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown identifier `{name}` at position {position}")]
    UnknownIdentifier { name: String, position: usize },
    #[error("invalid numeric literal `{literal}` at position {position}")]
    InvalidNumber { literal: String, position: usize },
    #[error("input ended at position {position} before the expression was complete")]
    UnexpectedEnd { position: usize },
    #[error("expression nested deeper than {limit} nodes at position {position}")]
    TooDeep { limit: usize, position: usize },
    #[error("expected `EquationImage` at position {position}, found `{found}`")]
    ExpectedTexture { found: String, position: usize },
}

/// The crate-wide error type.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("`{node}` takes {expected} inputs but {found} were given")]
    ArityMismatch {
        node: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("cannot breed from an empty selection")]
    EmptySelection,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
