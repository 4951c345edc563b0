use thiserror::Error;

use crate::CompileError;
use crate::corpus::DecodeError;
use crate::parse::ParseError;

/// Unified error type covering rule loading, compilation, corpus decoding and I/O.
///
/// Returned by convenience methods like [`RuleSet::from_toml()`](crate::RuleSet::from_toml)
/// and by [`tag_corpus()`](crate::tag_corpus). Every variant is fatal: a run
/// either completes or emits nothing.
#[derive(Debug, Error)]
pub enum TaggerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("corpus decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
