use thiserror::Error;

/// Errors raised while compiling rules into a [`RuleSet`](super::RuleSet).
///
/// Rules carry no names, so every variant identifies the offending rule by its
/// position in declaration order.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("rule #{rule} has an empty tag")]
    EmptyTag { rule: usize },

    #[error("rule #{rule} has invalid regexp '{pattern}': {source}")]
    InvalidRegex {
        rule: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
