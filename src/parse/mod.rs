mod document;
mod error;

pub use error::ParseError;

use document::RuleDocument;

use crate::Rule;

/// Parse a TOML rule document into rules, in declaration order.
///
/// The document is a list of `[[tag]]` tables, each with a `list` of tags and
/// any of `equal`, `contains`, `has-prefix`, `has-suffix` and `regexp`:
///
/// ```toml
/// [[tag]]
/// list = ["category=servers"]
/// has-prefix = "servers."
/// ```
///
/// Regular expressions are not compiled here; see
/// [`RuleSet::from_toml()`](crate::RuleSet::from_toml).
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid TOML or does not follow
/// the rule document layout.
pub fn parse_rules(input: &str) -> Result<Vec<Rule>, ParseError> {
    let document: RuleDocument = toml::from_str(input)?;
    Ok(document.into_rules())
}
