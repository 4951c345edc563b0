use std::fmt;

use memchr::memmem;
use regex::bytes::Regex;

use super::tag_registry::TagId;

/// A single test applied to a metric path.
///
/// Literal conditions operate on raw bytes; paths are never required to be
/// valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The path equals the literal exactly.
    Equal(Vec<u8>),
    /// The literal occurs somewhere in the path.
    Contains(Vec<u8>),
    /// The path starts with the literal. Rules with a prefix are indexed.
    HasPrefix(Vec<u8>),
    /// The path ends with the literal.
    HasSuffix(Vec<u8>),
    /// The regular expression finds a match anywhere in the path.
    ///
    /// Patterns compile in Unicode mode, so `.` and classes such as `\w` only
    /// match whole UTF-8 sequences and never an invalid byte. Use `(?-u:.)` to
    /// match any single byte.
    Matches(String),
}

impl Condition {
    /// Whether the condition carries nothing to test (empty literal or pattern).
    /// Unspecified conditions are dropped during compilation.
    pub(crate) fn is_unspecified(&self) -> bool {
        match self {
            Condition::Equal(b)
            | Condition::Contains(b)
            | Condition::HasPrefix(b)
            | Condition::HasSuffix(b) => b.is_empty(),
            Condition::Matches(p) => p.is_empty(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equal(b) => write!(f, "equal {:?}", String::from_utf8_lossy(b)),
            Condition::Contains(b) => write!(f, "contains {:?}", String::from_utf8_lossy(b)),
            Condition::HasPrefix(b) => write!(f, "has-prefix {:?}", String::from_utf8_lossy(b)),
            Condition::HasSuffix(b) => write!(f, "has-suffix {:?}", String::from_utf8_lossy(b)),
            Condition::Matches(p) => write!(f, "regexp {p:?}"),
        }
    }
}

/// A tagging rule: every condition must hold for the rule's tags to be assigned.
///
/// Rules are created via [`RuleSetBuilder`](super::RuleSetBuilder) or by loading a
/// TOML rule document with [`RuleSet::from_toml()`](super::RuleSet::from_toml).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    pub conditions: Vec<Condition>,
    pub tags: Vec<String>,
}

/// Compiled form of [`Condition`]: regexes are built once, literals stay raw bytes.
#[derive(Debug, Clone)]
pub(crate) enum CompiledCondition {
    Equal(Box<[u8]>),
    Contains(Box<[u8]>),
    HasPrefix(Box<[u8]>),
    HasSuffix(Box<[u8]>),
    Matches(Regex),
}

impl CompiledCondition {
    fn holds(&self, path: &[u8]) -> bool {
        match self {
            CompiledCondition::Equal(lit) => path == &lit[..],
            CompiledCondition::Contains(lit) => memmem::find(path, lit).is_some(),
            CompiledCondition::HasPrefix(lit) => path.starts_with(lit),
            CompiledCondition::HasSuffix(lit) => path.ends_with(lit),
            CompiledCondition::Matches(re) => re.is_match(path),
        }
    }
}

/// A rule whose conditions have been compiled and whose tags have been interned.
///
/// Produced by the compilation step and stored inside a [`RuleSet`](super::RuleSet).
/// `index` is the rule's position in declaration order.
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) index: usize,
    pub(crate) conditions: Vec<CompiledCondition>,
    pub(crate) tags: Vec<TagId>,
    /// The literal the prefix index keys this rule under, if any.
    pub(crate) prefix: Option<Box<[u8]>>,
}

impl CompiledRule {
    /// Check every condition against the full path. A rule reached through the
    /// prefix index is re-validated here, prefix included.
    pub(crate) fn matches(&self, path: &[u8]) -> bool {
        self.conditions.iter().all(|c| c.holds(path))
    }

    pub(crate) fn is_indexed(&self) -> bool {
        self.prefix.is_some()
    }
}
