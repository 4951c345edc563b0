use std::fmt;

use super::error::CompileError;
use super::prefix_index::PrefixIndex;
use super::rule::{CompiledRule, Condition, Rule};
use super::tag_registry::{TagId, TagRegistry};

/// Builder for constructing a [`RuleSet`].
///
/// Rules are defined via closures and compiled into an immutable, thread-safe
/// matching structure.
///
/// # Example
///
/// ```
/// use tagtree::RuleSetBuilder;
///
/// let ruleset = RuleSetBuilder::new()
///     .rule(|r| r.has_prefix("servers.").tag("category=servers"))
///     .rule(|r| r.regexp(r"^db\.primary\.").tag("role=db").tag("tier=primary"))
///     .compile()
///     .unwrap();
/// assert_eq!(ruleset.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule. The closure adds conditions and tags.
    ///
    /// A rule without conditions matches every metric; a rule without tags
    /// matches but adds nothing.
    #[must_use]
    pub fn rule(mut self, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        self.rules.push(f(RuleBuilder::default()).rule);
        self
    }

    /// Add an already assembled rule.
    #[must_use]
    pub fn push(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Compile the rules into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if a rule is malformed or a regexp is invalid.
    pub fn compile(self) -> Result<RuleSet, CompileError> {
        crate::compile::compile(&self.rules)
    }
}

impl RuleBuilder {
    #[must_use]
    pub fn equal(self, literal: impl AsRef<[u8]>) -> Self {
        self.when(Condition::Equal(literal.as_ref().to_vec()))
    }

    #[must_use]
    pub fn contains(self, literal: impl AsRef<[u8]>) -> Self {
        self.when(Condition::Contains(literal.as_ref().to_vec()))
    }

    #[must_use]
    pub fn has_prefix(self, literal: impl AsRef<[u8]>) -> Self {
        self.when(Condition::HasPrefix(literal.as_ref().to_vec()))
    }

    #[must_use]
    pub fn has_suffix(self, literal: impl AsRef<[u8]>) -> Self {
        self.when(Condition::HasSuffix(literal.as_ref().to_vec()))
    }

    #[must_use]
    pub fn regexp(self, pattern: &str) -> Self {
        self.when(Condition::Matches(pattern.to_owned()))
    }

    /// Add an arbitrary condition. All conditions of a rule must hold.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.rule.conditions.push(condition);
        self
    }

    /// Add a tag assigned when the rule matches.
    #[must_use]
    pub fn tag(mut self, tag: &str) -> Self {
        self.rule.tags.push(tag.to_owned());
        self
    }
}

/// A compiled, immutable rule set. Thread-safe and designed to live behind `Arc`.
#[derive(Debug)]
pub struct RuleSet {
    pub(crate) rules: Vec<CompiledRule>,
    pub(crate) tags: TagRegistry,
    pub(crate) prefix_index: PrefixIndex,
    /// Indices into `rules` of every rule without a prefix, in declaration order.
    pub(crate) scan_indices: Vec<usize>,
}

impl RuleSet {
    /// Parse a TOML rule document and compile it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`TaggerError`](crate::TaggerError) on parse or compile failure.
    pub fn from_toml(input: &str) -> Result<Self, crate::TaggerError> {
        let rules = crate::parse::parse_rules(input)?;
        let ruleset = crate::compile::compile(&rules)?;
        Ok(ruleset)
    }

    /// Read a TOML rule file and compile it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`TaggerError`](crate::TaggerError) on I/O, parse, or compile failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::TaggerError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml(&input)
    }

    /// Whether rule `rule` (declaration index) matches `path` on all its conditions.
    ///
    /// Returns `false` for an out-of-range index.
    #[must_use]
    pub fn rule_matches(&self, rule: usize, path: &[u8]) -> bool {
        self.rules.get(rule).is_some_and(|r| r.matches(path))
    }

    /// Whether rule `rule` is reachable through the prefix index.
    #[must_use]
    pub fn is_indexed(&self, rule: usize) -> bool {
        self.rules.get(rule).is_some_and(CompiledRule::is_indexed)
    }

    /// Tags assigned by rule `rule`, or `None` for an out-of-range index.
    #[must_use]
    pub fn rule_tags(&self, rule: usize) -> Option<&[TagId]> {
        self.rules.get(rule).map(|r| r.tags.as_slice())
    }

    /// The tag vocabulary of this rule set.
    #[must_use]
    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    /// The byte trie over indexed rule prefixes.
    #[must_use]
    pub fn prefix_index(&self) -> &PrefixIndex {
        &self.prefix_index
    }

    /// Declaration indices of the rules matched by full scan.
    #[must_use]
    pub fn scan_rules(&self) -> &[usize] {
        &self.scan_indices
    }

    /// Number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve a tag set to its strings, in id order.
    pub fn tag_names<'s>(
        &'s self,
        ids: impl IntoIterator<Item = &'s TagId>,
    ) -> impl Iterator<Item = &'s str> {
        ids.into_iter().filter_map(|&id| self.tags.name(id))
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} rules, {} indexed, {} tags, {} trie nodes)",
            self.rules.len(),
            self.prefix_index.len(),
            self.tags.len(),
            self.prefix_index.node_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_rules() {
        let builder = RuleSetBuilder::new()
            .rule(|r| r.has_prefix("servers.").tag("category=servers"))
            .rule(|r| {
                r.contains(".cpu.")
                    .has_suffix(".load")
                    .tag("kind=cpu")
                    .tag("unit=load")
            });

        assert_eq!(builder.rules.len(), 2);
        assert_eq!(
            builder.rules[0].conditions,
            vec![Condition::HasPrefix(b"servers.".to_vec())]
        );
        assert_eq!(builder.rules[1].conditions.len(), 2);
        assert_eq!(builder.rules[1].tags, vec!["kind=cpu", "unit=load"]);
    }

    #[test]
    fn builder_rule_without_tags_compiles() {
        let ruleset = RuleSetBuilder::new()
            .rule(|r| r.equal("a.b"))
            .compile()
            .unwrap();
        assert!(ruleset.rule_matches(0, b"a.b"));
        assert_eq!(ruleset.rule_tags(0), Some(&[][..]));
        assert!(ruleset.tags().is_empty());
    }

    #[test]
    fn builder_push_rule() {
        let ruleset = RuleSetBuilder::new()
            .push(Rule {
                conditions: vec![Condition::Equal(b"a.b".to_vec())],
                tags: vec!["x".into()],
            })
            .compile()
            .unwrap();
        assert!(ruleset.rule_matches(0, b"a.b"));
        assert!(!ruleset.rule_matches(1, b"a.b"));
    }

    #[test]
    fn display_summarizes() {
        let ruleset = RuleSetBuilder::new()
            .rule(|r| r.has_prefix("ab").tag("x"))
            .rule(|r| r.equal("q").tag("x").tag("y"))
            .compile()
            .unwrap();
        assert_eq!(
            ruleset.to_string(),
            "RuleSet(2 rules, 1 indexed, 2 tags, 3 trie nodes)"
        );
    }
}
