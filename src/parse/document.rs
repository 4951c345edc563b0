use serde::Deserialize;

use crate::{Condition, Rule};

/// Top-level rule document: an array of `[[tag]]` tables.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RuleDocument {
    #[serde(default)]
    tag: Vec<TagEntry>,
}

/// One `[[tag]]` table. Empty strings leave a condition unspecified.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct TagEntry {
    #[serde(default)]
    list: Vec<String>,
    #[serde(default)]
    equal: String,
    #[serde(default)]
    contains: String,
    #[serde(default)]
    has_prefix: String,
    #[serde(default)]
    has_suffix: String,
    #[serde(default)]
    regexp: String,
}

impl TagEntry {
    fn into_rule(self) -> Rule {
        let conditions = [
            Condition::Equal(self.equal.into_bytes()),
            Condition::Contains(self.contains.into_bytes()),
            Condition::HasPrefix(self.has_prefix.into_bytes()),
            Condition::HasSuffix(self.has_suffix.into_bytes()),
            Condition::Matches(self.regexp),
        ]
        .into_iter()
        .filter(|c| !c.is_unspecified())
        .collect();

        Rule {
            conditions,
            tags: self.list,
        }
    }
}

impl RuleDocument {
    pub(super) fn into_rules(self) -> Vec<Rule> {
        self.tag.into_iter().map(TagEntry::into_rule).collect()
    }
}
