use std::time::Instant;

use regex::bytes::Regex;
use tracing::{debug, info};

use crate::types::{CompiledCondition, PrefixIndex, TagRegistry};
use crate::{CompileError, CompiledRule, Condition, Rule, RuleSet};

pub(crate) fn compile(rules: &[Rule]) -> Result<RuleSet, CompileError> {
    let start = Instant::now();
    let mut tags = TagRegistry::new();
    let mut compiled = Vec::with_capacity(rules.len());

    for (index, rule) in rules.iter().enumerate() {
        compiled.push(compile_rule(index, rule, &mut tags)?);
    }
    info!(rules = compiled.len(), elapsed = ?start.elapsed(), "parse rules");

    let start = Instant::now();
    let (prefix_index, scan_indices) = build_prefix_index(&compiled);
    info!(
        indexed = prefix_index.len(),
        nodes = prefix_index.node_count(),
        elapsed = ?start.elapsed(),
        "make prefix tree"
    );

    Ok(RuleSet {
        rules: compiled,
        tags,
        prefix_index,
        scan_indices,
    })
}

fn compile_rule(
    index: usize,
    rule: &Rule,
    tags: &mut TagRegistry,
) -> Result<CompiledRule, CompileError> {
    if rule.tags.iter().any(String::is_empty) {
        return Err(CompileError::EmptyTag { rule: index });
    }

    let mut conditions = Vec::with_capacity(rule.conditions.len());
    let mut prefix: Option<Box<[u8]>> = None;

    for condition in rule.conditions.iter().filter(|c| !c.is_unspecified()) {
        let compiled = match condition {
            Condition::Equal(lit) => CompiledCondition::Equal(lit.as_slice().into()),
            Condition::Contains(lit) => CompiledCondition::Contains(lit.as_slice().into()),
            Condition::HasSuffix(lit) => CompiledCondition::HasSuffix(lit.as_slice().into()),
            Condition::HasPrefix(lit) => {
                // All conditions must hold, so any prefix is a valid trie key.
                // The longest one prunes the most.
                if prefix.as_ref().is_none_or(|p| p.len() < lit.len()) {
                    prefix = Some(lit.as_slice().into());
                }
                CompiledCondition::HasPrefix(lit.as_slice().into())
            }
            Condition::Matches(pattern) => {
                let re = Regex::new(pattern).map_err(|source| CompileError::InvalidRegex {
                    rule: index,
                    pattern: pattern.clone(),
                    source,
                })?;
                CompiledCondition::Matches(re)
            }
        };
        conditions.push(compiled);
    }

    let mut ids = Vec::with_capacity(rule.tags.len());
    for tag in &rule.tags {
        let id = tags.register(tag);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    debug!(
        rule = index,
        conditions = conditions.len(),
        indexed = prefix.is_some(),
        "compiled rule"
    );

    Ok(CompiledRule {
        index,
        conditions,
        tags: ids,
        prefix,
    })
}

fn build_prefix_index(rules: &[CompiledRule]) -> (PrefixIndex, Vec<usize>) {
    let mut index = PrefixIndex::new();
    let mut scan = Vec::new();
    for rule in rules {
        match &rule.prefix {
            Some(prefix) => index.insert(prefix, rule.index),
            None => scan.push(rule.index),
        }
    }
    (index, scan)
}
