//! Rule matching over a corpus.
//!
//! Prefix rules are reached through the [`PrefixIndex`](crate::PrefixIndex),
//! one trie walk per metric. Every other rule is tested against every metric.
//! Both passes only add tags, so their order does not matter.

use std::time::Instant;

use tracing::info;

use crate::{Corpus, Metric, RuleSet};

/// Match counts of one matching run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// (metric, rule) matches found through the prefix index.
    pub indexed: usize,
    /// (metric, rule) matches found by the full scan.
    pub scanned: usize,
}

impl MatchStats {
    #[must_use]
    pub fn total(&self) -> usize {
        self.indexed + self.scanned
    }
}

/// Run both matching passes over `corpus`.
pub fn run(ruleset: &RuleSet, corpus: &mut Corpus<'_>) -> MatchStats {
    let start = Instant::now();
    let indexed = match_indexed(ruleset, corpus);
    info!(matches = indexed, elapsed = ?start.elapsed(), "prefix tree match");

    let start = Instant::now();
    let scanned = match_full_scan(ruleset, corpus);
    info!(matches = scanned, elapsed = ?start.elapsed(), "fullscan match");

    MatchStats { indexed, scanned }
}

/// Indexed pass: walk the prefix trie along each path and apply every
/// candidate rule whose full condition list holds.
pub fn match_indexed(ruleset: &RuleSet, corpus: &mut Corpus<'_>) -> usize {
    let mut matches = 0;
    for metric in corpus.metrics_mut() {
        for rule in ruleset.prefix_index.candidates(metric.path()) {
            if apply(ruleset, rule, metric) {
                matches += 1;
            }
        }
    }
    matches
}

/// Full-scan pass: test every rule without a prefix against every metric.
pub fn match_full_scan(ruleset: &RuleSet, corpus: &mut Corpus<'_>) -> usize {
    let mut matches = 0;
    for metric in corpus.metrics_mut() {
        for &rule in &ruleset.scan_indices {
            if apply(ruleset, rule, metric) {
                matches += 1;
            }
        }
    }
    matches
}

/// Declaration indices of the prefix rules matching `path`, found via the trie.
#[must_use]
pub fn indexed_matches(ruleset: &RuleSet, path: &[u8]) -> Vec<usize> {
    let mut found: Vec<usize> = ruleset
        .prefix_index
        .candidates(path)
        .filter(|&rule| ruleset.rules[rule].matches(path))
        .collect();
    found.sort_unstable();
    found
}

/// Declaration indices of every rule matching `path`, by testing each rule.
#[must_use]
pub fn naive_matches(ruleset: &RuleSet, path: &[u8]) -> Vec<usize> {
    ruleset
        .rules
        .iter()
        .filter(|r| r.matches(path))
        .map(|r| r.index)
        .collect()
}

fn apply(ruleset: &RuleSet, rule: usize, metric: &mut Metric<'_>) -> bool {
    let rule = &ruleset.rules[rule];
    if !rule.matches(metric.path()) {
        return false;
    }
    metric.tags.extend(rule.tags.iter().copied());
    true
}
