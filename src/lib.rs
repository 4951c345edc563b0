//! Rule-based tagging of dot-delimited metric names.
//!
//! A [`RuleSet`] assigns tags to the metrics of a [`Corpus`] whose paths match
//! its rules, then the tags are propagated through the naming hierarchy: a
//! metric inherits the tags of its ancestors (`a.b.c` from `a.b.` and `a.`),
//! and ancestors collect the tags of their descendants.
//!
//! ```
//! use tagtree::{RuleSet, encode_paths, tag_corpus};
//!
//! let ruleset = RuleSet::from_toml(r#"
//! [[tag]]
//! list = ["category=servers"]
//! has-prefix = "servers."
//! "#).unwrap();
//!
//! let buf = encode_paths(["servers.", "servers.web01.cpu.load", "other.metric"]);
//! let mut out: Vec<(Vec<u8>, Vec<String>)> = Vec::new();
//! tag_corpus(&ruleset, &buf, &mut out).unwrap();
//! assert_eq!(out.len(), 2);
//! ```

mod compile;
mod corpus;
mod error;
pub mod matcher;
pub mod parse;
pub mod propagate;
mod tagger;
mod types;

pub use corpus::{AncestorIndex, Ancestors, Corpus, DecodeError, Metric, encode_paths};
pub use error::TaggerError;
pub use matcher::MatchStats;
pub use parse::ParseError;
pub use propagate::PropagationStats;
pub use tagger::{RunReport, TagSink, WriterSink, emit, tag_corpus};
pub(crate) use types::CompiledRule;
pub use types::{
    Candidates, CompileError, Condition, PrefixIndex, Rule, RuleBuilder, RuleSet, RuleSetBuilder,
    TagId, TagRegistry,
};
