mod error;
mod prefix_index;
mod rule;
mod ruleset;
mod tag_registry;

pub use error::CompileError;
pub use prefix_index::{Candidates, PrefixIndex};
pub(crate) use rule::{CompiledCondition, CompiledRule};
pub use rule::{Condition, Rule};
pub use ruleset::{RuleBuilder, RuleSet, RuleSetBuilder};
pub use tag_registry::{TagId, TagRegistry};
