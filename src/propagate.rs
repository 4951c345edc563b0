//! Hierarchical tag closure over the dotted namespace.
//!
//! Two passes, always in this order:
//!
//! 1. **Down**: every metric takes the union of its ancestors' tags.
//! 2. **Up**: every ancestor takes the union of its descendants' tags,
//!    including what those descendants inherited in the first pass.
//!
//! Ancestors are looked up directly (see [`AncestorIndex`](crate::AncestorIndex)),
//! never relayed through intermediate nodes, so each pass is a single linear
//! sweep and the result does not depend on corpus order. Running up before down
//! leaks tags sideways between sibling subtrees and gives a different closure.

use std::time::Instant;

use tracing::info;

use crate::{Corpus, Metric};

/// Number of tag-set unions that changed their target, per pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    pub down: usize,
    pub up: usize,
}

/// Run the downward pass, then the upward pass.
pub fn propagate(corpus: &mut Corpus<'_>) -> PropagationStats {
    let start = Instant::now();
    let down = propagate_down(corpus);
    info!(changed = down, elapsed = ?start.elapsed(), "copy tags from parents to childs");

    let start = Instant::now();
    let up = propagate_up(corpus);
    info!(changed = up, elapsed = ?start.elapsed(), "copy tags from childs to parents");

    PropagationStats { down, up }
}

/// Union every ancestor's current tags into each metric.
pub fn propagate_down(corpus: &mut Corpus<'_>) -> usize {
    let (metrics, index) = corpus.split_mut();
    let mut changed = 0;
    for position in 0..metrics.len() {
        let path = metrics[position].path();
        for ancestor in index.ancestors(path) {
            if union_into(metrics, ancestor, position) {
                changed += 1;
            }
        }
    }
    changed
}

/// Union each metric's current tags into every one of its ancestors.
pub fn propagate_up(corpus: &mut Corpus<'_>) -> usize {
    let (metrics, index) = corpus.split_mut();
    let mut changed = 0;
    for position in 0..metrics.len() {
        if metrics[position].tags.is_empty() {
            continue;
        }
        let path = metrics[position].path();
        for ancestor in index.ancestors(path) {
            if union_into(metrics, position, ancestor) {
                changed += 1;
            }
        }
    }
    changed
}

/// `metrics[to] |= metrics[from]`, returning whether `to` grew.
fn union_into(metrics: &mut [Metric<'_>], from: usize, to: usize) -> bool {
    debug_assert_ne!(from, to, "a metric is never its own ancestor");
    let (source, target) = if from < to {
        let (head, tail) = metrics.split_at_mut(to);
        (&head[from], &mut tail[0])
    } else {
        let (head, tail) = metrics.split_at_mut(from);
        (&tail[0], &mut head[to])
    };
    let before = target.tags.len();
    target.tags.extend(source.tags.iter().copied());
    target.tags.len() != before
}
