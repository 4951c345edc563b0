/// Slot value meaning "no child". The root is node 0 and is never a child,
/// so 0 is free to act as the sentinel.
const NO_CHILD: u32 = 0;

#[derive(Debug, Clone)]
struct Node {
    next: Box<[u32; 256]>,
    rules: Vec<usize>,
}

impl Node {
    fn new() -> Self {
        Self {
            next: Box::new([NO_CHILD; 256]),
            rules: Vec::new(),
        }
    }
}

/// Byte trie over the literal prefixes of indexed rules.
///
/// Every node has 256 child slots, one per possible next byte, and lists the
/// rules whose prefix ends exactly at that node. Nodes live in a flat arena and
/// refer to each other by index. Built once during compilation, read-only after.
#[derive(Debug, Clone)]
pub struct PrefixIndex {
    nodes: Vec<Node>,
    rule_count: usize,
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixIndex {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
            rule_count: 0,
        }
    }

    /// Attach `rule` to the node reached by walking `prefix` from the root,
    /// creating nodes along the way.
    pub(crate) fn insert(&mut self, prefix: &[u8], rule: usize) {
        let mut node = 0;
        for &byte in prefix {
            let child = self.nodes[node].next[usize::from(byte)];
            node = if child == NO_CHILD {
                let id = self.nodes.len();
                self.nodes.push(Node::new());
                self.nodes[node].next[usize::from(byte)] = id as u32;
                id
            } else {
                child as usize
            };
        }
        self.nodes[node].rules.push(rule);
        self.rule_count += 1;
    }

    /// Rules whose indexed prefix is a prefix of `path`, shortest prefix first.
    ///
    /// The walk follows one edge per path byte and stops at the first byte with
    /// no edge: no deeper node can hold a rule whose prefix matches. Candidates
    /// still have to be checked against their full condition list.
    #[must_use]
    pub fn candidates<'i, 'p>(&'i self, path: &'p [u8]) -> Candidates<'i, 'p> {
        Candidates {
            index: self,
            path,
            node: 0,
            pending: (&[]).iter(),
        }
    }

    /// Number of trie nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of rules attached to the trie.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rule_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }
}

/// Iterator returned by [`PrefixIndex::candidates()`].
#[derive(Debug, Clone)]
pub struct Candidates<'i, 'p> {
    index: &'i PrefixIndex,
    path: &'p [u8],
    node: usize,
    pending: std::slice::Iter<'i, usize>,
}

impl Iterator for Candidates<'_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some(&rule) = self.pending.next() {
                return Some(rule);
            }
            let (&byte, rest) = self.path.split_first()?;
            let child = self.index.nodes[self.node].next[usize::from(byte)];
            if child == NO_CHILD {
                self.path = &[];
                return None;
            }
            self.path = rest;
            self.node = child as usize;
            self.pending = self.index.nodes[self.node].rules.iter();
        }
    }
}
