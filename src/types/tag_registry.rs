use std::collections::HashMap;
use std::fmt;

/// Interned identifier of a tag string.
///
/// Ids are handed out in the order tags first appear in the rule declarations,
/// so a `BTreeSet<TagId>` iterates tags in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(u32);

impl TagId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maps tag strings (e.g. `"category=servers"`) to [`TagId`]s and back.
///
/// Built during compilation from every tag listed by a rule. Tag sets on metrics
/// only ever hold ids, the registry resolves them at emission time.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    ids: HashMap<String, TagId>,
    names: Vec<String>,
}

impl TagRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a tag, returning its id. If the tag is already registered,
    /// returns the existing id.
    pub(crate) fn register(&mut self, tag: &str) -> TagId {
        if let Some(&id) = self.ids.get(tag) {
            return id;
        }
        let id = TagId(self.names.len() as u32);
        self.ids.insert(tag.to_owned(), id);
        self.names.push(tag.to_owned());
        id
    }

    /// Look up the id of a tag string.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<TagId> {
        self.ids.get(tag).copied()
    }

    /// Resolve an id back to its tag string.
    #[must_use]
    pub fn name(&self, id: TagId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// The number of distinct tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over all registered (tag, id) pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TagId)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), TagId(i as u32)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_get() {
        let mut reg = TagRegistry::new();
        let id = reg.register("category=servers");
        assert_eq!(id.index(), 0);
        assert_eq!(reg.get("category=servers"), Some(id));
        assert_eq!(reg.name(id), Some("category=servers"));
    }

    #[test]
    fn duplicate_register_returns_same_id() {
        let mut reg = TagRegistry::new();
        let a = reg.register("role=db");
        let b = reg.register("role=db");
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn ids_follow_first_appearance() {
        let mut reg = TagRegistry::new();
        let a = reg.register("z");
        let b = reg.register("a");
        assert!(a < b);
        let names: Vec<&str> = reg.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["z", "a"]);
    }

    #[test]
    fn get_missing_returns_none() {
        let reg = TagRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.get("nonexistent"), None);
    }
}
