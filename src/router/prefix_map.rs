use std::collections::BTreeMap;
use std::ops::Bound;

/// Ordered string map answering longest-prefix queries.
///
/// Backs both the mount table and the per-mount special path matchers.
#[derive(Debug, Clone)]
pub struct PrefixMap<V> {
    entries: BTreeMap<String, V>,
}

impl<V> Default for PrefixMap<V> {
    fn default() -> Self {
        Self { entries: BTreeMap::new() }
    }
}

impl<V> PrefixMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` at `key`, returning whatever was stored there before.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    pub fn delete(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// The entry whose key is the longest prefix of `path`.
    ///
    /// Every key that prefixes `path` sorts at or below it, so the greatest
    /// such key either prefixes `path` or bounds the search to the part both
    /// share. Each probe shrinks the candidate.
    pub fn longest_prefix(&self, path: &str) -> Option<(&str, &V)> {
        let mut candidate = path;
        loop {
            let (key, value) = self
                .entries
                .range::<str, _>((Bound::Unbounded, Bound::Included(candidate)))
                .next_back()?;
            if candidate.starts_with(key.as_str()) {
                return Some((key.as_str(), value));
            }
            candidate = &candidate[..common_prefix_len(key, candidate)];
        }
    }

    /// First key (in lexical order) that has `prefix` as a prefix, if any.
    pub fn first_with_prefix(&self, prefix: &str) -> Option<(&str, &V)> {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .next()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Byte length of the longest common prefix, always on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or_else(|| a.len().min(b.len()), |((idx, _), _)| idx)
}
