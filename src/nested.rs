//! General purpose ordered map that allows addressing nested items by
//! delimited path keys.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::error::{Error, Result};

/// Default path key delimiter.
pub const DEFAULT_SEPARATOR: char = '/';

/// A value stored in a [`NestedMap`]: either an opaque leaf payload or another
/// nested mapping of the same kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<V> {
    /// A scalar payload.
    Leaf(V),
    /// A nested mapping, insertion-ordered.
    Map(IndexMap<String, Value<V>>),
}

impl<V> Value<V> {
    /// Creates a leaf value.
    pub fn leaf(value: V) -> Self {
        Value::Leaf(value)
    }

    /// Creates a map value from plain (single-segment) keys.
    /// Later duplicates of the same key win.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value<V>)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Creates an empty map value.
    pub fn empty_map() -> Self {
        Value::Map(IndexMap::new())
    }

    /// Returns `true` if this value is a nested map.
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Returns the leaf payload, or `None` for a map.
    pub fn as_leaf(&self) -> Option<&V> {
        match self {
            Value::Leaf(v) => Some(v),
            Value::Map(_) => None,
        }
    }

    /// Returns the nested map, or `None` for a leaf.
    pub fn as_map(&self) -> Option<&IndexMap<String, Value<V>>> {
        match self {
            Value::Leaf(_) => None,
            Value::Map(m) => Some(m),
        }
    }

    /// Number of addressable nodes in this value: 1 for a leaf,
    /// 1 plus the recursive count of all children for a map.
    fn count(&self) -> usize {
        match self {
            Value::Leaf(_) => 1,
            Value::Map(m) => 1 + m.values().map(Value::count).sum::<usize>(),
        }
    }
}

impl<V> From<V> for Value<V> {
    fn from(value: V) -> Self {
        Value::Leaf(value)
    }
}

/// An ordered key-value container where keys are delimiter-separated path
/// strings (`"a/b/c"`) addressing values possibly nested inside intermediate
/// maps.
///
/// ### Internal state
///
/// * `entries` — the backing store; keys at every level are single path
///   segments, values are leaves or further maps. Insertion order is
///   preserved at each level.
/// * `len` — the count of **all** addressable nodes (every intermediate map
///   plus every leaf), maintained incrementally on insert, remove and merge.
/// * `sep` — the path key delimiter, `/` unless overridden.
///
/// ### Example
///
/// ```
/// use dirlay::{NestedMap, Value};
///
/// let map: NestedMap<&str> =
///     NestedMap::from_entries([("a/b/c", "d"), ("a/b/e", "f")]).unwrap();
///
/// assert_eq!(map.len(), 4);
/// assert_eq!(map.get("a/b/c").unwrap(), &Value::Leaf("d"));
/// ```
#[derive(Debug, Clone)]
pub struct NestedMap<V> {
    entries: IndexMap<String, Value<V>>,
    len: usize,
    sep: char,
}

impl<V> NestedMap<V> {
    /// Creates an empty map with the default `/` delimiter.
    pub fn new() -> Self {
        Self::with_separator(DEFAULT_SEPARATOR)
    }

    /// Creates an empty map with a custom path key delimiter.
    pub fn with_separator(sep: char) -> Self {
        Self {
            entries: IndexMap::new(),
            len: 0,
            sep,
        }
    }

    /// Builds a map from `(path key, value)` entries.
    /// Later entries merge over earlier ones.
    pub fn from_entries<K, T, I>(entries: I) -> Result<Self>
    where
        K: AsRef<str>,
        T: Into<Value<V>>,
        I: IntoIterator<Item = (K, T)>,
    {
        let mut map = Self::new();
        for (key, value) in entries {
            map.insert(key.as_ref(), value)?;
        }
        Ok(map)
    }

    /// The path key delimiter.
    pub fn separator(&self) -> char {
        self.sep
    }

    /// Count of all addressable nodes: every intermediate map node plus every
    /// leaf, not just top-level keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a value by path key, descending one segment at a time.
    ///
    /// Returns [`Error::KeyNotFound`] if any segment is absent and
    /// [`Error::NotAContainer`] if traversal must descend through a leaf.
    /// Both errors carry the key prefix up to the failing segment.
    pub fn get(&self, key: &str) -> Result<&Value<V>> {
        let mut current = &self.entries;
        let mut consumed = 0;
        let mut segments = key.split(self.sep).peekable();
        while let Some(segment) = segments.next() {
            let end = consumed + segment.len();
            let value = match current.get(segment) {
                Some(value) => value,
                None => {
                    return Err(Error::KeyNotFound {
                        key: key[..end].to_string(),
                    });
                }
            };
            if segments.peek().is_none() {
                return Ok(value);
            }
            current = match value {
                Value::Map(m) => m,
                Value::Leaf(_) => {
                    return Err(Error::NotAContainer {
                        key: key[..end].to_string(),
                    });
                }
            };
            consumed = end + self.sep.len_utf8();
        }
        // split() always yields at least one segment
        Err(Error::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Non-raising lookup variant; combine with `unwrap_or` for a default.
    pub fn get_opt(&self, key: &str) -> Option<&Value<V>> {
        self.get(key).ok()
    }

    /// Returns `true` if the path key resolves to a value.
    /// Never raises; failed traversal yields `false`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Sets a value at a path key, creating empty intermediate maps as needed.
    ///
    /// If the final segment already holds a map and the written value is a
    /// map too, their children merge recursively; otherwise the written value
    /// replaces the old one wholesale.
    ///
    /// Returns [`Error::NotAContainer`] if an existing intermediate segment
    /// is a leaf. Intermediate maps created before the failure are kept.
    pub fn insert(&mut self, key: &str, value: impl Into<Value<V>>) -> Result<()> {
        let value = value.into();
        let sep = self.sep;
        let Self { entries, len, .. } = self;
        let segments: Vec<&str> = key.split(sep).collect();
        let (last, parents) = match segments.split_last() {
            Some(parts) => parts,
            None => return Ok(()),
        };
        let mut current = entries;
        let mut consumed = 0;
        for segment in parents {
            let end = consumed + segment.len();
            if !current.contains_key(*segment) {
                current.insert((*segment).to_string(), Value::Map(IndexMap::new()));
                *len += 1;
            }
            current = match current.get_mut(*segment) {
                Some(Value::Map(m)) => m,
                _ => {
                    return Err(Error::NotAContainer {
                        key: key[..end].to_string(),
                    });
                }
            };
            consumed = end + sep.len_utf8();
        }
        merge_value(current, (*last).to_string(), value, len);
        Ok(())
    }

    /// Removes the subtree at a path key and returns it.
    ///
    /// The reported length decreases by the full addressable-node count of
    /// the removed subtree. Traversal failures raise just like [`Self::get`]
    /// and leave the map untouched.
    pub fn remove(&mut self, key: &str) -> Result<Value<V>> {
        let sep = self.sep;
        let Self { entries, len, .. } = self;
        let segments: Vec<&str> = key.split(sep).collect();
        let (last, parents) = match segments.split_last() {
            Some(parts) => parts,
            None => {
                return Err(Error::KeyNotFound {
                    key: key.to_string(),
                });
            }
        };
        let mut current = entries;
        let mut consumed = 0;
        for segment in parents {
            let end = consumed + segment.len();
            current = match current.get_mut(*segment) {
                Some(Value::Map(m)) => m,
                Some(Value::Leaf(_)) => {
                    return Err(Error::NotAContainer {
                        key: key[..end].to_string(),
                    });
                }
                None => {
                    return Err(Error::KeyNotFound {
                        key: key[..end].to_string(),
                    });
                }
            };
            consumed = end + sep.len_utf8();
        }
        match current.shift_remove(*last) {
            Some(value) => {
                *len -= value.count();
                Ok(value)
            }
            None => Err(Error::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Recursively merges another map into this one.
    ///
    /// Where both sides hold a map at the same path their children merge;
    /// otherwise the other side's value replaces this one's.
    pub fn merge(&mut self, other: &NestedMap<V>)
    where
        V: Clone,
    {
        let Self { entries, len, .. } = self;
        for (key, value) in &other.entries {
            merge_value(entries, key.clone(), value.clone(), len);
        }
    }

    /// Lazy depth-first pre-order iteration over `(full path key, value)`
    /// pairs, in insertion order at each level. A map key is yielded before
    /// its descendants. Every call starts a fresh traversal.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            stack: vec![self.entries.iter()],
            prefix: Vec::new(),
            sep: self.sep,
        }
    }

    /// Iterates all fully-qualified path keys in traversal order.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.iter().map(|(key, _)| key)
    }
}

impl<V> Default for NestedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> From<IndexMap<String, Value<V>>> for NestedMap<V> {
    /// Builds a map from an already-canonical nested mapping.
    /// Keys are taken literally; no path splitting is performed.
    fn from(entries: IndexMap<String, Value<V>>) -> Self {
        let len = entries.values().map(Value::count).sum();
        Self {
            entries,
            len,
            sep: DEFAULT_SEPARATOR,
        }
    }
}

impl<V: PartialEq> PartialEq for NestedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V: PartialEq> PartialEq<IndexMap<String, Value<V>>> for NestedMap<V> {
    fn eq(&self, other: &IndexMap<String, Value<V>>) -> bool {
        &self.entries == other
    }
}

impl<V: Clone> std::ops::BitOr for &NestedMap<V> {
    type Output = NestedMap<V>;

    /// Returns a new merged map: a copy of the left side with the right side
    /// merged in on top.
    fn bitor(self, rhs: &NestedMap<V>) -> NestedMap<V> {
        let mut merged = self.clone();
        merged.merge(rhs);
        merged
    }
}

impl<V: Clone> std::ops::BitOrAssign<&NestedMap<V>> for NestedMap<V> {
    fn bitor_assign(&mut self, rhs: &NestedMap<V>) {
        self.merge(rhs);
    }
}

impl<'a, V> IntoIterator for &'a NestedMap<V> {
    type Item = (String, &'a Value<V>);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

/// Merges `value` under `key` in `entries`, keeping `len` consistent with the
/// addressable-node count.
fn merge_value<V>(
    entries: &mut IndexMap<String, Value<V>>,
    key: String,
    value: Value<V>,
    len: &mut usize,
) {
    match entries.entry(key) {
        Entry::Occupied(mut slot) => match (slot.get_mut(), value) {
            (Value::Map(children), Value::Map(incoming)) => {
                for (k, v) in incoming {
                    merge_value(children, k, v, len);
                }
            }
            (old, new) => {
                *len += new.count();
                *len -= old.count();
                *old = new;
            }
        },
        Entry::Vacant(slot) => {
            *len += value.count();
            slot.insert(value);
        }
    }
}

/// Depth-first pre-order iterator over a [`NestedMap`].
pub struct Iter<'a, V> {
    stack: Vec<indexmap::map::Iter<'a, String, Value<V>>>,
    prefix: Vec<&'a str>,
    sep: char,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (String, &'a Value<V>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.stack.last_mut()?;
            match current.next() {
                Some((segment, value)) => {
                    let mut key = String::new();
                    for part in &self.prefix {
                        key.push_str(part);
                        key.push(self.sep);
                    }
                    key.push_str(segment);
                    if let Value::Map(children) = value {
                        self.stack.push(children.iter());
                        self.prefix.push(segment);
                    }
                    return Some((key, value));
                }
                None => {
                    self.stack.pop();
                    self.prefix.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NestedMap<&'static str> {
        NestedMap::from_entries([("a/b/c", "d"), ("a/b/e", "f")]).unwrap()
    }

    mod construction {
        use super::*;

        #[test]
        fn test_empty() {
            let map: NestedMap<&str> = NestedMap::new();
            assert_eq!(map.len(), 0);
            assert!(map.is_empty());
        }

        #[test]
        fn test_shorthand_keys_expand() {
            let expected = NestedMap::from_entries([(
                "a",
                Value::map([("b", Value::from("c"))]),
            )])
            .unwrap();
            assert_eq!(sample_abc(), expected);
        }

        fn sample_abc() -> NestedMap<&'static str> {
            NestedMap::from_entries([("a/b", "c")]).unwrap()
        }

        #[test]
        fn test_shorthand_siblings_merge() {
            let map =
                NestedMap::from_entries([("a/b", "c"), ("a/d", "e"), ("a/f/g", "h")]).unwrap();
            let expected = NestedMap::from_entries([(
                "a",
                Value::map([
                    ("b", Value::from("c")),
                    ("d", Value::from("e")),
                    ("f", Value::map([("g", Value::from("h"))])),
                ]),
            )])
            .unwrap();
            assert_eq!(map, expected);
        }

        #[test]
        fn test_custom_separator() {
            let mut map = NestedMap::with_separator('.');
            map.insert("a.b.c", "d").unwrap();
            assert_eq!(map.len(), 3);
            assert_eq!(map.get("a.b.c").unwrap(), &Value::Leaf("d"));
        }
    }

    mod equality {
        use super::*;

        #[test]
        fn test_equal_to_plain_mapping() {
            let mut plain = IndexMap::new();
            plain.insert(
                "a".to_string(),
                Value::map([("b", Value::map([("c", Value::from("d")), ("e", Value::from("f"))]))]),
            );
            assert_eq!(sample(), plain);
        }

        #[test]
        fn test_not_equal() {
            let left: NestedMap<&str> = NestedMap::from_entries([("a", "b")]).unwrap();
            let right = NestedMap::from_entries([("a", "c")]).unwrap();
            assert_ne!(left, right);
        }
    }

    mod len {
        use super::*;

        #[test]
        fn test_len_counts_all_addressable_nodes() {
            let empty: NestedMap<&str> = NestedMap::new();
            assert_eq!(empty.len(), 0);
            let flat = NestedMap::from_entries([("a", "b")]).unwrap();
            assert_eq!(flat.len(), 1);
            let nested: NestedMap<&str> =
                NestedMap::from_entries([("a", Value::map([("b", Value::from("c"))]))]).unwrap();
            assert_eq!(nested.len(), 2);
            let deep: NestedMap<&str> = NestedMap::from_entries([("a/b/c/d/e", "f")]).unwrap();
            assert_eq!(deep.len(), 5);
            assert_eq!(sample().len(), 4);
        }
    }

    mod get {
        use super::*;

        #[test]
        fn test_get_leaf() {
            let map = NestedMap::from_entries([("a", "b")]).unwrap();
            assert_eq!(map.get("a").unwrap(), &Value::Leaf("b"));
        }

        #[test]
        fn test_get_intermediate_map() {
            let map = NestedMap::from_entries([("a/b/c", "d")]).unwrap();
            assert_eq!(
                map.get("a/b").unwrap(),
                &Value::map([("c", Value::from("d"))]),
            );
        }

        #[test]
        fn test_get_missing() {
            let map: NestedMap<&str> = NestedMap::new();
            assert!(matches!(
                map.get("missing"),
                Err(Error::KeyNotFound { key }) if key == "missing"
            ));
        }

        #[test]
        fn test_get_through_leaf() {
            let map = NestedMap::from_entries([("a", "b")]).unwrap();
            assert!(matches!(
                map.get("a/c"),
                Err(Error::NotAContainer { key }) if key == "a"
            ));
        }

        #[test]
        fn test_get_opt_default() {
            let map = NestedMap::from_entries([("a", "b")]).unwrap();
            let fallback = Value::Leaf("x");
            assert_eq!(map.get_opt("a"), Some(&Value::Leaf("b")));
            assert_eq!(map.get_opt("a/b").unwrap_or(&fallback), &fallback);
            assert_eq!(map.get_opt("missing"), None);
        }
    }

    mod contains {
        use super::*;

        #[test]
        fn test_contains_never_raises() {
            let map = sample();
            assert!(map.contains_key("a"));
            assert!(map.contains_key("a/b"));
            assert!(map.contains_key("a/b/c"));
            assert!(!map.contains_key("missing"));
            assert!(!map.contains_key("a/b/c/d"));
        }
    }

    mod insert {
        use super::*;

        #[test]
        fn test_write_read_round_trip() {
            let mut map = NestedMap::new();
            map.insert("a", "b").unwrap();
            assert_eq!(map.get("a").unwrap(), &Value::Leaf("b"));
            assert_eq!(map.len(), 1);
        }

        #[test]
        fn test_insert_creates_parents() {
            let mut map = NestedMap::from_entries([("x", "y")]).unwrap();
            map.insert("a/b", Value::map([("c", Value::from("d"))]))
                .unwrap();
            let expected =
                NestedMap::from_entries([("x", "y"), ("a/b/c", "d")]).unwrap();
            assert_eq!(map, expected);
            assert_eq!(map.len(), 4);
        }

        #[test]
        fn test_insert_through_leaf() {
            let mut map = NestedMap::from_entries([("a", "b")]).unwrap();
            let result = map.insert("a/c", "d");
            assert!(matches!(result, Err(Error::NotAContainer { key }) if key == "a"));
            assert_eq!(map.len(), 1);
        }

        #[test]
        fn test_leaf_overwrites_map_wholesale() {
            let mut map = NestedMap::from_entries([("a/b/c", "d")]).unwrap();
            map.insert("a", "scalar").unwrap();
            let expected = NestedMap::from_entries([("a", "scalar")]).unwrap();
            assert_eq!(map, expected);
            assert_eq!(map.len(), 1);
        }

        #[test]
        fn test_map_merges_into_existing_map() {
            let mut map = NestedMap::from_entries([("a/b", "c")]).unwrap();
            map.insert("a", Value::map([("d", Value::from("e"))])).unwrap();
            let expected = NestedMap::from_entries([("a/b", "c"), ("a/d", "e")]).unwrap();
            assert_eq!(map, expected);
            assert_eq!(map.len(), 3);
        }
    }

    mod remove {
        use super::*;

        #[test]
        fn test_remove_leaf() {
            let mut map = NestedMap::from_entries([("a", "b")]).unwrap();
            assert_eq!(map.remove("a").unwrap(), Value::Leaf("b"));
            assert!(map.is_empty());
            assert_eq!(map.len(), 0);
        }

        #[test]
        fn test_remove_subtree() {
            let mut map = NestedMap::from_entries([("a/b/c", "d"), ("x", "y")]).unwrap();
            let removed = map.remove("a/b").unwrap();
            assert_eq!(removed, Value::map([("c", Value::from("d"))]));
            let expected =
                NestedMap::from_entries([("a", Value::empty_map()), ("x", Value::from("y"))]).unwrap();
            assert_eq!(map, expected);
            assert_eq!(map.len(), 2);
        }

        #[test]
        fn test_remove_top_level_subtree() {
            let mut map = NestedMap::from_entries([("a/b/c", "d"), ("x", "y")]).unwrap();
            map.remove("a").unwrap();
            let expected = NestedMap::from_entries([("x", "y")]).unwrap();
            assert_eq!(map, expected);
            assert_eq!(map.len(), 1);
        }

        #[test]
        fn test_remove_missing_leaves_len_unchanged() {
            let mut map = sample();
            assert!(matches!(map.remove("missing"), Err(Error::KeyNotFound { .. })));
            assert_eq!(map.len(), 4);
        }
    }

    mod merge {
        use super::*;

        #[test]
        fn test_disjoint_merge_sums_len() {
            let mut left = NestedMap::from_entries([("a/b", "c")]).unwrap();
            let right = NestedMap::from_entries([("x/y", "z")]).unwrap();
            left.merge(&right);
            assert_eq!(left.len(), 4);
            let expected = NestedMap::from_entries([("a/b", "c"), ("x/y", "z")]).unwrap();
            assert_eq!(left, expected);
        }

        #[test]
        fn test_overlapping_merge_right_wins() {
            let mut left = NestedMap::from_entries([("a/b", "old"), ("a/keep", "k")]).unwrap();
            let right = NestedMap::from_entries([("a/b", "new")]).unwrap();
            left.merge(&right);
            let expected =
                NestedMap::from_entries([("a/b", "new"), ("a/keep", "k")]).unwrap();
            assert_eq!(left, expected);
            assert_eq!(left.len(), 3);
        }

        #[test]
        fn test_union_operator_returns_new_map() {
            let left = NestedMap::from_entries([("a", "1")]).unwrap();
            let right = NestedMap::from_entries([("b", "2")]).unwrap();
            let merged = &left | &right;
            assert_eq!(merged.len(), 2);
            assert_eq!(left.len(), 1);
            assert_eq!(right.len(), 1);
        }

        #[test]
        fn test_union_assign_merges_in_place() {
            let mut left = NestedMap::from_entries([("a/b", "c")]).unwrap();
            let right = NestedMap::from_entries([("a/d", "e")]).unwrap();
            left |= &right;
            let expected = NestedMap::from_entries([("a/b", "c"), ("a/d", "e")]).unwrap();
            assert_eq!(left, expected);
        }
    }

    mod iter {
        use super::*;

        #[test]
        fn test_depth_first_pre_order_in_insertion_order() {
            let map =
                NestedMap::from_entries([("b", "1"), ("a/c", "2"), ("a/d", "3")]).unwrap();
            let keys: Vec<String> = map.keys().collect();
            assert_eq!(keys, ["b", "a", "a/c", "a/d"]);
        }

        #[test]
        fn test_iteration_is_restartable() {
            let map = sample();
            let first: Vec<String> = map.keys().collect();
            let second: Vec<String> = map.keys().collect();
            assert_eq!(first, second);
            assert_eq!(first.len(), map.len());
        }

        #[test]
        fn test_iter_yields_raw_values() {
            let map = sample();
            let items: Vec<(String, &Value<&str>)> = map.iter().collect();
            assert_eq!(items[0].0, "a");
            assert!(items[0].1.is_map());
            assert_eq!(items[2], ("a/b/c".to_string(), &Value::Leaf("d")));
            assert_eq!(items[3], ("a/b/e".to_string(), &Value::Leaf("f")));
        }
    }
}
