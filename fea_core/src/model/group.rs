//! Named node and element sets.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::Named;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    Nodes,
    Elements,
}

impl GroupKind {
    pub fn code(&self) -> &'static str {
        match self {
            GroupKind::Nodes => "nodes",
            GroupKind::Elements => "elements",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An ordered, de-duplicated list of node or element keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub kind: GroupKind,
    keys: Vec<usize>,
}

impl Group {
    /// Keys keep their first-seen order; repeats are dropped.
    pub fn new(name: impl Into<String>, kind: GroupKind, keys: impl IntoIterator<Item = usize>) -> Self {
        let mut group = Group {
            name: name.into(),
            kind,
            keys: Vec::new(),
        };
        group.extend(keys);
        group
    }

    pub fn nodes(name: impl Into<String>, keys: impl IntoIterator<Item = usize>) -> Self {
        Group::new(name, GroupKind::Nodes, keys)
    }

    pub fn elements(name: impl Into<String>, keys: impl IntoIterator<Item = usize>) -> Self {
        Group::new(name, GroupKind::Elements, keys)
    }

    pub fn extend(&mut self, keys: impl IntoIterator<Item = usize>) {
        let mut seen: HashSet<usize> = self.keys.iter().copied().collect();
        for key in keys {
            if seen.insert(key) {
                self.keys.push(key);
            }
        }
    }

    pub fn keys(&self) -> &[usize] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: usize) -> bool {
        self.keys.contains(&key)
    }

    /// Rewrite keys through `map`; keys mapped to `None` are dropped.
    pub(crate) fn remap(&mut self, map: impl Fn(usize) -> Option<usize>) {
        let keys = std::mem::take(&mut self.keys);
        self.extend(keys.into_iter().filter_map(map));
    }
}

impl Named for Group {
    const KIND: &'static str = "group";
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_ordered_and_unique() {
        let group = Group::nodes("base", vec![3, 1, 3, 2, 1]);
        assert_eq!(group.keys(), &[3, 1, 2]);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn test_extend_skips_existing() {
        let mut group = Group::elements("web", vec![0, 1]);
        group.extend(vec![1, 2]);
        assert_eq!(group.keys(), &[0, 1, 2]);
    }

    #[test]
    fn test_remap_drops_removed_keys() {
        let mut group = Group::elements("web", vec![0, 1, 2]);
        group.remap(|k| match k {
            1 => None,
            k if k > 1 => Some(k - 1),
            k => Some(k),
        });
        assert_eq!(group.keys(), &[0, 1]);
    }
}
