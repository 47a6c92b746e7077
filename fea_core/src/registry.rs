//! # Named Registries
//!
//! Insertion-ordered, name-keyed storage used for every collection in the
//! model graph that is addressed by name (parts, materials, sections,
//! instances, loads, steps, ...).
//!
//! Inserting a name that is already present never overwrites: the call is a
//! no-op, a warning is logged and [`AddOutcome::Duplicate`] is returned.
//!
//! ## Example
//!
//! ```rust
//! use fea_core::model::Material;
//! use fea_core::registry::{AddOutcome, Registry};
//!
//! let mut materials = Registry::new();
//! let steel = Material::elastic_isotropic("steel", 210e9, 0.3, 7850.0);
//! assert_eq!(materials.insert(steel.clone()), AddOutcome::Added);
//! assert_eq!(materials.insert(steel), AddOutcome::Duplicate);
//! assert_eq!(materials.len(), 1);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An entity that is registered under a unique name.
pub trait Named {
    /// Human-readable entity kind, used in diagnostics
    const KIND: &'static str;

    /// Registration name
    fn name(&self) -> &str;
}

/// Outcome of a registration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddOutcome {
    /// The entity was stored
    Added,
    /// An entity with the same name already existed; nothing changed
    Duplicate,
}

impl AddOutcome {
    /// True when the entity was stored
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added)
    }
}

/// Insertion-ordered collection with unique names.
///
/// Serializes as a plain list; deserializing rebuilds the name index.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Named> Registry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` unless its name is taken.
    pub fn insert(&mut self, item: T) -> AddOutcome {
        let name = item.name().to_string();
        if self.index.contains_key(&name) {
            tracing::warn!(kind = T::KIND, name = %name, "duplicate {} '{}' skipped", T::KIND, name);
            return AddOutcome::Duplicate;
        }
        self.index.insert(name, self.items.len());
        self.items.push(item);
        AddOutcome::Added
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.index.get(name) {
            Some(&i) => self.items.get_mut(i),
            None => None,
        }
    }

    /// Two distinct entries borrowed mutably at once
    pub fn get_pair_mut(&mut self, first: &str, second: &str) -> Option<(&mut T, &mut T)> {
        let i = *self.index.get(first)?;
        let j = *self.index.get(second)?;
        if i == j {
            return None;
        }
        if i < j {
            let (left, right) = self.items.split_at_mut(j);
            Some((&mut left[i], &mut right[0]))
        } else {
            let (left, right) = self.items.split_at_mut(i);
            Some((&mut right[0], &mut left[j]))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Remove an entry by name, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let position = self.index.remove(name)?;
        let removed = self.items.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.name())
    }
}

impl<'a, T: Named> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Named> FromIterator<T> for Registry<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for item in iter {
            registry.insert(item);
        }
        registry
    }
}

impl<T: Serialize> Serialize for Registry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Named + Deserialize<'de>> Deserialize<'de> for Registry<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        name: String,
        value: i32,
    }

    impl Named for Tag {
        const KIND: &'static str = "tag";
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn tag(name: &str, value: i32) -> Tag {
        Tag {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn test_duplicate_is_noop() {
        let mut reg = Registry::new();
        assert!(reg.insert(tag("a", 1)).is_added());
        assert_eq!(reg.insert(tag("a", 2)), AddOutcome::Duplicate);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("a").unwrap().value, 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let reg: Registry<Tag> = vec![tag("c", 0), tag("a", 0), tag("b", 0)].into_iter().collect();
        let names: Vec<&str> = reg.names().collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut reg: Registry<Tag> = vec![tag("a", 1), tag("b", 2), tag("c", 3)].into_iter().collect();
        assert_eq!(reg.remove("a").unwrap().value, 1);
        assert_eq!(reg.get("c").unwrap().value, 3);
        assert!(!reg.contains("a"));
        assert!(reg.remove("zzz").is_none());
    }

    #[test]
    fn test_pair_borrow() {
        let mut reg: Registry<Tag> = vec![tag("a", 1), tag("b", 2)].into_iter().collect();
        let (b, a) = reg.get_pair_mut("b", "a").unwrap();
        std::mem::swap(&mut a.value, &mut b.value);
        assert_eq!(reg.get("a").unwrap().value, 2);
        assert!(reg.get_pair_mut("a", "a").is_none());
        assert!(reg.get_pair_mut("a", "x").is_none());
    }

    #[test]
    fn test_serializes_as_list() {
        let reg: Registry<Tag> = vec![tag("a", 1), tag("b", 2)].into_iter().collect();
        let json = serde_json::to_string(&reg).unwrap();
        assert!(json.starts_with('['));
        let back: Registry<Tag> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reg);
    }
}
