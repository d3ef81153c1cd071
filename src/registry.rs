//! Ordered identifier → load-options registry
//!
//! Entries keep insertion order because containers associate payloads with
//! their options by array position. Removal compacts the sequence and
//! renumbers every later position, so the index map and the sequence never
//! disagree.

use crate::error::{DocumentError, Result};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Insertion-ordered registry with O(1) lookup by key
#[derive(Debug, Clone)]
pub struct OptionsRegistry<K, V> {
    entries: Vec<(K, V)>,
    positions: HashMap<K, usize>,
}

impl<K, V> Default for OptionsRegistry<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<K, V> OptionsRegistry<K, V>
where
    K: Copy + Eq + Hash + Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns `false` and leaves the registry unchanged if
    /// the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key, self.entries.len());
        self.entries.push((key, value));
        true
    }

    /// Remove an entry, renumbering the positions after it
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let position = self.positions.remove(key)?;
        let (_, value) = self.entries.remove(position);
        for slot in self.positions.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.positions.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let position = *self.positions.get(key)?;
        Some(&mut self.entries[position].1)
    }

    /// Apply `f` to the entry for `key`, failing if the key is unknown
    pub fn update<F>(&mut self, key: &K, f: F) -> Result<()>
    where
        F: FnOnce(&mut V),
    {
        let value = self
            .get_mut(key)
            .ok_or_else(|| DocumentError::NotFound(format!("no options registered for {}", key)))?;
        f(value);
        Ok(())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Array position of the entry for `key`
    pub fn position(&self, key: &K) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }
}
