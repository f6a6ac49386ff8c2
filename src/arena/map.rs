//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::ArenaKey;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A primary mapping of `K -> V` that hands out its own keys.
///
/// This is effectively a typed wrapper around `Vec<Option<V>>`. Keys are
/// allocated in increasing order by [`Self::insert`], and [`Self::remove`]
/// leaves a tombstone behind so that keys are never reused. Iteration skips
/// tombstones and yields entries in key order.
///
/// ```
/// # use lapis::arena_key;
/// # use lapis::arena::ArenaMap;
/// arena_key! {
///     struct Name;
/// }
///
/// let mut names = ArenaMap::new();
/// let n: Name = names.insert("Hello!");
///
/// assert_eq!(names[n], "Hello!");
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ArenaMap<K: ArenaKey, V> {
    slots: Vec<Option<V>>,
    live: usize,
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, V> ArenaMap<K, V> {
    /// Creates a new, empty arena.
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::default(),
            live: 0,
            _unused: PhantomData,
        }
    }

    /// Checks if a key refers to a live (inserted and not removed) entry.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        matches!(self.slots.get(key.key_index()), Some(Some(_)))
    }

    /// Gets the value associated with a key, if it is still live.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.slots.get(key.key_index())?.as_ref()
    }

    /// Gets the value associated with a key, if it is still live.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key.key_index())?.as_mut()
    }

    /// Adds an item into the arena, and returns the key that refers to it.
    #[inline]
    pub fn insert(&mut self, value: V) -> K {
        self.slots.push(Some(value));
        self.live += 1;

        K::key_new(self.slots.len() - 1)
    }

    /// Gets the key that *will be* returned by the next call to [`Self::insert`].
    ///
    /// ```
    /// # use lapis::arena_key;
    /// # use lapis::arena::*;
    /// # arena_key! { struct Key; }
    /// let mut map = ArenaMap::default();
    /// let k1: Key = map.next_key();
    /// assert!(!map.contains(k1));
    ///
    /// let k2 = map.insert(0);
    /// assert_eq!(k1, k2);
    /// ```
    #[inline]
    pub fn next_key(&self) -> K {
        K::key_new(self.slots.len())
    }

    /// Removes an entry, returning its value if it was live. The key is
    /// retired and will never be returned by [`Self::insert`] again.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let old = self.slots.get_mut(key.key_index())?.take();

        if old.is_some() {
            self.live -= 1;
        }

        old
    }

    /// Gets the number of live entries in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Checks if the arena has no live entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterates over the keys of every live entry, in increasing order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterates over the values of every live entry, in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.slots.iter().flatten()
    }

    /// Iterates over the values of every live entry, in key order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.slots.iter_mut().flatten()
    }

    /// Iterates over every live entry along with the key that maps to it.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (K::key_new(i), v)))
    }

    /// Iterates over every live entry along with the key that maps to it.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (K::key_new(i), v)))
    }
}

impl<K: ArenaKey, V> Default for ArenaMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PartialEq for ArenaMap<K, V>
where
    K: ArenaKey,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<K, V> Eq for ArenaMap<K, V>
where
    K: ArenaKey,
    V: Eq,
{
}

impl<K, V> Debug for ArenaMap<K, V>
where
    K: ArenaKey,
    V: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaMap ")?;

        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: ArenaKey, V> Index<K> for ArenaMap<K, V> {
    type Output = V;

    fn index(&self, key: K) -> &Self::Output {
        self.get(key)
            .expect("tried to access invalid or removed key on `ArenaMap`")
    }
}

impl<K: ArenaKey, V> IndexMut<K> for ArenaMap<K, V> {
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        self.get_mut(key)
            .expect("tried to access invalid or removed key on `ArenaMap`")
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::*;
    use crate::arena_key;

    arena_key! { struct Key; }

    #[test]
    fn insert_and_index() {
        let mut map = ArenaMap::new();
        let k1: Key = map.insert(1);
        let k2 = map.insert(2);

        assert_eq!(map[k1], 1);
        assert_eq!(map[k2], 2);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn removed_keys_are_not_reused() {
        let mut map = ArenaMap::new();
        let k1: Key = map.insert("a");
        let k2 = map.insert("b");

        assert_eq!(map.remove(k1), Some("a"));
        assert_eq!(map.remove(k1), None);

        let k3 = map.insert("c");

        assert_ne!(k1, k3);
        assert!(!map.contains(k1));
        assert_eq!(map.get(k1), None);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![k2, k3]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn iteration_skips_tombstones() {
        let mut map = ArenaMap::<Key, i32>::new();
        let keys: Vec<Key> = (0..5).map(|i| map.insert(i)).collect();

        map.remove(keys[1]);
        map.remove(keys[3]);

        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![0, 2, 4]);

        for (_, v) in map.iter_mut() {
            *v *= 10;
        }

        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![0, 20, 40]);
    }

    #[test]
    #[should_panic]
    fn indexing_removed_key_panics() {
        let mut map = ArenaMap::new();
        let k: Key = map.insert(5);

        map.remove(k);

        let _ = map[k];
    }
}
