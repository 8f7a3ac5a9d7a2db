// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pool-backed element list with typed property maps
//!
//! Elements are addressed by small integer handles. Property maps are
//! type-erased arrays indexed by handle; every map is grown whenever a new
//! handle is allocated so `property(&p)[id.index()]` is always in bounds for
//! an allocated id.

use crate::pool::{Pool, Slot};
use ahash::AHashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Integer handle into an [`IndexedList`]
pub trait ElementId: Copy + Eq + Hash + fmt::Debug {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

/// Typed handle to a property map
///
/// A handle outlives its map only as a stale value: once the map is removed,
/// accessing it panics even if a new map reuses the same storage slot.
pub struct Property<T> {
    slot: usize,
    generation: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Property<T> {
    fn new(slot: usize, generation: u64) -> Self {
        Self {
            slot,
            generation,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Property<T> {}

impl<T> PartialEq for Property<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.generation == other.generation
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Property<{}>({}#{})", type_name::<T>(), self.slot, self.generation)
    }
}

trait PropertyStorage {
    fn resize(&mut self, len: usize);
    fn fresh(&self, len: usize) -> Box<dyn PropertyStorage>;
    fn value_type(&self) -> &'static str;
    fn generation(&self) -> u64;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct PropertyArray<T> {
    generation: u64,
    default: T,
    values: Vec<T>,
}

impl<T: Clone + 'static> PropertyStorage for PropertyArray<T> {
    fn resize(&mut self, len: usize) {
        self.values.resize(len, self.default.clone());
    }

    fn fresh(&self, len: usize) -> Box<dyn PropertyStorage> {
        Box::new(PropertyArray {
            generation: self.generation,
            default: self.default.clone(),
            values: vec![self.default.clone(); len],
        })
    }

    fn value_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Element storage with liveness tracking and property maps
pub struct IndexedList<N, I> {
    nodes: Pool<N>,
    alive: Vec<bool>,
    properties: Vec<Option<Box<dyn PropertyStorage>>>,
    names: AHashMap<String, usize>,
    next_generation: u64,
    _id: PhantomData<I>,
}

impl<N: Default, I: ElementId> IndexedList<N, I> {
    pub fn new() -> Self {
        Self::with_pool(Pool::new())
    }

    pub fn with_first_chunk_size(first_chunk_size: usize) -> Self {
        Self::with_pool(Pool::with_first_chunk_size(first_chunk_size))
    }

    fn with_pool(nodes: Pool<N>) -> Self {
        Self {
            nodes,
            alive: Vec::new(),
            properties: Vec::new(),
            names: AHashMap::new(),
            next_generation: 0,
            _id: PhantomData,
        }
    }

    /// Allocates a node and grows every property map to cover it.
    ///
    /// A recycled slot keeps whatever the previous occupant left in it.
    pub fn allocate(&mut self) -> I {
        let slot = self.nodes.allocate();
        let index = slot.index();
        if index >= self.alive.len() {
            self.alive.resize(index + 1, false);
            let len = self.alive.len();
            for storage in self.properties.iter_mut().flatten() {
                storage.resize(len);
            }
        }
        self.alive[index] = true;
        I::from_index(index)
    }

    pub fn deallocate(&mut self, id: I) {
        assert!(self.is_available(id), "{:?} is not allocated", id);
        self.alive[id.index()] = false;
        self.nodes.deallocate(Slot::from_index(id.index()));
    }

    /// Drops all nodes. Property maps survive but become empty.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.alive.clear();
        for storage in self.properties.iter_mut().flatten() {
            storage.resize(0);
        }
    }
}

impl<N, I: ElementId> IndexedList<N, I> {
    pub fn is_available(&self, id: I) -> bool {
        self.alive.get(id.index()).copied().unwrap_or(false)
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.nodes.n_available()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of every property map; all allocated ids are below it.
    pub fn capacity(&self) -> usize {
        self.alive.len()
    }

    pub fn get(&self, id: I) -> Option<&N> {
        if self.is_available(id) {
            self.nodes.get(Slot::from_index(id.index()))
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut N> {
        if self.is_available(id) {
            self.nodes.get_mut(Slot::from_index(id.index()))
        } else {
            None
        }
    }

    /// Live ids in increasing order.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| I::from_index(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &N)> + '_ {
        self.ids().map(move |id| (id, &self.nodes[Slot::from_index(id.index())]))
    }

    /// Creates the named map, or returns the existing one.
    ///
    /// # Panics
    /// If a map with this name exists with a different value type.
    pub fn add_property<T: Clone + 'static>(&mut self, name: &str, default: T) -> Property<T> {
        if let Some(&slot) = self.names.get(name) {
            self.check_type::<T>(slot, name);
            return self.handle(slot);
        }
        let property = self.add_anonymous_property(default);
        self.names.insert(name.to_string(), property.slot);
        property
    }

    /// Creates a map that can only be reached through the returned handle.
    pub fn add_anonymous_property<T: Clone + 'static>(&mut self, default: T) -> Property<T> {
        let generation = self.next_generation;
        self.next_generation += 1;
        let storage = PropertyArray {
            generation,
            values: vec![default.clone(); self.alive.len()],
            default,
        };
        let slot = match self.properties.iter().position(Option::is_none) {
            Some(free) => free,
            None => {
                self.properties.push(None);
                self.properties.len() - 1
            }
        };
        self.properties[slot] = Some(Box::new(storage));
        Property::new(slot, generation)
    }

    /// # Panics
    /// If no map with this name exists or its value type differs.
    pub fn get_property<T: 'static>(&self, name: &str) -> Property<T> {
        match self.find_property(name) {
            Some(property) => property,
            None => panic!("no property named `{}`", name),
        }
    }

    pub fn find_property<T: 'static>(&self, name: &str) -> Option<Property<T>> {
        let &slot = self.names.get(name)?;
        self.check_type::<T>(slot, name);
        Some(self.handle(slot))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Removes the named map; handles to it become invalid.
    pub fn erase_property(&mut self, name: &str) -> bool {
        match self.names.remove(name) {
            Some(slot) => {
                self.properties[slot] = None;
                true
            }
            None => false,
        }
    }

    pub fn remove_property<T>(&mut self, property: Property<T>) {
        self.names.retain(|_, slot| *slot != property.slot);
        if let Some(storage) = self.properties.get_mut(property.slot) {
            *storage = None;
        }
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.keys().map(String::as_str)
    }

    pub fn property<T: 'static>(&self, property: &Property<T>) -> &[T] {
        match self
            .properties
            .get(property.slot)
            .and_then(Option::as_ref)
            .filter(|s| s.generation() == property.generation)
            .and_then(|s| s.as_any().downcast_ref::<PropertyArray<T>>())
        {
            Some(array) => &array.values,
            None => panic!("stale handle {:?}", property),
        }
    }

    pub fn property_mut<T: 'static>(&mut self, property: &Property<T>) -> &mut [T] {
        match self
            .properties
            .get_mut(property.slot)
            .and_then(Option::as_mut)
            .filter(|s| s.generation() == property.generation)
            .and_then(|s| s.as_any_mut().downcast_mut::<PropertyArray<T>>())
        {
            Some(array) => &mut array.values,
            None => panic!("stale handle {:?}", property),
        }
    }

    fn handle<T>(&self, slot: usize) -> Property<T> {
        let generation = self.properties[slot].as_ref().map_or(0, |s| s.generation());
        Property::new(slot, generation)
    }

    fn check_type<T: 'static>(&self, slot: usize, name: &str) {
        if let Some(storage) = &self.properties[slot] {
            assert!(
                storage.as_any().is::<PropertyArray<T>>(),
                "property `{}` holds {}, not {}",
                name,
                storage.value_type(),
                type_name::<T>()
            );
        }
    }
}

impl<N: Default, I: ElementId> Default for IndexedList<N, I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies nodes and liveness. Property maps come back with the same names
/// and length, filled with their default values.
impl<N: Clone, I: ElementId> Clone for IndexedList<N, I> {
    fn clone(&self) -> Self {
        let len = self.alive.len();
        Self {
            nodes: self.nodes.clone(),
            alive: self.alive.clone(),
            properties: self
                .properties
                .iter()
                .map(|storage| storage.as_ref().map(|s| s.fresh(len)))
                .collect(),
            names: self.names.clone(),
            next_generation: self.next_generation,
            _id: PhantomData,
        }
    }
}

impl<N, I: ElementId> fmt::Debug for IndexedList<N, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedList")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("properties", &self.names.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<N, I: ElementId> Index<I> for IndexedList<N, I> {
    type Output = N;

    fn index(&self, id: I) -> &N {
        match self.get(id) {
            Some(node) => node,
            None => panic!("{:?} is not allocated", id),
        }
    }
}

impl<N, I: ElementId> IndexMut<I> for IndexedList<N, I> {
    fn index_mut(&mut self, id: I) -> &mut N {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("{:?} is not allocated", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Id(usize);

    impl ElementId for Id {
        fn from_index(index: usize) -> Self {
            Id(index)
        }
        fn index(self) -> usize {
            self.0
        }
    }

    #[test]
    fn test_allocate_grows_properties() {
        let mut list: IndexedList<u32, Id> = IndexedList::with_first_chunk_size(2);
        let weight = list.add_property("weight", 1.5f64);
        let ids: Vec<Id> = (0..5).map(|_| list.allocate()).collect();
        assert_eq!(list.len(), 5);
        assert_eq!(list.property(&weight).len(), 5);
        list.property_mut(&weight)[ids[3].index()] = 4.0;
        assert_eq!(list.property(&weight)[3], 4.0);
        assert_eq!(list.property(&weight)[4], 1.5);

        // maps added later start at the current length
        let tag = list.add_anonymous_property(7u8);
        assert_eq!(list.property(&tag), &[7u8; 5]);
    }

    #[test]
    fn test_add_property_returns_existing() {
        let mut list: IndexedList<u32, Id> = IndexedList::new();
        let a = list.add_property("label", String::from("x"));
        let id = list.allocate();
        list.property_mut(&a)[id.index()] = "first".to_string();
        let b = list.add_property("label", String::from("ignored"));
        assert_eq!(a, b);
        assert_eq!(list.property(&b)[id.index()], "first");
        assert_eq!(list.get_property::<String>("label"), a);
    }

    #[test]
    #[should_panic(expected = "property `label` holds")]
    fn test_property_type_mismatch_panics() {
        let mut list: IndexedList<u32, Id> = IndexedList::new();
        list.add_property("label", 0u32);
        list.add_property("label", 0.0f32);
    }

    #[test]
    #[should_panic(expected = "no property named")]
    fn test_get_missing_property_panics() {
        let list: IndexedList<u32, Id> = IndexedList::new();
        list.get_property::<u32>("missing");
    }

    #[test]
    fn test_erase_property() {
        let mut list: IndexedList<u32, Id> = IndexedList::new();
        list.add_property("a", 0i32);
        assert!(list.erase_property("a"));
        assert!(!list.erase_property("a"));
        assert!(list.find_property::<i32>("a").is_none());
        // the name can be reused with another type
        list.add_property("a", false);
        assert!(list.has_property("a"));
    }

    #[test]
    #[should_panic(expected = "stale handle")]
    fn test_removed_property_handle_stays_stale() {
        let mut list: IndexedList<u32, Id> = IndexedList::new();
        list.allocate();
        let old = list.add_anonymous_property(1i32);
        list.remove_property(old);
        // the new map reuses the freed storage slot
        let new = list.add_anonymous_property(2i32);
        assert_ne!(old, new);
        assert_eq!(list.property(&new), &[2]);
        list.property(&old);
    }

    #[test]
    fn test_liveness_and_iteration() {
        let mut list: IndexedList<u32, Id> = IndexedList::new();
        let a = list.allocate();
        let b = list.allocate();
        let c = list.allocate();
        list[a] = 10;
        list[b] = 20;
        list[c] = 30;
        list.deallocate(b);
        assert!(list.is_available(a));
        assert!(!list.is_available(b));
        assert!(!list.is_available(Id(99)));
        let values: Vec<u32> = list.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10, 30]);
        assert_eq!(list.get(b), None);
    }

    #[test]
    #[should_panic(expected = "is not allocated")]
    fn test_double_deallocate_panics() {
        let mut list: IndexedList<u32, Id> = IndexedList::new();
        let a = list.allocate();
        list.allocate();
        list.deallocate(a);
        list.deallocate(a);
    }

    #[test]
    fn test_clone_resets_property_values() {
        let mut list: IndexedList<u32, Id> = IndexedList::new();
        let p = list.add_property("p", 0i64);
        let id = list.allocate();
        list[id] = 5;
        list.property_mut(&p)[id.index()] = 42;

        let copy = list.clone();
        assert_eq!(copy[id], 5);
        let q = copy.get_property::<i64>("p");
        assert_eq!(copy.property(&q), &[0i64]);
        assert_eq!(list.property(&p), &[42i64]);
    }

    #[test]
    fn test_clear_keeps_maps() {
        let mut list: IndexedList<u32, Id> = IndexedList::new();
        let p = list.add_property("p", 1u8);
        list.allocate();
        list.allocate();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.property(&p).len(), 0);
        list.allocate();
        assert_eq!(list.property(&p), &[1u8]);
    }
}
