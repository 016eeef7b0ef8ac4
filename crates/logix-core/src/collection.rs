//! Name-keyed arena collections.
//!
//! A [`Collection`] owns its entries in insertion order and hands out stable
//! [`Id`]s. Removing an entry leaves a vacant slot so ids of the remaining
//! entries stay valid; names map to ids in O(1).

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Anything stored in a [`Collection`].
pub trait Named {
    fn name(&self) -> &str;
}

/// Stable index of an entry in a [`Collection<T>`].
pub struct Id<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index)
    }
}

/// Ordered, name-unique arena.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    slots: Vec<Option<T>>,
    by_name: HashMap<String, usize>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T: Named> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item`. When an entry with the same name exists it is replaced
    /// in place if `overwrite` is set, otherwise `item` is dropped.
    ///
    /// Returns the id of the entry now holding that name.
    pub fn append(&mut self, item: T, overwrite: bool) -> Id<T> {
        if let Some(&index) = self.by_name.get(item.name()) {
            if overwrite {
                self.slots[index] = Some(item);
            }
            return Id::new(index);
        }
        let index = self.slots.len();
        self.by_name.insert(item.name().to_string(), index);
        self.slots.push(Some(item));
        Id::new(index)
    }

    /// Insert every item, keeping existing entries.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>, overwrite: bool) {
        for item in items {
            self.append(item, overwrite);
        }
    }

    /// Remove the entry called `name`, returning it.
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let index = self.by_name.remove(name)?;
        self.slots[index].take()
    }

    pub fn id_of(&self, name: &str) -> Option<Id<T>> {
        self.by_name.get(name).map(|&i| Id::new(i))
    }

    pub fn by_name(&self, name: &str) -> Option<&T> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut T> {
        let id = self.id_of(name)?;
        self.get_mut(id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.slots.get(id.index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.slots.get_mut(id.index).and_then(Option::as_mut)
    }

    /// Rename the entry at `id`, keeping the name index current.
    ///
    /// `apply` performs the rename on the entry and may fail, in which case the
    /// index is untouched. Returns `false` if the new name is already taken.
    pub fn rename<E>(
        &mut self,
        id: Id<T>,
        new_name: &str,
        apply: impl FnOnce(&mut T, &str) -> Result<(), E>,
    ) -> Result<bool, E> {
        if self.by_name.get(new_name).is_some_and(|&i| i != id.index) {
            return Ok(false);
        }
        let Some(item) = self.slots.get_mut(id.index).and_then(Option::as_mut) else {
            return Ok(false);
        };
        let old = item.name().to_string();
        apply(item, new_name)?;
        self.by_name.remove(&old);
        self.by_name.insert(item.name().to_string(), id.index);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Entries with their ids, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|item| (Id::new(i), item)))
    }

    pub fn ids(&self) -> Vec<Id<T>> {
        self.entries().map(|(id, _)| id).collect()
    }
}

/// Equal when the live entries are equal and in the same order.
impl<T: Named + PartialEq> PartialEq for Collection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Named> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.extend(iter, false);
        collection
    }
}

impl<'a, T: Named> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = Box<dyn Iterator<Item = &'a T> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: String,
        value: u32,
    }

    impl Named for Item {
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn item(name: &str, value: u32) -> Item {
        Item {
            name: name.into(),
            value,
        }
    }

    #[test]
    fn append_keeps_order_and_dedups() {
        let mut c = Collection::new();
        c.append(item("b", 1), false);
        c.append(item("a", 2), false);
        c.append(item("b", 3), false);
        let names: Vec<_> = c.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(c.by_name("b").unwrap().value, 1);
    }

    #[test]
    fn overwrite_replaces_in_place() {
        let mut c = Collection::new();
        let first = c.append(item("a", 1), false);
        c.append(item("b", 2), false);
        let again = c.append(item("a", 9), true);
        assert_eq!(first, again);
        assert_eq!(c.iter().next().unwrap().value, 9);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn removal_keeps_other_ids_stable() {
        let mut c = Collection::new();
        let a = c.append(item("a", 1), false);
        let b = c.append(item("b", 2), false);
        assert_eq!(c.remove("a").unwrap().value, 1);
        assert!(c.get(a).is_none());
        assert_eq!(c.get(b).unwrap().value, 2);
        assert!(c.remove("a").is_none());
        assert_eq!(c.len(), 1);
        let names: Vec<_> = c.entries().map(|(id, i)| (id, i.name.clone())).collect();
        assert_eq!(names, vec![(b, "b".to_string())]);
    }

    #[test]
    fn rename_updates_index() {
        let mut c = Collection::new();
        let a = c.append(item("a", 1), false);
        c.append(item("b", 2), false);
        let renamed = c
            .rename(a, "z", |i, n| {
                i.name = n.to_string();
                Ok::<_, ()>(())
            })
            .unwrap();
        assert!(renamed);
        assert!(c.by_name("a").is_none());
        assert_eq!(c.id_of("z"), Some(a));

        let clash = c
            .rename(a, "b", |i, n| {
                i.name = n.to_string();
                Ok::<_, ()>(())
            })
            .unwrap();
        assert!(!clash);
        assert_eq!(c.get(a).unwrap().name, "z");
    }
}
