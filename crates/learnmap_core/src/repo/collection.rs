//! Ordered id-keyed collection backing every entity store.
//!
//! # Invariants
//! - `order` and `items` always hold the same id set.
//! - Iteration follows `order` (server listing order, or local prepend).

use std::collections::HashMap;
use uuid::Uuid;

/// Minimal surface a stored entity exposes to its collection.
pub trait Entity: Clone {
    fn entity_id(&self) -> Uuid;
    fn is_active(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct Collection<T: Entity> {
    items: HashMap<Uuid, T>,
    order: Vec<Uuid>,
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.items.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn active(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().filter(|item| item.is_active())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drops everything and takes `items` in the given order.
    pub(crate) fn replace_all(&mut self, items: impl IntoIterator<Item = T>) {
        self.clear();
        for item in items {
            self.upsert(item);
        }
    }

    /// Replaces in place, or appends when the id is new.
    pub(crate) fn upsert(&mut self, item: T) {
        let id = item.entity_id();
        if self.items.insert(id, item).is_none() {
            self.order.push(id);
        }
    }

    /// Replaces in place, or prepends when the id is new.
    pub(crate) fn push_front(&mut self, item: T) {
        let id = item.entity_id();
        if self.items.insert(id, item).is_none() {
            self.order.insert(0, id);
        }
    }

    pub(crate) fn remove(&mut self, id: Uuid) -> Option<T> {
        let removed = self.items.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(removed)
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.items.retain(|_, item| keep(item));
        let items = &self.items;
        self.order.retain(|id| items.contains_key(id));
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Collection, Entity};
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: Uuid,
        label: &'static str,
        archived: bool,
    }

    impl Entity for Row {
        fn entity_id(&self) -> Uuid {
            self.id
        }

        fn is_active(&self) -> bool {
            !self.archived
        }
    }

    fn row(label: &'static str) -> Row {
        Row {
            id: Uuid::new_v4(),
            label,
            archived: false,
        }
    }

    #[test]
    fn upsert_keeps_position_of_existing_ids() {
        let mut rows = Collection::default();
        let a = row("a");
        let b = row("b");
        rows.upsert(a.clone());
        rows.upsert(b.clone());
        rows.upsert(Row {
            label: "a2",
            ..a.clone()
        });

        let labels: Vec<_> = rows.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["a2", "b"]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn push_front_prepends_new_ids_only() {
        let mut rows = Collection::default();
        let a = row("a");
        let b = row("b");
        rows.upsert(a);
        rows.push_front(b.clone());
        rows.push_front(Row {
            label: "b2",
            ..b
        });

        let labels: Vec<_> = rows.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["b2", "a"]);
    }

    #[test]
    fn retain_and_remove_keep_order_in_sync() {
        let mut rows = Collection::default();
        let a = row("a");
        let b = Row {
            archived: true,
            ..row("b")
        };
        let c = row("c");
        rows.replace_all(vec![a.clone(), b, c.clone()]);
        assert_eq!(rows.active().count(), 2);

        rows.retain(|r| r.is_active());
        assert_eq!(rows.len(), 2);
        assert!(rows.remove(a.id).is_some());
        assert!(rows.remove(a.id).is_none());
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![c.id]);
    }
}
