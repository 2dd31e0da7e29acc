use sovereign_protocol::EntityId;

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            value: None,
        }
    }
}

/// Generational storage for units and cities.
///
/// - Stable iteration order: ascending slot index.
/// - Safe handles: a removed entity's id never resolves again.
#[derive(Clone, Debug)]
pub struct EntityStore<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> EntityStore<T> {
    /// Rebuild a store with the given ids, e.g. when restoring a snapshot.
    ///
    /// Unused slots below the highest index go on the free list. Returns
    /// `None` if two entries claim the same slot.
    pub fn from_entries(entries: impl IntoIterator<Item = (EntityId, T)>) -> Option<Self> {
        let mut slots: Vec<Slot<T>> = Vec::new();
        for (id, value) in entries {
            let index = id.index as usize;
            if index >= slots.len() {
                slots.resize_with(index + 1, Slot::default);
            }
            let slot = &mut slots[index];
            if slot.value.is_some() {
                return None;
            }
            slot.generation = id.generation;
            slot.value = Some(value);
        }
        let free = slots
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, slot)| slot.value.is_none())
            .map(|(index, _)| index as u32)
            .collect();
        Some(Self { slots, free })
    }

    pub fn insert(&mut self, value: T) -> EntityId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            EntityId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            EntityId::new(index, 0)
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation == id.generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation == id.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter_ordered(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            Some((EntityId::new(index as u32, slot.generation), value))
        })
    }

    pub fn iter_ordered_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let value = slot.value.as_mut()?;
                Some((EntityId::new(index as u32, slot.generation), value))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_ids_do_not_resolve_after_reuse() {
        let mut store = EntityStore::default();
        let a = store.insert("a");
        store.remove(a);
        let b = store.insert("b");
        assert_eq!(a.index, b.index);
        assert_ne!(a, b);
        assert!(store.get(a).is_none());
        assert_eq!(store.get(b), Some(&"b"));
    }

    #[test]
    fn from_entries_keeps_ids_and_refills_holes() {
        let mut store =
            EntityStore::from_entries([(EntityId::new(2, 5), 'x'), (EntityId::new(0, 1), 'y')])
                .unwrap();
        assert_eq!(store.get(EntityId::new(2, 5)), Some(&'x'));
        assert_eq!(store.get(EntityId::new(0, 1)), Some(&'y'));
        assert_eq!(store.len(), 2);

        let fresh = store.insert('z');
        assert_eq!(fresh.index, 1);
        let order: Vec<_> = store.iter_ordered().map(|(_, v)| *v).collect();
        assert_eq!(order, vec!['y', 'z', 'x']);
    }

    #[test]
    fn from_entries_rejects_duplicate_slots() {
        let dup = EntityStore::from_entries([(EntityId::new(0, 0), 1), (EntityId::new(0, 1), 2)]);
        assert!(dup.is_none());
    }
}
