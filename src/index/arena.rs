//! Slot arena with generation-checked handles
//! ===========================================
//!
//! Hash chains and index entries live in arenas instead of behind raw
//! pointers. A handle carries the generation of the slot it was issued for,
//! so a handle that outlives its entry is simply rejected: removing it twice
//! is a no-op and reading through it yields `None`.

use std::fmt;

/// Stable reference to a value stored in an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot position; iteration over an arena visits slots in this order.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever allocated, occupied or not.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn insert(&mut self, value: T) -> Handle {
        let handle = match self.free_head {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                let (generation, next_free) = match *slot {
                    Slot::Vacant {
                        generation,
                        next_free,
                    } => (generation, next_free),
                    Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
                };
                self.free_head = next_free;
                *slot = Slot::Occupied { generation, value };
                Handle { index, generation }
            }
            None => {
                let index = slot_index(self.slots.len());
                self.slots.push(Slot::Occupied {
                    generation: 0,
                    value,
                });
                Handle {
                    index,
                    generation: 0,
                }
            }
        };
        self.len += 1;
        handle
    }

    /// Remove and return the value behind `handle`. Stale handles return
    /// `None` and leave the arena untouched.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let vacant = Slot::Vacant {
            generation: handle.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        let previous = std::mem::replace(&mut self.slots[handle.index()], vacant);
        self.free_head = Some(handle.index);
        self.len -= 1;
        match previous {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn contains(&self, handle: Handle) -> bool {
        matches!(
            self.slots.get(handle.index()),
            Some(Slot::Occupied { generation, .. }) if *generation == handle.generation
        )
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        match self.slots.get(handle.index()) {
            Some(Slot::Occupied { generation, value }) if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.slots.get_mut(handle.index()) {
            Some(Slot::Occupied { generation, value }) if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Handle of the first occupied slot at or after `position`.
    pub fn next_occupied(&self, position: usize) -> Option<Handle> {
        self.slots
            .iter()
            .enumerate()
            .skip(position)
            .find_map(|(index, slot)| match slot {
                Slot::Occupied { generation, .. } => Some(Handle {
                    index: index as u32,
                    generation: *generation,
                }),
                Slot::Vacant { .. } => None,
            })
    }

    /// Occupied values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, value } => Some((
                    Handle {
                        index: index as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Slot::Vacant { .. } => None,
            })
    }
}

/// Handle index for a new slot at `position`. Handles are 32 bits wide, so
/// running past `u32::MAX` slots is capacity exhaustion, like `Vec`
/// overflowing `isize::MAX` bytes.
fn slot_index(position: usize) -> u32 {
    match u32::try_from(position) {
        Ok(index) => index,
        Err(_) => arena_exhausted(position),
    }
}

#[cold]
#[inline(never)]
fn arena_exhausted(position: usize) -> ! {
    panic!("arena exhausted: slot {position} does not fit a 32-bit handle")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_stale_handle_cannot_double_free() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        assert_eq!(arena.remove(a), Some(1));
        // slot is reused with a bumped generation
        let b = arena.insert(2);
        assert_eq!(a.index(), b.index());
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.get(b), Some(&2));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_next_occupied_skips_vacant_slots() {
        let mut arena = Arena::new();
        let handles: Vec<_> = (0..5).map(|v| arena.insert(v)).collect();
        arena.remove(handles[1]);
        arena.remove(handles[2]);
        assert_eq!(arena.next_occupied(1), Some(handles[3]));
        assert_eq!(arena.next_occupied(5), None);
        let values: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0, 3, 4]);
    }

    #[test]
    fn test_slot_index_within_handle_range() {
        assert_eq!(slot_index(0), 0);
        assert_eq!(slot_index(u32::MAX as usize), u32::MAX);
    }

    #[test]
    #[should_panic(expected = "arena exhausted")]
    fn test_slot_index_past_handle_range_is_fatal() {
        slot_index(u32::MAX as usize + 1);
    }
}
