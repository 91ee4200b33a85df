//! Supporting read-id lists
//!
//! Every index entry carries the ids of the reads it was seen in, kept
//! strictly descending and free of duplicates. Reads are indexed in input
//! order, so a new id is almost always larger than anything already stored
//! and lands at the front in O(1); out-of-order ids are spliced in place.

use serde::{Deserialize, Serialize};
use std::collections::{BinaryHeap, VecDeque};

/// Sequential read identifier assigned in input order.
pub type ReadId = u32;

/// Merge two strictly descending id sequences into one strictly descending,
/// duplicate-free vector holding their union.
pub fn merge_descending<A, B>(a: A, b: B) -> Vec<ReadId>
where
    A: IntoIterator<Item = ReadId>,
    B: IntoIterator<Item = ReadId>,
{
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();
    let mut merged = Vec::with_capacity(a.size_hint().0 + b.size_hint().0);

    loop {
        let next = match (a.peek(), b.peek()) {
            (Some(&x), Some(&y)) if x > y => a.next(),
            (Some(&x), Some(&y)) if x < y => b.next(),
            (Some(_), Some(_)) => {
                b.next();
                a.next()
            }
            (Some(_), None) => a.next(),
            (None, Some(_)) => b.next(),
            (None, None) => break,
        };
        if let Some(id) = next {
            merged.push(id);
        }
    }

    merged
}

/// Strictly descending, duplicate-free list of supporting read ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadIdList {
    ids: VecDeque<ReadId>,
}

impl ReadIdList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(id: ReadId) -> Self {
        let mut ids = VecDeque::with_capacity(1);
        ids.push_back(id);
        Self { ids }
    }

    /// Build from ids that are already strictly descending.
    pub(crate) fn from_descending(ids: Vec<ReadId>) -> Self {
        debug_assert!(ids.windows(2).all(|w| w[0] > w[1]));
        Self { ids: ids.into() }
    }

    /// Insert `id`, keeping the list descending. Returns false if the id was
    /// already present.
    pub fn insert(&mut self, id: ReadId) -> bool {
        match self.ids.front() {
            None => {
                self.ids.push_front(id);
                true
            }
            Some(&front) if id > front => {
                self.ids.push_front(id);
                true
            }
            Some(&front) if id == front => false,
            Some(_) => match self.ids.binary_search_by(|probe| id.cmp(probe)) {
                Ok(_) => false,
                Err(pos) => {
                    self.ids.insert(pos, id);
                    true
                }
            },
        }
    }

    pub fn contains(&self, id: ReadId) -> bool {
        self.ids.binary_search_by(|probe| id.cmp(probe)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in descending order.
    pub fn iter(&self) -> impl Iterator<Item = ReadId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ReadId> {
        self.ids.iter().copied().collect()
    }

    /// Union of two lists.
    pub fn merge(&self, other: &ReadIdList) -> ReadIdList {
        Self::from_descending(merge_descending(self.iter(), other.iter()))
    }

    /// Union of any number of lists in one k-way pass.
    pub fn union_all(lists: &[&ReadIdList]) -> ReadIdList {
        let mut heads: BinaryHeap<(ReadId, usize)> = lists
            .iter()
            .enumerate()
            .filter_map(|(list, ids)| ids.ids.front().map(|&id| (id, list)))
            .collect();
        let mut positions = vec![0usize; lists.len()];
        let widest = lists.iter().map(|ids| ids.len()).max().unwrap_or(0);
        let mut merged = Vec::with_capacity(widest);

        while let Some((id, list)) = heads.pop() {
            if merged.last() != Some(&id) {
                merged.push(id);
            }
            positions[list] += 1;
            if let Some(&next) = lists[list].ids.get(positions[list]) {
                heads.push((next, list));
            }
        }
        Self::from_descending(merged)
    }

    /// Fold `other` into `self`.
    pub fn absorb(&mut self, other: &ReadIdList) {
        if other.is_empty() {
            return;
        }
        *self = self.merge(other);
    }
}

impl FromIterator<ReadId> for ReadIdList {
    fn from_iter<I: IntoIterator<Item = ReadId>>(iter: I) -> Self {
        let mut ids: Vec<ReadId> = iter.into_iter().collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.dedup();
        Self::from_descending(ids)
    }
}
