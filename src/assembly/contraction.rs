//! Unitig contraction
//! ==================
//!
//! Collapses every chain of index entries linked by a unique (K-1)-overlap
//! into one entry. A pass walks the signature buckets in ascending order and
//! extends each entry at one end for as long as the extension is unique in
//! both directions: the entry has exactly one neighbour at that end, and that
//! neighbour has exactly one neighbour back, namely the entry itself.
//!
//! The unique path is collected first and merged once: its keys are
//! concatenated, its read ids joined in a single k-way merge, and the merged
//! entry replaces every input in the index, so a removed entry can never be
//! reached again through its old anchors. Passes repeat until one performs
//! no merge.

use ahash::AHashSet;
use tracing::{debug, info, trace};

use crate::core::alphabet;
use crate::core::data_structures::{Orientation, Side};
use crate::core::overlap::continuations;
use crate::core::read_ids::ReadIdList;
use crate::index::{EntryId, KmerIndex};

/// Which end of a stored entry a pass extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 3' end of the stored key
    Forward,
    /// 5' end of the stored key
    Backward,
}

impl Direction {
    pub fn side(self) -> Side {
        match self {
            Direction::Forward => Side::Right,
            Direction::Backward => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractionReport {
    pub passes: usize,
    pub merges: usize,
    pub entries_after: usize,
}

impl ContractionReport {
    fn absorb(&mut self, other: ContractionReport) {
        self.passes += other.passes;
        self.merges += other.merges;
        self.entries_after = other.entries_after;
    }
}

/// Growing end of a unique path, read in the orientation of the entry the
/// path started from. Path members stay in the index until the path is
/// merged, so hits on them are told apart by the k-mer they were found
/// through: only the two outer ends of the path count as the path itself.
struct PathWalk {
    k: usize,
    side: Side,
    members: AHashSet<EntryId>,
    /// Boundary k-mer at the growing end, as read along the path
    end: Vec<u8>,
    near_anchor: Vec<u8>,
    far_anchor: Vec<u8>,
}

impl PathWalk {
    fn start(index: &KmerIndex, id: EntryId, side: Side) -> Option<Self> {
        let k = index.kmer_size();
        let key = index.entry(id)?.key();
        if key.len() < k {
            return None;
        }
        let end = end_kmer(key, k, side).to_vec();
        Some(Self {
            k,
            side,
            members: AHashSet::from_iter([id]),
            near_anchor: alphabet::canonical(&end).0.into_owned(),
            far_anchor: alphabet::canonical(end_kmer(key, k, side.opposite()))
                .0
                .into_owned(),
            end,
        })
    }

    /// The one entry the path can absorb next, and how to read it.
    fn next_step(&self, index: &KmerIndex) -> Option<(EntryId, Orientation)> {
        let mut found = continuations(index, &self.end, self.side)
            .into_iter()
            .filter(|c| !self.members.contains(&c.node));
        let candidate = found.next()?;
        if found.next().is_some() {
            return None;
        }
        let orientation = candidate.orientation?;

        // the neighbour must see the path as its only continuation back
        let oriented = orientation.apply(index.entry(candidate.node)?.key());
        let back_side = self.side.opposite();
        let mut back = continuations(index, &oriented, back_side)
            .into_iter()
            .filter(|c| c.node != candidate.node)
            .filter(|c| {
                !self.members.contains(&c.node) || {
                    let kmer = boundary_kmer(&oriented, c.base, back_side, self.k);
                    kmer == self.near_anchor || kmer == self.far_anchor
                }
            });
        let only = back.next()?;
        if back.next().is_some() || !self.members.contains(&only.node) || !only.is_mergeable()
        {
            return None;
        }

        Some((candidate.node, orientation))
    }

    fn absorb(&mut self, index: &KmerIndex, id: EntryId, orientation: Orientation) {
        let Some(entry) = index.entry(id) else {
            return;
        };
        let oriented = orientation.apply(entry.key());
        self.end = end_kmer(&oriented, self.k, self.side).to_vec();
        self.near_anchor = alphabet::canonical(&self.end).0.into_owned();
        self.members.insert(id);
    }
}

fn end_kmer(seq: &[u8], k: usize, side: Side) -> &[u8] {
    match side {
        Side::Right => &seq[seq.len() - k..],
        Side::Left => &seq[..k],
    }
}

/// Canonical k-mer a continuation of `seq` at `side` was found through.
fn boundary_kmer(seq: &[u8], base: u8, side: Side, k: usize) -> Vec<u8> {
    let mut kmer = Vec::with_capacity(k);
    match side {
        Side::Right => {
            kmer.extend_from_slice(&seq[seq.len() - (k - 1)..]);
            kmer.push(base);
        }
        Side::Left => {
            kmer.push(base);
            kmer.extend_from_slice(&seq[..k - 1]);
        }
    }
    alphabet::canonical(&kmer).0.into_owned()
}

/// The one entry that `id` can be merged with at `side`, and how that
/// entry has to be read to continue `id`.
pub fn unique_extension(
    index: &KmerIndex,
    id: EntryId,
    side: Side,
) -> Option<(EntryId, Orientation)> {
    PathWalk::start(index, id, side)?.next_step(index)
}

/// Replace `id` and every entry of `path` by one entry holding their
/// overlap merge. `path` lists the absorbed entries in walk order with the
/// orientation each is read in.
fn merge_path(
    index: &mut KmerIndex,
    id: EntryId,
    path: &[(EntryId, Orientation)],
    side: Side,
) -> Option<EntryId> {
    let overlap = index.kmer_size() - 1;
    let (merged, reads) = {
        let start = index.entry(id)?;
        let mut pieces = Vec::with_capacity(path.len());
        let mut reads = Vec::with_capacity(path.len() + 1);
        reads.push(start.reads());
        for &(node, orientation) in path {
            let entry = index.entry(node)?;
            pieces.push(orientation.apply(entry.key()));
            reads.push(entry.reads());
        }

        let length = start.len() + pieces.iter().map(|p| p.len() - overlap).sum::<usize>();
        let mut merged = Vec::with_capacity(length);
        match side {
            Side::Right => {
                merged.extend_from_slice(start.key());
                for piece in &pieces {
                    merged.extend_from_slice(&piece[overlap..]);
                }
            }
            Side::Left => {
                for piece in pieces.iter().rev() {
                    merged.extend_from_slice(&piece[..piece.len() - overlap]);
                }
                merged.extend_from_slice(start.key());
            }
        }
        (merged, ReadIdList::union_all(&reads))
    };

    index.remove_entry(id);
    for &(node, _) in path {
        index.remove_entry(node);
    }
    let key = if alphabet::is_forward_canonical(&merged) {
        merged
    } else {
        alphabet::reverse_complement(&merged)
    };
    Some(index.insert_entry(key, reads))
}

/// Extend `id` at `side` for as long as the extension stays unique, then
/// merge the whole path at once. Returns the final entry and the number of
/// entries absorbed.
pub fn extend_fully(index: &mut KmerIndex, id: EntryId, side: Side) -> (EntryId, usize) {
    let Some(mut walk) = PathWalk::start(index, id, side) else {
        return (id, 0);
    };
    let mut path = Vec::new();
    while let Some((next, orientation)) = walk.next_step(index) {
        walk.absorb(index, next, orientation);
        path.push((next, orientation));
    }
    if path.is_empty() {
        return (id, 0);
    }

    match merge_path(index, id, &path, side) {
        Some(merged) => {
            trace!(absorbed = path.len(), "merged unique path");
            (merged, path.len())
        }
        None => (id, 0),
    }
}

/// One sweep over all buckets in ascending signature order.
pub fn contract_pass(index: &mut KmerIndex, direction: Direction) -> usize {
    let side = direction.side();
    let mut merges = 0;

    for signature in index.signatures_ascending() {
        if !index.contains_bucket(signature) {
            continue;
        }
        let mut cursor = index.kmer_cursor(signature);
        while let Some(id) = cursor.advance(index) {
            let (_, merged) = extend_fully(index, id, side);
            merges += merged;
        }
        index.remove_bucket_if_empty(signature);
    }
    index.remove_empty_buckets();

    merges
}

/// Contract in one direction until a pass performs no merge.
pub fn contract(index: &mut KmerIndex, direction: Direction) -> ContractionReport {
    let mut report = ContractionReport::default();
    loop {
        let merges = contract_pass(index, direction);
        report.passes += 1;
        report.merges += merges;
        debug!(
            ?direction,
            pass = report.passes,
            merges,
            entries = index.len(),
            "contraction pass"
        );
        if merges == 0 {
            break;
        }
    }
    report.entries_after = index.len();
    info!(
        "{:?} contraction: {} merges in {} passes, {} entries left",
        direction, report.merges, report.passes, report.entries_after
    );
    report
}

/// Forward contraction followed by backward contraction.
pub fn contract_both(index: &mut KmerIndex) -> ContractionReport {
    let mut report = contract(index, Direction::Forward);
    report.absorb(contract(index, Direction::Backward));
    report
}
