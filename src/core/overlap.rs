//! (K-1)-overlap queries over a set of stored sequences
//!
//! Both the k-mer index and the unitig set register every stored sequence
//! under the canonical form of its two end k-mers ("anchors"). A
//! continuation of a sequence at one end is found by appending (or
//! prepending) each base to the K-1 boundary symbols, canonicalising the
//! resulting k-mer, and looking it up among the anchors. The stored
//! sequence found that way is then oriented so that it really continues the
//! query; an anchor that matches at the wrong end cannot be merged and is
//! reported without an orientation.

use crate::core::alphabet::{self, BASES};
use crate::core::data_structures::{Orientation, Side};

/// Anything that can resolve a canonical end k-mer to the stored sequence
/// carrying it.
pub trait AnchorLookup {
    type Node: Copy + Eq;

    fn kmer_size(&self) -> usize;

    /// Node whose stored sequence begins or ends with `canonical_kmer` (in
    /// either orientation), together with that stored sequence.
    fn anchor(&self, canonical_kmer: &[u8]) -> Option<(Self::Node, &[u8])>;
}

/// A neighbour found across a (K-1)-overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation<N> {
    pub base: u8,
    pub node: N,
    /// How the neighbour must be read to continue the query, `None` when
    /// the shared k-mer sits at the neighbour's far end
    pub orientation: Option<Orientation>,
}

impl<N> Continuation<N> {
    pub fn is_mergeable(&self) -> bool {
        self.orientation.is_some()
    }
}

/// Canonical left and right end k-mers of `seq`.
pub fn end_anchors(seq: &[u8], k: usize) -> (Vec<u8>, Vec<u8>) {
    debug_assert!(seq.len() >= k);
    let left = alphabet::canonical(&seq[..k]).0.into_owned();
    let right = alphabet::canonical(&seq[seq.len() - k..]).0.into_owned();
    (left, right)
}

/// Continuations of `seq` at `side`, in the fixed base order.
pub fn continuations<G: AnchorLookup>(
    graph: &G,
    seq: &[u8],
    side: Side,
) -> Vec<Continuation<G::Node>> {
    let k = graph.kmer_size();
    let mut found = Vec::with_capacity(BASES.len());
    if k < 2 || seq.len() < k - 1 {
        return found;
    }

    let overlap = match side {
        Side::Right => &seq[seq.len() - (k - 1)..],
        Side::Left => &seq[..k - 1],
    };

    let mut probe = Vec::with_capacity(k);
    for &base in &BASES {
        probe.clear();
        match side {
            Side::Right => {
                probe.extend_from_slice(overlap);
                probe.push(base);
            }
            Side::Left => {
                probe.push(base);
                probe.extend_from_slice(overlap);
            }
        }

        let (canonical, _) = alphabet::canonical(&probe);
        if let Some((node, stored)) = graph.anchor(&canonical) {
            found.push(Continuation {
                base,
                node,
                orientation: orient(stored, &probe, side),
            });
        }
    }

    found
}

/// Orientation in which `stored` continues a query whose boundary k-mer is
/// `probe`.
fn orient(stored: &[u8], probe: &[u8], side: Side) -> Option<Orientation> {
    let reverse = alphabet::reverse_complement(probe);
    match side {
        Side::Right if stored.starts_with(probe) => Some(Orientation::Forward),
        Side::Right if stored.ends_with(&reverse) => Some(Orientation::Reverse),
        Side::Left if stored.ends_with(probe) => Some(Orientation::Forward),
        Side::Left if stored.starts_with(&reverse) => Some(Orientation::Reverse),
        _ => None,
    }
}
