use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::core::data_structures::Unitig;
use crate::core::overlap::{end_anchors, AnchorLookup};
use crate::core::read_ids::ReadIdList;
use crate::index::KmerIndex;

/// Contracted entries, numbered in a fixed order and indexed by their end
/// anchors for overlap queries.
#[derive(Debug, Clone)]
pub struct UnitigSet {
    k: usize,
    unitigs: Vec<Unitig>,
    anchors: AHashMap<Vec<u8>, usize>,
}

impl UnitigSet {
    /// Collect the entries of a contracted index: ascending signature, then
    /// slot order inside a bucket, each entry once.
    pub fn from_index(index: &KmerIndex) -> Self {
        let mut seen = AHashSet::with_capacity(index.len());
        let mut sequences = Vec::with_capacity(index.len());
        for signature in index.signatures_ascending() {
            for id in index.bucket_entries(signature) {
                if !seen.insert(id) {
                    continue;
                }
                if let Some(entry) = index.entry(id) {
                    sequences.push((entry.key().to_vec(), entry.reads().clone()));
                }
            }
        }
        debug!(unitigs = sequences.len(), "collected unitigs from index");
        Self::from_sequences(index.kmer_size(), sequences)
    }

    /// Unitigs from explicit sequences, numbered in the order given.
    /// Sequences shorter than `k` are kept but cannot overlap anything.
    pub fn from_sequences(k: usize, sequences: Vec<(Vec<u8>, ReadIdList)>) -> Self {
        let mut anchors = AHashMap::with_capacity(sequences.len() * 2);
        let unitigs: Vec<Unitig> = sequences
            .into_iter()
            .enumerate()
            .map(|(id, (sequence, reads))| {
                if sequence.len() >= k {
                    let (left, right) = end_anchors(&sequence, k);
                    anchors.insert(left, id);
                    anchors.insert(right, id);
                }
                Unitig::new(id, sequence, reads)
            })
            .collect();
        Self {
            k,
            unitigs,
            anchors,
        }
    }

    pub fn kmer_size(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.unitigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unitigs.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Unitig> {
        self.unitigs.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Unitig> {
        self.unitigs.get_mut(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Unitig> {
        self.unitigs.iter()
    }

    pub fn as_slice(&self) -> &[Unitig] {
        &self.unitigs
    }

    pub fn into_unitigs(self) -> Vec<Unitig> {
        self.unitigs
    }

    pub fn tip_count(&self) -> usize {
        self.unitigs.iter().filter(|u| u.is_tip).count()
    }
}

impl AnchorLookup for UnitigSet {
    type Node = usize;

    fn kmer_size(&self) -> usize {
        self.k
    }

    fn anchor(&self, canonical_kmer: &[u8]) -> Option<(usize, &[u8])> {
        let &id = self.anchors.get(canonical_kmer)?;
        self.unitigs.get(id).map(|u| (id, u.sequence.as_slice()))
    }
}
