//! Two-level k-mer index
//! =====================
//!
//! `signature -> k-mer -> supporting read ids`. Entries live in an arena and
//! each bucket maps a canonical k-mer to the id of the entry carrying it.
//!
//! An entry starts as a single canonical k-mer. Contraction replaces entries
//! by longer merged sequences, which are registered under the canonical
//! forms of both their end k-mers (their anchors), each in the bucket of its
//! own signature. Any stored sequence can therefore be found from either end
//! with one bucket probe.

use tracing::debug;

use crate::core::alphabet;
use crate::core::data_structures::Read;
use crate::core::errors::AssemblyError;
use crate::core::overlap::{end_anchors, AnchorLookup};
use crate::core::read_ids::{ReadId, ReadIdList};

use super::arena::{Arena, Handle};
use super::hash_level::{HashLevel, LevelCursor};
use super::signature::{canonical_signature, KmerScanner, ScannedKmer, Signature};

/// Stable id of an index entry.
pub type EntryId = Handle;

type KmerLevel = HashLevel<Box<[u8]>, EntryId>;

/// Registration of an entry under one of its end k-mers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub signature: Signature,
    pub kmer: Box<[u8]>,
}

#[derive(Debug, Clone)]
pub struct KmerEntry {
    key: Box<[u8]>,
    reads: ReadIdList,
    anchors: Vec<Anchor>,
}

impl KmerEntry {
    /// Stored (canonical) sequence; K symbols until contraction merges it.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn reads(&self) -> &ReadIdList {
        &self.reads
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// True when this entry is reached from `bucket` through `kmer` and that
    /// is its first registration there, so bucket walks see it only once.
    fn is_primary_in(&self, bucket: Signature, kmer: &[u8]) -> bool {
        self.anchors
            .iter()
            .find(|anchor| anchor.signature == bucket)
            .is_some_and(|anchor| &*anchor.kmer == kmer)
    }
}

#[derive(Debug, Clone)]
pub struct KmerIndex {
    k: usize,
    m: usize,
    entries: Arena<KmerEntry>,
    buckets: HashLevel<Signature, KmerLevel>,
}

impl KmerIndex {
    /// Empty index for k-mers of length `k` bucketed by `m`-symbol
    /// signatures.
    pub fn new(k: usize, m: usize) -> Result<Self, AssemblyError> {
        if k < 2 {
            return Err(AssemblyError::validation("kmer_size", "must be at least 2"));
        }
        if m == 0 || m >= k {
            return Err(AssemblyError::validation(
                "signature_length",
                format!("must be in 1..{k}, got {m}"),
            ));
        }
        if m > alphabet::MAX_SCORED_LENGTH {
            return Err(AssemblyError::validation(
                "signature_length",
                format!("must not exceed {}", alphabet::MAX_SCORED_LENGTH),
            ));
        }
        Ok(Self {
            k,
            m,
            entries: Arena::new(),
            buckets: HashLevel::new(),
        })
    }

    pub fn kmer_size(&self) -> usize {
        self.k
    }

    pub fn signature_length(&self) -> usize {
        self.m
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of registrations in the bucket for `signature` (0 if absent).
    pub fn bucket_len(&self, signature: Signature) -> usize {
        self.buckets.get(&signature).map_or(0, HashLevel::len)
    }

    pub fn contains_bucket(&self, signature: Signature) -> bool {
        self.buckets.contains_key(&signature)
    }

    /// Signatures present, in ascending order.
    pub fn signatures_ascending(&self) -> Vec<Signature> {
        let mut signatures: Vec<Signature> = self.buckets.iter().map(|(_, &sig, _)| sig).collect();
        signatures.sort_unstable();
        signatures
    }

    pub fn entry(&self, id: EntryId) -> Option<&KmerEntry> {
        self.entries.get(id)
    }

    /// Entries in arena order.
    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &KmerEntry)> + '_ {
        self.entries.iter()
    }

    /// Record that `read_id` contains `kmer` (either orientation).
    pub fn insert(&mut self, kmer: &[u8], read_id: ReadId) -> Result<EntryId, AssemblyError> {
        if kmer.len() != self.k {
            return Err(AssemblyError::KmerLength {
                expected: self.k,
                actual: kmer.len(),
            });
        }
        AssemblyError::check_symbols(kmer)?;

        let (canonical, forward) = alphabet::canonical(kmer);
        let signature = canonical_signature(&canonical, self.m);
        Ok(self.insert_canonical(
            ScannedKmer {
                position: 0,
                kmer: canonical.into_owned(),
                forward,
                signature,
            },
            read_id,
        ))
    }

    /// Index every k-mer of `read`. Reads shorter than K contribute nothing.
    /// Returns the number of k-mers seen.
    pub fn insert_read(&mut self, read: &Read) -> Result<usize, AssemblyError> {
        if read.len() < self.k {
            return Ok(0);
        }
        AssemblyError::check_symbols(&read.sequence)?;

        let mut seen = 0;
        for scanned in KmerScanner::new(&read.sequence, self.k, self.m) {
            self.insert_canonical(scanned, read.id);
            seen += 1;
        }
        Ok(seen)
    }

    fn insert_canonical(&mut self, scanned: ScannedKmer, read_id: ReadId) -> EntryId {
        let bucket = self
            .buckets
            .get_or_insert_with(scanned.signature, HashLevel::new);

        let existing = self
            .buckets
            .value(bucket)
            .and_then(|level| level.get(&scanned.kmer[..]).copied());
        if let Some(id) = existing {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.reads.insert(read_id);
                return id;
            }
        }

        let key: Box<[u8]> = scanned.kmer.into_boxed_slice();
        let id = self.entries.insert(KmerEntry {
            key: key.clone(),
            reads: ReadIdList::singleton(read_id),
            anchors: vec![Anchor {
                signature: scanned.signature,
                kmer: key.clone(),
            }],
        });
        if let Some(level) = self.buckets.value_mut(bucket) {
            level.insert(key, id);
        }
        id
    }

    /// Add a stored sequence of length at least K with its read support,
    /// registering it under both end anchors. `key` is stored as given.
    pub fn insert_entry(&mut self, key: Vec<u8>, reads: ReadIdList) -> EntryId {
        debug_assert!(key.len() >= self.k);
        let (left, right) = end_anchors(&key, self.k);
        let mut anchors = vec![Anchor {
            signature: canonical_signature(&left, self.m),
            kmer: left.into_boxed_slice(),
        }];
        if right[..] != *anchors[0].kmer {
            anchors.push(Anchor {
                signature: canonical_signature(&right, self.m),
                kmer: right.into_boxed_slice(),
            });
        }

        let id = self.entries.insert(KmerEntry {
            key: key.into_boxed_slice(),
            reads,
            anchors: anchors.clone(),
        });
        for anchor in anchors {
            let bucket = self.buckets.get_or_insert_with(anchor.signature, HashLevel::new);
            if let Some(level) = self.buckets.value_mut(bucket) {
                if let Some(displaced) = level.insert(anchor.kmer, id) {
                    debug!(?displaced, ?id, "anchor re-registered to a newer entry");
                }
            }
        }
        id
    }

    /// Unregister and free an entry. Buckets left empty are kept; callers
    /// that walk buckets remove them explicitly.
    pub fn remove_entry(&mut self, id: EntryId) -> Option<KmerEntry> {
        let entry = self.entries.remove(id)?;
        for anchor in &entry.anchors {
            if let Some(level) = self.buckets.get_mut(&anchor.signature) {
                if level.get(&anchor.kmer[..]) == Some(&id) {
                    level.remove(&anchor.kmer[..]);
                }
            }
        }
        Some(entry)
    }

    /// Drop the bucket for `signature` if it holds nothing.
    pub fn remove_bucket_if_empty(&mut self, signature: Signature) -> bool {
        if self.bucket_len(signature) == 0 && self.buckets.contains_key(&signature) {
            self.buckets.remove(&signature);
            return true;
        }
        false
    }

    /// Drop every empty bucket. Returns how many were dropped.
    pub fn remove_empty_buckets(&mut self) -> usize {
        let empty: Vec<Signature> = self
            .buckets
            .iter()
            .filter(|(_, _, level)| level.is_empty())
            .map(|(_, &signature, _)| signature)
            .collect();
        for signature in &empty {
            self.buckets.remove(signature);
        }
        empty.len()
    }

    /// Entries whose first registration in `signature` is in that bucket,
    /// in slot order.
    pub fn bucket_entries(&self, signature: Signature) -> Vec<EntryId> {
        let Some(level) = self.buckets.get(&signature) else {
            return Vec::new();
        };
        level
            .iter()
            .filter(|(_, kmer, &id)| {
                self.entries
                    .get(id)
                    .is_some_and(|entry| entry.is_primary_in(signature, kmer))
            })
            .map(|(_, _, &id)| id)
            .collect()
    }

    /// Read ids for `kmer` in the bucket `signature`, where `kmer` is an
    /// entry's canonical end k-mer.
    pub fn lookup(&self, signature: Signature, kmer: &[u8]) -> Option<&ReadIdList> {
        let id = *self.buckets.get(&signature)?.get(kmer)?;
        self.entries.get(id).map(|entry| &entry.reads)
    }

    /// Read ids for `kmer` in either orientation.
    pub fn get(&self, kmer: &[u8]) -> Option<&ReadIdList> {
        if kmer.len() < self.m {
            return None;
        }
        let (canonical, _) = alphabet::canonical(kmer);
        self.lookup(canonical_signature(&canonical, self.m), &canonical)
    }

    /// Id of the entry anchored at `canonical_kmer`.
    pub fn find_anchor(&self, canonical_kmer: &[u8]) -> Option<EntryId> {
        if canonical_kmer.len() != self.k {
            return None;
        }
        let signature = canonical_signature(canonical_kmer, self.m);
        self.buckets.get(&signature)?.get(canonical_kmer).copied()
    }

    pub fn signature_cursor(&self) -> SignatureCursor {
        SignatureCursor {
            inner: LevelCursor::new(),
        }
    }

    pub fn kmer_cursor(&self, signature: Signature) -> KmerCursor {
        KmerCursor {
            signature,
            inner: LevelCursor::new(),
            current: None,
            pending: None,
        }
    }
}

impl AnchorLookup for KmerIndex {
    type Node = EntryId;

    fn kmer_size(&self) -> usize {
        self.k
    }

    fn anchor(&self, canonical_kmer: &[u8]) -> Option<(EntryId, &[u8])> {
        let id = self.find_anchor(canonical_kmer)?;
        self.entries.get(id).map(|entry| (id, entry.key()))
    }
}

/// Walk over the signature level. Removing a signature removes every entry
/// still registered in its bucket.
#[derive(Debug, Clone)]
pub struct SignatureCursor {
    inner: LevelCursor,
}

impl SignatureCursor {
    pub fn advance(&mut self, index: &mut KmerIndex) -> Option<Signature> {
        if let Some(handle) = self.inner.take_pending() {
            if let Some((_, level)) = index.buckets.remove_handle(handle) {
                for (_, _, &id) in level.iter() {
                    index.remove_entry(id);
                }
            }
        }
        let handle = self.inner.step(&index.buckets)?;
        index.buckets.key(handle).copied()
    }

    pub fn remove_current(&mut self) -> bool {
        self.inner.remove_current()
    }
}

/// Walk over the entries of one signature bucket, each entry yielded once.
/// Removing the current entry unregisters it from every bucket on the next
/// advance.
#[derive(Debug, Clone)]
pub struct KmerCursor {
    signature: Signature,
    inner: LevelCursor,
    current: Option<EntryId>,
    pending: Option<EntryId>,
}

impl KmerCursor {
    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn current(&self) -> Option<EntryId> {
        self.current
    }

    pub fn advance(&mut self, index: &mut KmerIndex) -> Option<EntryId> {
        if let Some(id) = self.pending.take() {
            index.remove_entry(id);
        }
        self.current = None;

        let KmerIndex {
            entries, buckets, ..
        } = index;
        let level = buckets.get(&self.signature)?;
        while let Some(handle) = self.inner.step(level) {
            let Some((kmer, &id)) = level.entry_at(handle) else {
                continue;
            };
            if entries
                .get(id)
                .is_some_and(|entry| entry.is_primary_in(self.signature, kmer))
            {
                self.current = Some(id);
                return Some(id);
            }
        }
        None
    }

    pub fn remove_current(&mut self) -> bool {
        match self.current.take() {
            Some(id) => {
                self.pending = Some(id);
                true
            }
            None => false,
        }
    }
}
