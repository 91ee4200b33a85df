//! Scaffold / branch resolution
//! ============================
//!
//! Links unitigs into contigs. Short dead ends are marked as tips first.
//! Chains are then grown greedily from the best supported unitigs: at every
//! step each candidate continuation at the chain's open end is scored by the
//! number of its reads whose mate already belongs to the chain, normalised
//! by the largest such count seen so far, and the strictly best candidate
//! is absorbed.
//!
//! Every chain is owned by its root unitig, which holds the aggregate
//! sequence and read set. Absorbed unitigs keep a `head` pointer towards the
//! root that absorbed them; following those pointers until they stop moving
//! gives the live root.

use std::collections::BTreeSet;
use tracing::{debug, info, trace};

use crate::core::data_structures::{mate_of, ChainAggregate, Contig, Orientation, Side};
use crate::core::overlap::continuations;
use crate::core::read_ids::ReadIdList;

use super::unitig_set::UnitigSet;

/// Weight applied to a secondary opinion before it is added to the
/// normalised mate-pair score.
pub const ADVICE_DIVISOR: f64 = 5.0;

/// Optional second opinion on whether `candidate` continues `chain`.
pub trait BranchAdvisor {
    fn advise(&self, chain: &[u8], candidate: &[u8]) -> Option<f64>;
}

/// Advisor that never has an opinion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpinion;

impl BranchAdvisor for NoOpinion {
    fn advise(&self, _chain: &[u8], _candidate: &[u8]) -> Option<f64> {
        None
    }
}

/// Number of reads in `candidate` whose mate is in `chain`.
pub fn mate_pair_count(candidate: &ReadIdList, chain: &ReadIdList) -> usize {
    candidate
        .iter()
        .filter(|&id| chain.contains(mate_of(id)))
        .count()
}

/// Live root of the chain `id` belongs to.
pub fn find_root(set: &UnitigSet, mut id: usize) -> usize {
    // bounded: a head pointer only ever moves to a root absorbed later
    for _ in 0..=set.len() {
        match set.get(id) {
            Some(unitig) if unitig.head != id => id = unitig.head,
            _ => break,
        }
    }
    id
}

/// Mark every unitig that has no continuation on at least one end and is
/// shorter than `2K` as a tip. Returns the number of tips.
pub fn mark_tips(set: &mut UnitigSet) -> usize {
    let k = set.kmer_size();
    let tips: Vec<bool> = set
        .iter()
        .map(|unitig| {
            let left = continuations(set, &unitig.sequence, Side::Left).len();
            let right = continuations(set, &unitig.sequence, Side::Right).len();
            (left == 0 || right == 0) && unitig.len() < 2 * k
        })
        .collect();

    let mut count = 0;
    for (id, is_tip) in tips.into_iter().enumerate() {
        if let Some(unitig) = set.get_mut(id) {
            unitig.is_tip = is_tip;
        }
        count += usize::from(is_tip);
    }
    debug!(tips = count, unitigs = set.len(), "marked tips");
    count
}

/// Unitig ids by read support, then length, both descending. Stable, so
/// equal unitigs keep their numbering order.
pub fn processing_order(set: &UnitigSet) -> Vec<usize> {
    let mut order: Vec<usize> = (0..set.len()).collect();
    order.sort_by(|&a, &b| {
        let (ua, ub) = (&set.as_slice()[a], &set.as_slice()[b]);
        ub.reads
            .len()
            .cmp(&ua.reads.len())
            .then_with(|| ub.len().cmp(&ua.len()))
    });
    order
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    unitig: usize,
    orientation: Orientation,
    mate_pairs: usize,
    advice: Option<f64>,
}

/// Greedy chain builder.
#[derive(Debug, Clone)]
pub struct ScaffoldResolver<A = NoOpinion> {
    advisor: A,
    /// Largest mate-pair count seen so far; divisor for all later scores
    max_mate_pairs: usize,
    active_roots: BTreeSet<usize>,
    extensions: usize,
}

impl Default for ScaffoldResolver<NoOpinion> {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaffoldResolver<NoOpinion> {
    pub fn new() -> Self {
        Self::with_advisor(NoOpinion)
    }
}

impl<A: BranchAdvisor> ScaffoldResolver<A> {
    pub fn with_advisor(advisor: A) -> Self {
        Self {
            advisor,
            max_mate_pairs: 0,
            active_roots: BTreeSet::new(),
            extensions: 0,
        }
    }

    pub fn max_mate_pairs(&self) -> usize {
        self.max_mate_pairs
    }

    /// Number of extensions committed by the last [`resolve`](Self::resolve).
    pub fn extensions(&self) -> usize {
        self.extensions
    }

    /// Mark tips, grow chains and return one contig per surviving root.
    pub fn resolve(&mut self, set: &mut UnitigSet) -> Vec<Contig> {
        let tips = mark_tips(set);
        self.active_roots = (0..set.len()).collect();
        self.max_mate_pairs = 0;
        self.extensions = 0;

        for start in processing_order(set) {
            let eligible = set
                .get(start)
                .is_some_and(|u| u.prev.is_none() && !u.is_tip && u.is_root());
            if eligible {
                self.grow_chain(set, start);
            }
        }

        let contigs: Vec<Contig> = self
            .active_roots
            .iter()
            .filter_map(|&root| set.get(root))
            .filter(|unitig| !unitig.is_tip)
            .filter_map(|unitig| unitig.chain.as_ref())
            .enumerate()
            .map(|(id, chain)| Contig::from_chain(id, chain))
            .collect();

        info!(
            "Scaffolded {} unitigs ({} tips) into {} contigs with {} extensions",
            set.len(),
            tips,
            contigs.len(),
            self.extensions
        );
        contigs
    }

    fn grow_chain(&mut self, set: &mut UnitigSet, root: usize) {
        let mut tail = match set.get(root).and_then(|u| u.chain.as_ref()) {
            Some(chain) => chain.members.last().copied().unwrap_or(root),
            None => return,
        };

        while set.get(tail).is_some_and(|u| u.next.is_none()) {
            match self.best_extension(set, root, tail) {
                Some(candidate) => match self.commit(set, root, tail, candidate) {
                    Some(new_tail) => tail = new_tail,
                    None => break,
                },
                None => break,
            }
        }
    }

    fn best_extension(&mut self, set: &UnitigSet, root: usize, tail: usize) -> Option<Candidate> {
        let tail_unitig = set.get(tail)?;
        let chain = set.get(root)?.chain.as_ref()?;
        let oriented_tail = tail_unitig.oriented_sequence();

        let mut candidates = Vec::with_capacity(4);
        for found in continuations(set, &oriented_tail, Side::Right) {
            let Some(orientation) = found.orientation else {
                continue;
            };
            let Some(unitig) = set.get(found.node) else {
                continue;
            };
            if found.node == tail
                || unitig.prev.is_some()
                || unitig.is_tip
                || (orientation == Orientation::Reverse && unitig.next.is_some())
                || find_root(set, found.node) == root
            {
                continue;
            }
            let Some(candidate_chain) = unitig.chain.as_ref() else {
                continue;
            };
            candidates.push(Candidate {
                unitig: found.node,
                orientation,
                mate_pairs: mate_pair_count(&candidate_chain.reads, &chain.reads),
                advice: self
                    .advisor
                    .advise(&chain.sequence, &orientation.apply(&unitig.sequence)),
            });
        }

        if let Some(most) = candidates.iter().map(|c| c.mate_pairs).max() {
            self.max_mate_pairs = self.max_mate_pairs.max(most);
        }

        let mut best: Option<(f64, Candidate)> = None;
        for candidate in candidates {
            let score = self.score(&candidate);
            trace!(
                unitig = candidate.unitig,
                mate_pairs = candidate.mate_pairs,
                score,
                "scored candidate"
            );
            if score > 0.0 && best.map_or(true, |(top, _)| score > top) {
                best = Some((score, candidate));
            }
        }
        best.map(|(_, candidate)| candidate)
    }

    fn score(&self, candidate: &Candidate) -> f64 {
        let normalised = if self.max_mate_pairs == 0 {
            0.0
        } else {
            candidate.mate_pairs as f64 / self.max_mate_pairs as f64
        };
        match candidate.advice {
            Some(value) => normalised + value / ADVICE_DIVISOR,
            None => normalised,
        }
    }

    /// Link `candidate` after `tail` and fold its chain into `root`.
    /// Returns the new open end of the chain.
    fn commit(
        &mut self,
        set: &mut UnitigSet,
        root: usize,
        tail: usize,
        candidate: Candidate,
    ) -> Option<usize> {
        let overlap = set.kmer_size() - 1;
        let absorbed: ChainAggregate = set.get_mut(candidate.unitig)?.chain.take()?;

        if let Some(unitig) = set.get_mut(tail) {
            unitig.next = Some(candidate.unitig);
        }
        if let Some(unitig) = set.get_mut(candidate.unitig) {
            unitig.prev = Some(tail);
            unitig.orientation = candidate.orientation;
            unitig.head = root;
        }

        let new_tail = absorbed.members.last().copied().unwrap_or(candidate.unitig);
        let appended = candidate.orientation.apply(&absorbed.sequence);
        let chain = set.get_mut(root)?.chain.as_mut()?;
        chain
            .sequence
            .extend_from_slice(appended.get(overlap..).unwrap_or_default());
        chain.reads.absorb(&absorbed.reads);
        chain.members.extend_from_slice(&absorbed.members);

        self.active_roots.remove(&candidate.unitig);
        self.extensions += 1;
        debug!(
            root,
            absorbed = candidate.unitig,
            mate_pairs = candidate.mate_pairs,
            "extended chain"
        );
        Some(new_tail)
    }
}
