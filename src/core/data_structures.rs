use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::core::alphabet;
use crate::core::read_ids::{ReadId, ReadIdList};

/// Core data structures shared by the index, contraction and scaffolding
/// stages

/// A cleaned input read with its sequential id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Read {
    pub id: ReadId,
    pub sequence: Vec<u8>,
}

impl Read {
    pub fn new(id: ReadId, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            sequence: sequence.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn mate_id(&self) -> ReadId {
        mate_of(self.id)
    }
}

/// Mate of a read: consecutive even/odd ids form a pair.
#[inline(always)]
pub fn mate_of(id: ReadId) -> ReadId {
    id ^ 1
}

/// Orientation of a stored sequence relative to how it is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Orientation {
    #[default]
    Forward,
    Reverse,
}

impl Orientation {
    pub fn flip(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }

    /// View `seq` in this orientation.
    pub fn apply(self, seq: &[u8]) -> Cow<'_, [u8]> {
        match self {
            Orientation::Forward => Cow::Borrowed(seq),
            Orientation::Reverse => Cow::Owned(alphabet::reverse_complement(seq)),
        }
    }
}

/// End of a sequence at which an overlap is sought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 3' end: continuations start with the last K-1 symbols
    Right,
    /// 5' end: continuations end with the first K-1 symbols
    Left,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Right => Side::Left,
            Side::Left => Side::Right,
        }
    }
}

/// Aggregate sequence and read support of an assembled chain, held by the
/// chain's current root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAggregate {
    pub sequence: Vec<u8>,
    pub reads: ReadIdList,
    /// Unitig ids in chain order, root first
    pub members: Vec<usize>,
}

/// Maximal chain of uniquely overlapping k-mers, plus its scaffolding state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unitig {
    pub id: usize,
    pub sequence: Vec<u8>,
    pub reads: ReadIdList,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    /// Chain this unitig was last attached to; follow until a fixed point
    /// to find the live root
    pub head: usize,
    /// Orientation in which the unitig is read inside its chain
    pub orientation: Orientation,
    pub is_tip: bool,
    /// Present while this unitig is an active chain root
    pub chain: Option<ChainAggregate>,
}

impl Unitig {
    pub fn new(id: usize, sequence: Vec<u8>, reads: ReadIdList) -> Self {
        let chain = ChainAggregate {
            sequence: sequence.clone(),
            reads: reads.clone(),
            members: vec![id],
        };
        Self {
            id,
            sequence,
            reads,
            prev: None,
            next: None,
            head: id,
            orientation: Orientation::Forward,
            is_tip: false,
            chain: Some(chain),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.chain.is_some()
    }

    /// Sequence as read inside its chain.
    pub fn oriented_sequence(&self) -> Cow<'_, [u8]> {
        self.orientation.apply(&self.sequence)
    }

    pub fn sequence_str(&self) -> String {
        self.sequence.iter().map(|&b| b as char).collect()
    }
}

/// Final assembled sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contig {
    pub id: usize,
    pub sequence: String,
    pub length: usize,
    /// Number of distinct reads supporting the chain
    pub read_support: usize,
    /// Unitig ids in chain order
    pub node_path: Vec<usize>,
}

impl Contig {
    pub fn from_chain(id: usize, chain: &ChainAggregate) -> Self {
        let sequence: String = chain.sequence.iter().map(|&b| b as char).collect();
        Self {
            id,
            length: sequence.len(),
            sequence,
            read_support: chain.reads.len(),
            node_path: chain.members.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyStats {
    pub num_reads: usize,
    pub index_entries_before_pruning: usize,
    pub index_entries_after_pruning: usize,
    pub merges: usize,
    pub num_unitigs: usize,
    pub num_tips: usize,
    pub num_contigs: usize,
    pub total_length: usize,
    pub largest_contig: usize,
    pub n50: usize,
    pub n90: usize,
    pub l50: usize,
    pub gc_content: f64,
}
