use serde::{Deserialize, Serialize};

use crate::core::alphabet::BASES;
use crate::core::data_structures::Side;
use crate::core::overlap::continuations;
use crate::core::read_ids::ReadId;

use super::unitig_set::UnitigSet;

/// Neighbour reached from a branching unitig through one base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchNeighbour {
    pub unitig: usize,
    pub sequence: String,
    pub reads: Vec<ReadId>,
}

/// A unitig with more than one continuation at either end. Neighbour slots
/// follow the base order `A, C, G, T`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub unitig: usize,
    pub sequence: String,
    pub reads: Vec<ReadId>,
    pub right: [Option<BranchNeighbour>; 4],
    pub left: [Option<BranchNeighbour>; 4],
}

impl BranchRecord {
    pub fn right_degree(&self) -> usize {
        self.right.iter().flatten().count()
    }

    pub fn left_degree(&self) -> usize {
        self.left.iter().flatten().count()
    }
}

/// Every branching unitig of `set`, in unitig order.
pub fn branch_records(set: &UnitigSet) -> Vec<BranchRecord> {
    set.iter()
        .filter_map(|unitig| {
            let right = neighbours(set, unitig.id, &unitig.sequence, Side::Right);
            let left = neighbours(set, unitig.id, &unitig.sequence, Side::Left);
            let degree = |slots: &[Option<BranchNeighbour>; 4]| slots.iter().flatten().count();
            if degree(&right) <= 1 && degree(&left) <= 1 {
                return None;
            }
            Some(BranchRecord {
                unitig: unitig.id,
                sequence: unitig.sequence_str(),
                reads: unitig.reads.to_vec(),
                right,
                left,
            })
        })
        .collect()
}

fn neighbours(
    set: &UnitigSet,
    own: usize,
    sequence: &[u8],
    side: Side,
) -> [Option<BranchNeighbour>; 4] {
    let mut slots: [Option<BranchNeighbour>; 4] = Default::default();
    for found in continuations(set, sequence, side) {
        if found.node == own {
            continue;
        }
        let Some(slot) = BASES.iter().position(|&b| b == found.base) else {
            continue;
        };
        if let Some(neighbour) = set.get(found.node) {
            slots[slot] = Some(BranchNeighbour {
                unitig: neighbour.id,
                sequence: neighbour.sequence_str(),
                reads: neighbour.reads.to_vec(),
            });
        }
    }
    slots
}
