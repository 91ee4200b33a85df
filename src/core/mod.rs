pub mod alphabet;
pub mod data_structures;
pub mod errors;
pub mod overlap;
pub mod read_ids;

pub use data_structures::{
    mate_of, AssemblyStats, ChainAggregate, Contig, Orientation, Read, Side, Unitig,
};
pub use errors::AssemblyError;
pub use overlap::{continuations, end_anchors, AnchorLookup, Continuation};
pub use read_ids::{merge_descending, ReadId, ReadIdList};
