//! Assembly stages on top of the k-mer index
//!
//! `contraction` compacts unique overlaps into unitigs, `scaffold` links
//! unitigs into contigs, `orchestrator` runs the whole pipeline.

pub mod branch_report;
pub mod contraction;
pub mod orchestrator;
pub mod scaffold;
pub mod unitig_set;

pub use branch_report::{branch_records, BranchNeighbour, BranchRecord};
pub use contraction::{contract, contract_both, contract_pass, ContractionReport, Direction};
pub use orchestrator::{calculate_assembly_stats, AssemblyPipeline, AssemblyResults};
pub use scaffold::{
    find_root, mark_tips, mate_pair_count, processing_order, BranchAdvisor, NoOpinion,
    ScaffoldResolver,
};
pub use unitig_set::UnitigSet;
