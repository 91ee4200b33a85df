//! # dbg-forge
//!
//! Assembly core of a de novo short-read assembler. Reads are indexed as
//! canonical k-mers in a two-level, minimizer-bucketed hash index; rare
//! k-mers are pruned; chains of unique overlaps are contracted into
//! unitigs; unitigs are linked into contigs using mate-pair support.

pub mod assembly;
pub mod cli;
pub mod core;
pub mod index;
pub mod qc;
pub mod utils;

// Re-export commonly used types at crate level
pub use crate::assembly::{AssemblyPipeline, AssemblyResults, ScaffoldResolver, UnitigSet};
pub use crate::core::data_structures::*;
pub use crate::core::errors::AssemblyError;
pub use crate::index::KmerIndex;
pub use crate::utils::configuration::AssemblerConfig;

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;

/// Error type used throughout the crate
pub type Error = anyhow::Error;
