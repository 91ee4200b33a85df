//! Input handling
//!
//! Loads sequencing reads from FASTQ/FASTA and cleans them for indexing.

pub mod file_reader;

pub use file_reader::{LoadStats, ReadLoader, SequenceFormat};
