//! Assembly pipeline driver
//!
//! Runs the stages in order, each to completion before the next starts:
//! - index construction
//! - abundance pruning
//! - forward then backward contraction
//! - unitig export and tip marking
//! - scaffolding into contigs
//!
//! Also computes summary statistics and renders results to disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::core::data_structures::{AssemblyStats, Contig, Read, Unitig};
use crate::index::{prune, KmerIndex};
use crate::qc::ReadLoader;
use crate::utils::configuration::AssemblerConfig;
use crate::utils::format_writers;

use super::branch_report::{branch_records, BranchRecord};
use super::contraction::{contract, Direction};
use super::scaffold::{BranchAdvisor, NoOpinion, ScaffoldResolver};
use super::unitig_set::UnitigSet;

/// Everything the core produces for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyResults {
    pub unitigs: Vec<Unitig>,
    pub contigs: Vec<Contig>,
    pub stats: AssemblyStats,
    pub branch_report: Vec<BranchRecord>,
}

/// Owns the configuration and the optional branch advisor for a run
pub struct AssemblyPipeline<A = NoOpinion> {
    config: AssemblerConfig,
    advisor: A,
}

impl AssemblyPipeline<NoOpinion> {
    pub fn new(config: AssemblerConfig) -> Result<Self> {
        Self::with_advisor(config, NoOpinion)
    }
}

impl<A: BranchAdvisor + Clone> AssemblyPipeline<A> {
    pub fn with_advisor(config: AssemblerConfig, advisor: A) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, advisor })
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Load, clean and assemble the given read files.
    pub fn run_files(&self, inputs: &[PathBuf]) -> Result<AssemblyResults> {
        let mut loader = ReadLoader::new(self.config.replacement_byte());
        let reads = loader.load_files(inputs)?;
        self.run(&reads)
    }

    /// Assemble already-cleaned reads.
    pub fn run(&self, reads: &[Read]) -> Result<AssemblyResults> {
        let assembly = &self.config.assembly;
        info!(
            "Assembling {} reads with k={} m={} cutoff={}",
            reads.len(),
            assembly.kmer_size,
            assembly.signature_length,
            assembly.abundance_cutoff
        );

        let mut index = KmerIndex::new(assembly.kmer_size, assembly.signature_length)?;
        let mut kmers_seen = 0;
        for read in reads {
            kmers_seen += index
                .insert_read(read)
                .with_context(|| format!("Failed to index read {}", read.id))?;
        }
        info!(
            "Indexed {} k-mers into {} entries across {} signatures",
            kmers_seen,
            index.len(),
            index.bucket_count()
        );

        let pruned = prune(&mut index, assembly.abundance_cutoff);

        let forward = contract(&mut index, Direction::Forward);
        let backward = contract(&mut index, Direction::Backward);

        let mut set = UnitigSet::from_index(&index);
        drop(index);
        let branch_report = if self.config.output.write_branch_report {
            branch_records(&set)
        } else {
            Vec::new()
        };

        let mut resolver = ScaffoldResolver::with_advisor(self.advisor.clone());
        let contigs: Vec<Contig> = resolver
            .resolve(&mut set)
            .into_iter()
            .filter(|contig| contig.length >= assembly.min_contig_length)
            .collect();

        let mut stats = calculate_assembly_stats(&contigs);
        stats.num_reads = reads.len();
        stats.index_entries_before_pruning = pruned.entries_before;
        stats.index_entries_after_pruning = pruned.entries_after();
        stats.merges = forward.merges + backward.merges;
        stats.num_unitigs = set.len();
        stats.num_tips = set.tip_count();

        info!(
            "Assembly complete: {} contigs, total length {}, N50 {}",
            stats.num_contigs, stats.total_length, stats.n50
        );

        Ok(AssemblyResults {
            unitigs: set.into_unitigs(),
            contigs,
            stats,
            branch_report,
        })
    }

    /// Render results into the configured output directory.
    pub fn write_outputs(&self, results: &AssemblyResults) -> Result<()> {
        let output = &self.config.output;
        std::fs::create_dir_all(&output.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output.output_dir.display()
            )
        })?;

        format_writers::write_unitigs_fasta(
            &results.unitigs,
            output.output_dir.join(&output.unitigs_file),
            output.fasta_line_width,
        )?;
        format_writers::write_contigs_fasta(
            &results.contigs,
            output.output_dir.join(&output.contigs_file),
            output.fasta_line_width,
        )?;
        if output.write_branch_report {
            format_writers::write_branch_report(
                &results.branch_report,
                output.output_dir.join(&output.branch_report_file),
            )?;
        }
        format_writers::write_assembly_stats(
            &results.stats,
            output.output_dir.join(&output.stats_file),
        )?;
        Ok(())
    }
}

/// Contig-level statistics; run-level counters are filled in by the caller.
pub fn calculate_assembly_stats(contigs: &[Contig]) -> AssemblyStats {
    AssemblyStats {
        num_contigs: contigs.len(),
        total_length: contigs.iter().map(|c| c.length).sum(),
        largest_contig: contigs.iter().map(|c| c.length).max().unwrap_or(0),
        n50: calculate_nx(contigs, 50),
        n90: calculate_nx(contigs, 90),
        l50: calculate_l50(contigs),
        gc_content: calculate_gc_content(contigs),
        ..AssemblyStats::default()
    }
}

fn sorted_lengths(contigs: &[Contig]) -> Vec<usize> {
    let mut lengths: Vec<usize> = contigs.iter().map(|c| c.length).collect();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    lengths
}

/// Length of the contig at which the cumulative length reaches `percent`%
/// of the total.
pub fn calculate_nx(contigs: &[Contig], percent: usize) -> usize {
    let lengths = sorted_lengths(contigs);
    let total: usize = lengths.iter().sum();
    let target = (total * percent).div_ceil(100);

    let mut cumulative = 0;
    for length in lengths {
        cumulative += length;
        if cumulative >= target {
            return length;
        }
    }
    0
}

/// Number of contigs needed to cover half the total length.
pub fn calculate_l50(contigs: &[Contig]) -> usize {
    let lengths = sorted_lengths(contigs);
    let total: usize = lengths.iter().sum();
    let target = total.div_ceil(2);

    let mut cumulative = 0;
    for (idx, length) in lengths.into_iter().enumerate() {
        cumulative += length;
        if cumulative >= target {
            return idx + 1;
        }
    }
    0
}

/// GC percentage over all contig bases.
pub fn calculate_gc_content(contigs: &[Contig]) -> f64 {
    let total: usize = contigs.iter().map(|c| c.length).sum();
    if total == 0 {
        return 0.0;
    }
    let gc: usize = contigs
        .iter()
        .map(|c| {
            c.sequence
                .bytes()
                .filter(|b| matches!(b, b'G' | b'C'))
                .count()
        })
        .sum();
    gc as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contig(id: usize, sequence: &str) -> Contig {
        Contig {
            id,
            sequence: sequence.to_string(),
            length: sequence.len(),
            read_support: 1,
            node_path: vec![id],
        }
    }

    #[test]
    fn test_nx_and_l50() {
        let contigs = vec![
            contig(0, &"A".repeat(100)),
            contig(1, &"A".repeat(50)),
            contig(2, &"A".repeat(30)),
            contig(3, &"A".repeat(20)),
        ];
        // total 200: 100 reaches half, 100+50+30 reaches 180
        assert_eq!(calculate_nx(&contigs, 50), 100);
        assert_eq!(calculate_nx(&contigs, 90), 30);
        assert_eq!(calculate_l50(&contigs), 1);
    }

    #[test]
    fn test_stats_on_empty_input() {
        let stats = calculate_assembly_stats(&[]);
        assert_eq!(stats.num_contigs, 0);
        assert_eq!(stats.n50, 0);
        assert_eq!(stats.l50, 0);
        assert_eq!(stats.gc_content, 0.0);
    }

    #[test]
    fn test_gc_content() {
        let contigs = vec![contig(0, "GGCC"), contig(1, "AATT")];
        assert!((calculate_gc_content(&contigs) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_pipeline_on_two_overlapping_reads() {
        let mut config = AssemblerConfig::default();
        config.assembly.kmer_size = 5;
        config.assembly.signature_length = 2;
        config.assembly.abundance_cutoff = 1;

        let reads = vec![
            Read::new(0, b"AAATCCG".to_vec()),
            Read::new(1, b"AAATCCG".to_vec()),
            Read::new(2, b"ATCCGTT".to_vec()),
            Read::new(3, b"ATCCGTT".to_vec()),
        ];
        let results = AssemblyPipeline::new(config).unwrap().run(&reads).unwrap();
        assert_eq!(results.unitigs.len(), 1);
        assert_eq!(results.unitigs[0].sequence, b"AAATCCGTT");
        // a dead end shorter than 2K is a tip and yields no contig
        assert_eq!(results.stats.num_tips, 1);
        assert!(results.contigs.is_empty());
        assert_eq!(results.stats.num_reads, 4);
        assert_eq!(results.stats.index_entries_before_pruning, 5);
        assert_eq!(results.stats.merges, 4);
    }
}
