//! Abundance pruning
//!
//! K-mers seen in only a handful of reads are most likely sequencing
//! errors. Pruning drops every entry whose supporting read list is not
//! longer than the cutoff, then drops the signature buckets left empty.

use tracing::{debug, info};

use super::kmer_index::KmerIndex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub entries_before: usize,
    pub entries_removed: usize,
    pub buckets_removed: usize,
}

impl PruneReport {
    pub fn entries_after(&self) -> usize {
        self.entries_before - self.entries_removed
    }
}

/// Remove every entry supported by `cutoff` reads or fewer.
pub fn prune(index: &mut KmerIndex, cutoff: usize) -> PruneReport {
    let mut report = PruneReport {
        entries_before: index.len(),
        ..PruneReport::default()
    };

    let mut signatures = index.signature_cursor();
    while let Some(signature) = signatures.advance(index) {
        let mut kmers = index.kmer_cursor(signature);
        while let Some(id) = kmers.advance(index) {
            let weak = index
                .entry(id)
                .is_some_and(|entry| entry.reads().len() <= cutoff);
            if weak && kmers.remove_current() {
                report.entries_removed += 1;
            }
        }

        if index.bucket_len(signature) == 0 && signatures.remove_current() {
            report.buckets_removed += 1;
        }
    }

    debug!(
        buckets_removed = report.buckets_removed,
        buckets_left = index.bucket_count(),
        "pruned signature buckets"
    );
    info!(
        "Pruned {} of {} k-mers supported by at most {} reads",
        report.entries_removed, report.entries_before, cutoff
    );
    report
}
