//! Read loading
//!
//! Reads FASTQ or FASTA files into [`Read`]s with sequential ids and applies
//! the cleaning policy: symbols are upper-cased and anything outside `ACGT`
//! is replaced by a fixed base before the read reaches the index.
//!
//! Ids run across all files in input order. Empty records still consume an
//! id so the even/odd mate pairing of the input is preserved.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::alphabet;
use crate::core::data_structures::Read;
use crate::core::errors::AssemblyError;
use crate::core::read_ids::ReadId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Fastq,
    Fasta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub files: usize,
    pub records: usize,
    pub empty_records: usize,
    pub total_bases: usize,
    pub replaced_bases: usize,
}

#[derive(Debug, Clone)]
pub struct ReadLoader {
    replacement: u8,
    next_id: ReadId,
    stats: LoadStats,
}

impl Default for ReadLoader {
    fn default() -> Self {
        Self::new(b'C')
    }
}

impl ReadLoader {
    pub fn new(replacement: u8) -> Self {
        Self {
            replacement,
            next_id: 0,
            stats: LoadStats::default(),
        }
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// Format of `path`, judged by its first non-blank byte.
    pub fn detect_format(path: &Path) -> Result<Option<SequenceFormat>> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut reader = BufReader::new(file);
        loop {
            let buffer = reader
                .fill_buf()
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if buffer.is_empty() {
                return Ok(None);
            }
            let consumed = buffer.len();
            if let Some(&first) = buffer.iter().find(|b| !b.is_ascii_whitespace()) {
                return match first {
                    b'@' => Ok(Some(SequenceFormat::Fastq)),
                    b'>' => Ok(Some(SequenceFormat::Fasta)),
                    other => Err(AssemblyError::MalformedRecord {
                        path: path.to_path_buf(),
                        record: 0,
                        message: format!(
                            "expected '@' or '>' at start of file, found {:?}",
                            other as char
                        ),
                    }
                    .into()),
                };
            }
            reader.consume(consumed);
        }
    }

    /// Load every file in order.
    pub fn load_files(&mut self, paths: &[PathBuf]) -> Result<Vec<Read>> {
        let mut reads = Vec::new();
        for (file_idx, path) in paths.iter().enumerate() {
            info!(
                "Loading input file {}/{}: {}",
                file_idx + 1,
                paths.len(),
                path.display()
            );
            reads.extend(self.load_file(path)?);
        }
        info!(
            "{} {} reads ({} bases, {} replaced)",
            "Loaded".bright_green(),
            self.stats.records,
            self.stats.total_bases,
            self.stats.replaced_bases
        );
        Ok(reads)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<Vec<Read>> {
        self.stats.files += 1;
        match Self::detect_format(path)? {
            Some(SequenceFormat::Fastq) => self.load_fastq(path),
            Some(SequenceFormat::Fasta) => self.load_fasta(path),
            None => {
                warn!("{} is empty", path.display());
                Ok(Vec::new())
            }
        }
    }

    fn load_fastq(&mut self, path: &Path) -> Result<Vec<Read>> {
        use bio::io::fastq;

        debug!("{}", "Reading FASTQ file".bright_cyan());
        let reader = fastq::Reader::from_file(path).context("Failed to open FASTQ file")?;
        let mut reads = Vec::new();
        for (record_idx, record_result) in reader.records().enumerate() {
            let record = record_result.map_err(|e| AssemblyError::MalformedRecord {
                path: path.to_path_buf(),
                record: record_idx,
                message: e.to_string(),
            })?;
            reads.push(self.accept(record.seq()));
        }
        Ok(reads)
    }

    fn load_fasta(&mut self, path: &Path) -> Result<Vec<Read>> {
        use bio::io::fasta;

        debug!("{}", "Reading FASTA file".bright_cyan());
        let reader = fasta::Reader::from_file(path).context("Failed to open FASTA file")?;
        let mut reads = Vec::new();
        for (record_idx, record_result) in reader.records().enumerate() {
            let record = record_result.map_err(|e| AssemblyError::MalformedRecord {
                path: path.to_path_buf(),
                record: record_idx,
                message: e.to_string(),
            })?;
            reads.push(self.accept(record.seq()));
        }
        Ok(reads)
    }

    /// Clean in-memory sequences and number them like file records.
    pub fn from_sequences<I, S>(&mut self, sequences: I) -> Vec<Read>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        sequences
            .into_iter()
            .map(|seq| self.accept(seq.as_ref()))
            .collect()
    }

    fn accept(&mut self, raw: &[u8]) -> Read {
        let mut sequence = raw.to_vec();
        let replaced = alphabet::clean_in_place(&mut sequence, self.replacement);

        let id = self.next_id;
        self.next_id += 1;
        self.stats.records += 1;
        self.stats.total_bases += sequence.len();
        self.stats.replaced_bases += replaced;
        if sequence.is_empty() {
            self.stats.empty_records += 1;
        }
        if self.stats.records % 100_000 == 0 {
            debug!(records = self.stats.records, "loading reads");
        }

        Read::new(id, sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_ids_continue_across_files() {
        let dir = tempdir().unwrap();
        let fastq = dir.path().join("reads.fq");
        let fasta = dir.path().join("more.fa");
        std::fs::write(&fastq, "@r0\nACGT\n+\nIIII\n@r1\nacgn\n+\nIIII\n").unwrap();
        let mut handle = File::create(&fasta).unwrap();
        writeln!(handle, ">r2\nGGTTA").unwrap();

        let mut loader = ReadLoader::default();
        let reads = loader.load_files(&[fastq, fasta]).unwrap();
        assert_eq!(reads.len(), 3);
        assert_eq!(reads[0].id, 0);
        assert_eq!(reads[1].sequence, b"ACGC");
        assert_eq!(reads[2].id, 2);
        assert_eq!(reads[2].sequence, b"GGTTA");
        assert_eq!(loader.stats().replaced_bases, 1);
        assert_eq!(loader.stats().files, 2);
    }

    #[test]
    fn test_detect_format_rejects_unknown() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reads.txt");
        std::fs::write(&path, "\n\nACGT\n").unwrap();
        assert!(ReadLoader::detect_format(&path).is_err());

        let empty = dir.path().join("empty.fa");
        std::fs::write(&empty, "").unwrap();
        assert_eq!(ReadLoader::detect_format(&empty).unwrap(), None);
    }

    #[test]
    fn test_from_sequences_cleans_and_numbers() {
        let mut loader = ReadLoader::new(b'A');
        let reads = loader.from_sequences(["acgt", "", "NNA"]);
        assert_eq!(reads[0].sequence, b"ACGT");
        assert!(reads[1].is_empty());
        assert_eq!(reads[2].sequence, b"AAA");
        assert_eq!(reads[2].id, 2);
        assert_eq!(loader.stats().empty_records, 1);
    }
}
