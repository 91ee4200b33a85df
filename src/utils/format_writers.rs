/// FASTA, CSV and JSON writers for assembly results
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::assembly::branch_report::{BranchNeighbour, BranchRecord};
use crate::core::data_structures::{AssemblyStats, Contig, Unitig};
use crate::core::read_ids::ReadId;

/// Marker for an absent neighbour in the branch report
pub const ABSENT: &str = "$";

/// Separator between read ids inside one CSV field
pub const READ_ID_SEPARATOR: &str = "#";

fn write_wrapped<W: Write>(writer: &mut W, sequence: &[u8], line_width: usize) -> Result<()> {
    for chunk in sequence.chunks(line_width.max(1)) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Write contracted unitigs to FASTA
pub fn write_unitigs_fasta<P: AsRef<Path>>(
    unitigs: &[Unitig],
    output_path: P,
    line_width: usize,
) -> Result<()> {
    let path = output_path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create FASTA file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for unitig in unitigs {
        writeln!(
            writer,
            ">unitig_{} length={} reads={}",
            unitig.id,
            unitig.len(),
            unitig.reads.len()
        )?;
        write_wrapped(&mut writer, &unitig.sequence, line_width)?;
    }

    writer.flush()?;
    info!("Wrote {} unitigs to FASTA: {}", unitigs.len(), path.display());
    Ok(())
}

/// Write final contigs to FASTA
pub fn write_contigs_fasta<P: AsRef<Path>>(
    contigs: &[Contig],
    output_path: P,
    line_width: usize,
) -> Result<()> {
    let path = output_path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create FASTA file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for contig in contigs {
        writeln!(
            writer,
            ">contig_{} length={} reads={} unitigs={}",
            contig.id,
            contig.length,
            contig.read_support,
            contig.node_path.len()
        )?;
        write_wrapped(&mut writer, contig.sequence.as_bytes(), line_width)?;
    }

    writer.flush()?;
    info!("Wrote {} contigs to FASTA: {}", contigs.len(), path.display());
    Ok(())
}

fn join_reads(reads: &[ReadId]) -> String {
    reads
        .iter()
        .map(ReadId::to_string)
        .collect::<Vec<_>>()
        .join(READ_ID_SEPARATOR)
}

fn neighbour_fields(slot: &Option<BranchNeighbour>) -> (String, String) {
    match slot {
        Some(neighbour) => (neighbour.sequence.clone(), join_reads(&neighbour.reads)),
        None => (ABSENT.to_string(), ABSENT.to_string()),
    }
}

/// Header row of the branch report.
pub fn branch_report_header() -> String {
    let mut columns = vec!["unitig".to_string(), "sequence".to_string(), "reads".to_string()];
    for side in ["right", "left"] {
        for base in ["A", "C", "G", "T"] {
            columns.push(format!("{side}_{base}_sequence"));
            columns.push(format!("{side}_{base}_reads"));
        }
    }
    columns.join(",")
}

/// One CSV row for a branching unitig.
pub fn branch_report_row(record: &BranchRecord) -> String {
    let mut fields = vec![
        record.unitig.to_string(),
        record.sequence.clone(),
        join_reads(&record.reads),
    ];
    for slot in record.right.iter().chain(record.left.iter()) {
        let (sequence, reads) = neighbour_fields(slot);
        fields.push(sequence);
        fields.push(reads);
    }
    fields.join(",")
}

/// Write the branch report as CSV
pub fn write_branch_report<P: AsRef<Path>>(records: &[BranchRecord], output_path: P) -> Result<()> {
    let path = output_path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", branch_report_header())?;
    for record in records {
        writeln!(writer, "{}", branch_report_row(record))?;
    }

    writer.flush()?;
    info!(
        "Wrote {} branching unitigs to CSV: {}",
        records.len(),
        path.display()
    );
    Ok(())
}

/// Write assembly statistics as pretty JSON
pub fn write_assembly_stats<P: AsRef<Path>>(stats: &AssemblyStats, output_path: P) -> Result<()> {
    let path = output_path.as_ref();
    let json = serde_json::to_string_pretty(stats).context("Failed to serialize statistics")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write stats file: {}", path.display()))?;
    info!("Wrote assembly statistics: {}", path.display());
    Ok(())
}
