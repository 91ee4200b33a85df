//! End-to-end runs of the assembly pipeline from read files to outputs

use dbg_forge::core::alphabet::{self, BASES};
use dbg_forge::core::data_structures::{AssemblyStats, Read};
use dbg_forge::utils::configuration::AssemblerConfig;
use dbg_forge::AssemblyPipeline;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn small_config(output_dir: &Path) -> AssemblerConfig {
    let mut config = AssemblerConfig::default();
    config.assembly.kmer_size = 5;
    config.assembly.signature_length = 2;
    config.assembly.abundance_cutoff = 1;
    config.output.output_dir = output_dir.to_path_buf();
    config
}

fn write_fastq(path: &Path, reads: &[&str]) {
    let mut file = fs::File::create(path).unwrap();
    for (idx, seq) in reads.iter().enumerate() {
        writeln!(file, "@read_{idx}").unwrap();
        writeln!(file, "{seq}").unwrap();
        writeln!(file, "+").unwrap();
        writeln!(file, "{}", "I".repeat(seq.len())).unwrap();
    }
}

fn contains_either_strand(genome: &[u8], seq: &[u8]) -> bool {
    let reverse = alphabet::reverse_complement(seq);
    genome
        .windows(seq.len())
        .any(|w| w == seq || w == &reverse[..])
}

#[test]
fn test_fastq_to_output_files() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("reads.fq");
    write_fastq(&input, &["AAATCCG", "AAATCCG", "ATCCGTT", "ATCCGTT"]);
    let out = dir.path().join("out");

    let pipeline = AssemblyPipeline::new(small_config(&out)).unwrap();
    let results = pipeline.run_files(&[input]).unwrap();
    pipeline.write_outputs(&results).unwrap();

    let unitigs = fs::read_to_string(out.join("unitigs.fa")).unwrap();
    assert!(unitigs.starts_with(">unitig_0"));
    assert!(unitigs.contains("AAATCCGTT"));
    assert!(out.join("contigs.fa").exists());

    let report = fs::read_to_string(out.join("unitig_info.csv")).unwrap();
    assert!(report.starts_with("unitig,sequence,reads"));

    let stats: AssemblyStats =
        serde_json::from_str(&fs::read_to_string(out.join("assembly_stats.json")).unwrap())
            .unwrap();
    assert_eq!(stats.num_reads, 4);
    assert_eq!(stats.merges, 4);
    assert_eq!(stats.num_unitigs, 1);
}

#[test]
fn test_read_ids_continue_across_files() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("a.fq");
    let second = dir.path().join("b.fa");
    write_fastq(&first, &["AAATCCG", "AAATCCG"]);
    fs::write(&second, ">r2\nATCCGTT\n>r3\natccgtn\n").unwrap();

    let pipeline = AssemblyPipeline::new(small_config(&dir.path().join("out"))).unwrap();
    let results = pipeline.run_files(&[first, second]).unwrap();

    // the trailing N becomes C, so read 3 is ATCCGTC and shares TCCGT
    // with read 2 while both final k-mers are pruned
    assert_eq!(results.stats.num_reads, 4);
    assert_eq!(results.unitigs.len(), 1);
    assert_eq!(results.unitigs[0].sequence, b"AAATCCGT");
    assert_eq!(results.unitigs[0].reads.to_vec(), vec![3, 2, 1, 0]);
}

#[test]
fn test_tiled_random_genome_assembles_to_one_unitig() {
    let mut rng = fastrand::Rng::with_seed(2024);
    let genome: Vec<u8> = (0..300).map(|_| BASES[rng.usize(0..4)]).collect();

    // each read twice so every k-mer survives a cutoff of 1
    let mut reads = Vec::new();
    for start in (0..=240).step_by(10) {
        for _ in 0..2 {
            let id = reads.len() as u32;
            reads.push(Read::new(id, genome[start..start + 60].to_vec()));
        }
    }

    let mut config = AssemblerConfig::default();
    config.assembly.kmer_size = 21;
    config.assembly.signature_length = 6;
    let results = AssemblyPipeline::new(config).unwrap().run(&reads).unwrap();

    assert_eq!(results.unitigs.len(), 1);
    let unitig = &results.unitigs[0].sequence;
    assert_eq!(unitig.len(), genome.len());
    assert!(contains_either_strand(&genome, unitig));
    assert_eq!(results.unitigs[0].reads.len(), reads.len());

    assert_eq!(results.contigs.len(), 1);
    assert_eq!(results.stats.n50, 300);
    assert_eq!(results.stats.num_tips, 0);
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let mut config = AssemblerConfig::default();
    config.assembly.signature_length = config.assembly.kmer_size;
    assert!(AssemblyPipeline::new(config).is_err());
}

#[test]
fn test_missing_input_file_is_an_error() {
    let dir = tempdir().unwrap();
    let pipeline = AssemblyPipeline::new(small_config(dir.path())).unwrap();
    assert!(pipeline.run_files(&[dir.path().join("absent.fq")]).is_err());
}
