//! Contraction of unique overlaps into unitigs

use dbg_forge::assembly::{contract, contract_both, Direction};
use dbg_forge::core::alphabet::{self, BASES};
use dbg_forge::core::data_structures::Read;
use dbg_forge::index::{prune, KmerIndex};

fn index_of(k: usize, m: usize, reads: &[&[u8]]) -> KmerIndex {
    let mut index = KmerIndex::new(k, m).unwrap();
    for (id, seq) in reads.iter().enumerate() {
        index.insert_read(&Read::new(id as u32, seq.to_vec())).unwrap();
    }
    index
}

fn contains_either_strand(haystack: &[u8], needle: &[u8]) -> bool {
    let reverse = alphabet::reverse_complement(needle);
    haystack.windows(needle.len()).any(|w| w == needle || w == &reverse[..])
}

#[test]
fn test_overlapping_reads_collapse_to_one_unitig() {
    let reads: [&[u8]; 4] = [b"AAATCCG", b"AAATCCG", b"ATCCGTT", b"ATCCGTT"];
    let mut index = index_of(5, 2, &reads);
    assert_eq!(index.len(), 5);
    prune(&mut index, 1);
    assert_eq!(index.len(), 5);

    let report = contract_both(&mut index);
    assert_eq!(report.merges, 4);
    assert_eq!(report.entries_after, 1);

    let (_, entry) = index.entries().next().unwrap();
    assert_eq!(entry.key(), b"AAATCCGTT");
    assert_eq!(entry.reads().to_vec(), vec![3, 2, 1, 0]);
}

#[test]
fn test_contraction_reaches_a_fixed_point() {
    let mut index = index_of(5, 2, &[b"GATTACAGGTCCA", b"CCGGTTAGACA"]);
    let first = contract(&mut index, Direction::Forward);
    assert!(first.passes >= 1);

    let again = contract(&mut index, Direction::Forward);
    assert_eq!(again.merges, 0);
    assert_eq!(again.passes, 1);
    assert_eq!(again.entries_after, first.entries_after);
}

#[test]
fn test_merging_preserves_every_kmer() {
    let reads: [&[u8]; 2] = [b"GATTACAGGTCCA", b"CCGGTTAGACA"];
    let mut index = index_of(5, 2, &reads);
    let before = index.len();
    let report = contract_both(&mut index);
    assert_eq!(index.len(), before - report.merges);

    let keys: Vec<Vec<u8>> = index.entries().map(|(_, e)| e.key().to_vec()).collect();
    for read in reads {
        for kmer in read.windows(5) {
            assert!(
                keys.iter().any(|key| contains_either_strand(key, kmer)),
                "k-mer {} lost during contraction",
                String::from_utf8_lossy(kmer)
            );
        }
    }
}

#[test]
fn test_cycle_terminates() {
    // AAT -> ATA -> TAA -> AAT closes a loop
    let mut index = KmerIndex::new(3, 2).unwrap();
    for kmer in [&b"AAT"[..], b"ATA", b"TAA"] {
        index.insert(kmer, 0).unwrap();
    }
    let report = contract_both(&mut index);
    assert_eq!(report.merges, 2);
    assert_eq!(report.entries_after, 1);

    // the walk starts at ATA, the lowest signature, and stops where the
    // loop closes
    let keys: Vec<Vec<u8>> = index.entries().map(|(_, e)| e.key().to_vec()).collect();
    assert_eq!(keys, vec![b"ATAAT".to_vec()]);
    let (_, entry) = index.entries().next().unwrap();
    assert_eq!(entry.reads().to_vec(), vec![0]);
}

#[test]
fn test_branch_blocks_merging() {
    // ACGTA continues both with CGTAC and CGTAG
    let mut index = KmerIndex::new(5, 2).unwrap();
    index.insert(b"ACGTA", 0).unwrap();
    index.insert(b"CGTAC", 1).unwrap();
    index.insert(b"CGTAG", 2).unwrap();
    let report = contract(&mut index, Direction::Forward);
    assert_eq!(report.merges, 0);
    assert_eq!(index.len(), 3);
}

#[test]
fn test_long_unique_path_merges_in_one_entry() {
    let mut rng = fastrand::Rng::with_seed(77);
    let genome: Vec<u8> = (0..5_000).map(|_| BASES[rng.usize(0..4)]).collect();
    let k = 21;

    let mut index = KmerIndex::new(k, 6).unwrap();
    for (position, kmer) in genome.windows(k).enumerate() {
        index.insert(kmer, (position / 50) as u32).unwrap();
    }
    let kmers = index.len();
    assert_eq!(kmers, genome.len() - k + 1);

    let report = contract_both(&mut index);
    assert_eq!(report.merges, kmers - 1);
    assert_eq!(report.entries_after, 1);

    let (_, entry) = index.entries().next().unwrap();
    assert_eq!(entry.key(), &*alphabet::canonical(&genome).0);
    let expected: Vec<u32> = (0..=((kmers - 1) / 50) as u32).rev().collect();
    assert_eq!(entry.reads().to_vec(), expected);
}
