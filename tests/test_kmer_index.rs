//! Two-level k-mer index: insertion, lookup and cursor traversal

use dbg_forge::core::alphabet;
use dbg_forge::core::data_structures::Read;
use dbg_forge::index::{signature_of, KmerIndex};
use std::collections::HashSet;

fn index_of(k: usize, m: usize, reads: &[&[u8]]) -> KmerIndex {
    let mut index = KmerIndex::new(k, m).unwrap();
    for (id, seq) in reads.iter().enumerate() {
        index.insert_read(&Read::new(id as u32, seq.to_vec())).unwrap();
    }
    index
}

#[cfg(test)]
mod insertion_tests {
    use super::*;

    #[test]
    fn test_kmer_and_reverse_complement_share_an_entry() {
        let mut index = KmerIndex::new(5, 2).unwrap();
        let a = index.insert(b"ACGTT", 0).unwrap();
        let b = index.insert(b"AACGT", 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(b"ACGTT").unwrap().to_vec(), vec![1, 0]);
        assert_eq!(index.get(b"AACGT").unwrap().to_vec(), vec![1, 0]);
    }

    #[test]
    fn test_repeated_read_id_is_recorded_once() {
        let index = index_of(3, 2, &[b"AAAAAA"]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(b"AAA").unwrap().to_vec(), vec![0]);
    }

    #[test]
    fn test_entry_count_matches_distinct_canonical_kmers() {
        let reads: [&[u8]; 3] = [b"GATTACAGATTACA", b"TGTAATCTGTAATC", b"CCCGGGAAATTT"];
        let index = index_of(5, 3, &reads);

        let distinct: HashSet<Vec<u8>> = reads
            .iter()
            .flat_map(|read| read.windows(5))
            .map(|kmer| alphabet::canonical(kmer).0.into_owned())
            .collect();
        assert_eq!(index.len(), distinct.len());
        for kmer in &distinct {
            let signature = signature_of(kmer, 3);
            assert!(index.contains_bucket(signature));
            assert!(index.lookup(signature, kmer).is_some());
        }
    }

    #[test]
    fn test_short_read_contributes_nothing() {
        let mut index = KmerIndex::new(7, 3).unwrap();
        let seen = index.insert_read(&Read::new(0, b"ACGT".to_vec())).unwrap();
        assert_eq!(seen, 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let mut index = KmerIndex::new(5, 2).unwrap();
        assert!(index.insert(b"ACGT", 0).is_err());
        assert!(index.insert(b"ACGNT", 0).is_err());
        assert!(index.insert_read(&Read::new(0, b"ACGTNACGT".to_vec())).is_err());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        assert!(KmerIndex::new(1, 1).is_err());
        assert!(KmerIndex::new(5, 0).is_err());
        assert!(KmerIndex::new(5, 5).is_err());
        assert!(KmerIndex::new(40, 32).is_err());
        assert!(KmerIndex::new(40, 31).is_ok());
    }
}

#[cfg(test)]
mod cursor_tests {
    use super::*;

    #[test]
    fn test_cursors_visit_every_entry_once() {
        let mut index = index_of(5, 2, &[b"GATTACAGATTACA", b"CCCGGGAAATTT"]);
        let mut visited = HashSet::new();

        let mut signatures = index.signature_cursor();
        while let Some(signature) = signatures.advance(&mut index) {
            let mut kmers = index.kmer_cursor(signature);
            while let Some(id) = kmers.advance(&mut index) {
                assert!(visited.insert(id), "entry visited twice");
            }
        }
        assert_eq!(visited.len(), index.len());
    }

    #[test]
    fn test_removing_through_kmer_cursor() {
        let mut index = index_of(5, 2, &[b"GATTACAGATTACA"]);
        let before = index.len();

        let signature = index.signatures_ascending()[0];
        let in_bucket = index.bucket_entries(signature).len();
        let mut kmers = index.kmer_cursor(signature);
        while kmers.advance(&mut index).is_some() {
            assert!(kmers.remove_current());
            // a second removal of the same position is a no-op
            assert!(!kmers.remove_current());
        }

        assert_eq!(index.len(), before - in_bucket);
        assert_eq!(index.bucket_len(signature), 0);
        assert!(index.remove_bucket_if_empty(signature));
        assert!(!index.contains_bucket(signature));
    }

    #[test]
    fn test_removing_signature_drops_its_entries() {
        let mut index = index_of(5, 2, &[b"GATTACAGATTACA", b"CCCGGGAAATTT"]);
        let buckets = index.bucket_count();

        let mut signatures = index.signature_cursor();
        assert!(!signatures.remove_current());
        while signatures.advance(&mut index).is_some() {
            signatures.remove_current();
        }

        assert_eq!(index.len(), 0);
        assert_eq!(index.bucket_count(), 0);
        assert!(buckets > 0);
    }

    #[test]
    fn test_exhausted_cursor_stays_exhausted() {
        let mut index = index_of(4, 2, &[b"ACGTAC"]);
        let mut signatures = index.signature_cursor();
        while signatures.advance(&mut index).is_some() {}
        assert!(signatures.advance(&mut index).is_none());

        let signature = index.signatures_ascending()[0];
        let mut kmers = index.kmer_cursor(signature);
        while kmers.advance(&mut index).is_some() {}
        assert!(kmers.advance(&mut index).is_none());
        assert!(kmers.current().is_none());
    }

    #[test]
    fn test_cursor_on_missing_bucket_yields_nothing() {
        let mut index = index_of(4, 2, &[b"ACGTAC"]);
        let mut kmers = index.kmer_cursor(u64::MAX);
        assert!(kmers.advance(&mut index).is_none());
    }
}
