//! Randomised checks of the signature scanner and read-id merging

use dbg_forge::core::alphabet::{self, BASES};
use dbg_forge::core::read_ids::{merge_descending, ReadId};
use dbg_forge::index::{signature_of, KmerScanner};
use std::collections::BTreeSet;

fn random_sequence(rng: &mut fastrand::Rng, len: usize) -> Vec<u8> {
    (0..len).map(|_| BASES[rng.usize(0..BASES.len())]).collect()
}

#[test]
fn test_rolling_signatures_match_from_scratch() {
    let mut rng = fastrand::Rng::with_seed(11);
    for _ in 0..200 {
        let k = rng.usize(2..=40);
        let m = rng.usize(1..k).min(alphabet::MAX_SCORED_LENGTH);
        let len = rng.usize(k..k + 60);
        let read = random_sequence(&mut rng, len);

        let scanned: Vec<_> = KmerScanner::new(&read, k, m).collect();
        assert_eq!(scanned.len(), read.len() - k + 1);
        for (position, item) in scanned.iter().enumerate() {
            let kmer = &read[position..position + k];
            let (canonical, forward) = alphabet::canonical(kmer);
            assert_eq!(item.position, position);
            assert_eq!(item.kmer, &*canonical);
            assert_eq!(item.forward, forward);
            assert_eq!(item.signature, signature_of(kmer, m), "k={k} m={m}");
        }
    }
}

#[test]
fn test_signature_is_strand_independent() {
    let mut rng = fastrand::Rng::with_seed(5);
    for _ in 0..200 {
        let k = rng.usize(2..=31);
        let m = rng.usize(1..k);
        let kmer = random_sequence(&mut rng, k);
        let reverse = alphabet::reverse_complement(&kmer);
        assert_eq!(signature_of(&kmer, m), signature_of(&reverse, m));
    }
}

#[test]
fn test_merge_descending_is_ordered_union() {
    let mut rng = fastrand::Rng::with_seed(99);
    for _ in 0..200 {
        let a: BTreeSet<ReadId> = (0..rng.usize(0..20)).map(|_| rng.u32(0..50)).collect();
        let b: BTreeSet<ReadId> = (0..rng.usize(0..20)).map(|_| rng.u32(0..50)).collect();

        let merged = merge_descending(a.iter().rev().copied(), b.iter().rev().copied());

        let expected: Vec<ReadId> = a.union(&b).copied().collect::<Vec<_>>().into_iter().rev().collect();
        assert_eq!(merged, expected);
    }
}
