//! Two-bit DNA alphabet codec
//!
//! Maps the four nucleotides to 2-bit values and defines the numeric score
//! used to order sequences. Values follow `A > C > G > T`, so complementary
//! bases always sum to 3 and the canonical form of a k-mer is whichever of
//! the k-mer and its reverse complement has the higher score.

use std::borrow::Cow;
use std::cmp::Ordering;

/// Fixed base enumeration order used wherever the four possible
/// continuations of an overlap are tried in turn.
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Longest window whose score still fits in a `u64`.
pub const MAX_SCORED_LENGTH: usize = 31;

/// 2-bit value of a nucleotide, `None` for anything outside `ACGT`.
#[inline(always)]
pub fn encode(base: u8) -> Option<u8> {
    match base {
        b'A' => Some(3),
        b'C' => Some(2),
        b'G' => Some(1),
        b'T' => Some(0),
        _ => None,
    }
}

/// Inverse of [`encode`]; only the low two bits are read.
#[inline(always)]
pub fn decode(value: u8) -> u8 {
    match value & 0b11 {
        3 => b'A',
        2 => b'C',
        1 => b'G',
        _ => b'T',
    }
}

#[inline(always)]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        other => other,
    }
}

/// Value used by the score functions; non-alphabet bytes count as `T`.
#[inline(always)]
pub(crate) fn value(base: u8) -> u64 {
    encode(base).unwrap_or(0) as u64
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

pub fn is_clean(seq: &[u8]) -> bool {
    seq.iter().all(|&b| encode(b).is_some())
}

/// Upper-case `seq` in place and replace every byte outside `ACGT` with
/// `replacement`. Returns the number of replaced bytes.
pub fn clean_in_place(seq: &mut [u8], replacement: u8) -> usize {
    let mut replaced = 0;
    for base in seq.iter_mut() {
        base.make_ascii_uppercase();
        if encode(*base).is_none() {
            *base = replacement;
            replaced += 1;
        }
    }
    replaced
}

/// Base-4 positional score of `seq` (most significant symbol first).
///
/// Only meaningful for sequences up to [`MAX_SCORED_LENGTH`] symbols.
pub fn score(seq: &[u8]) -> u64 {
    debug_assert!(seq.len() <= MAX_SCORED_LENGTH);
    seq.iter().fold(0u64, |acc, &b| (acc << 2) | value(b))
}

/// Score of the reverse complement of `seq`, computed without allocating.
pub fn reverse_complement_score(seq: &[u8]) -> u64 {
    debug_assert!(seq.len() <= MAX_SCORED_LENGTH);
    seq.iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 2) | (3 - value(b)))
}

/// Compare two equal-length sequences by score. Works for any length since
/// it compares symbol by symbol instead of materialising the score.
pub fn compare_by_score(a: &[u8], b: &[u8]) -> Ordering {
    debug_assert_eq!(a.len(), b.len());
    for (&x, &y) in a.iter().zip(b.iter()) {
        match value(x).cmp(&value(y)) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// True when `seq` scores at least as high as its reverse complement,
/// i.e. the sequence is already in canonical orientation.
pub fn is_forward_canonical(seq: &[u8]) -> bool {
    let n = seq.len();
    for i in 0..n {
        let forward = value(seq[i]);
        let reverse = 3 - value(seq[n - 1 - i]);
        if forward != reverse {
            return forward > reverse;
        }
    }
    true
}

/// Canonical form of `seq` together with a flag telling whether the input
/// orientation was kept.
pub fn canonical(seq: &[u8]) -> (Cow<'_, [u8]>, bool) {
    if is_forward_canonical(seq) {
        (Cow::Borrowed(seq), true)
    } else {
        (Cow::Owned(reverse_complement(seq)), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        for &base in &BASES {
            assert_eq!(decode(encode(base).unwrap()), base);
        }
        assert_eq!(encode(b'N'), None);
    }

    #[test]
    fn test_complement_values_sum_to_three() {
        for &base in &BASES {
            assert_eq!(value(base) + value(complement(base)), 3);
        }
    }

    #[test]
    fn test_score_ordering() {
        // A > C > G > T
        assert!(score(b"A") > score(b"C"));
        assert!(score(b"C") > score(b"G"));
        assert!(score(b"G") > score(b"T"));
        assert_eq!(score(b"AT"), 3 * 4);
        assert_eq!(score(b"TTT"), 0);
    }

    #[test]
    fn test_reverse_complement_score_matches_materialised() {
        let seq = b"GATTACAGC";
        assert_eq!(
            reverse_complement_score(seq),
            score(&reverse_complement(seq))
        );
    }

    #[test]
    fn test_canonical_picks_higher_score() {
        // TCCGT vs ACGGA: ACGGA starts with A and wins
        let (canon, forward) = canonical(b"TCCGT");
        assert_eq!(&*canon, b"ACGGA");
        assert!(!forward);

        let (canon, forward) = canonical(b"AAATC");
        assert_eq!(&*canon, b"AAATC");
        assert!(forward);
    }

    #[test]
    fn test_palindrome_is_its_own_canonical() {
        let (canon, forward) = canonical(b"ACGT");
        assert_eq!(&*canon, b"ACGT");
        assert!(forward);
    }

    #[test]
    fn test_clean_in_place() {
        let mut seq = b"acgNtx".to_vec();
        let replaced = clean_in_place(&mut seq, b'C');
        assert_eq!(seq, b"ACGCTC");
        assert_eq!(replaced, 2);
        assert!(is_clean(&seq));
    }

    #[test]
    fn test_compare_by_score_long_sequences() {
        let a = vec![b'A'; 64];
        let mut b = a.clone();
        b[63] = b'C';
        assert_eq!(compare_by_score(&a, &b), Ordering::Greater);
        assert_eq!(compare_by_score(&b, &b), Ordering::Equal);
    }
}
