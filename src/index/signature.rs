//! Minimizer signatures
//! ====================
//!
//! The signature of a k-mer is the highest-scoring M-length window of its
//! canonical form. Scores are base-4 positional values, so comparing two
//! signatures numerically is the same as comparing the windows by score.
//!
//! [`KmerScanner`] walks every k-mer of a read and keeps the per-window
//! scores of both strands rolling, so a window maximum is only rescanned
//! when the previous maximum slides out of the k-mer.

use crate::core::alphabet::{self, MAX_SCORED_LENGTH};

/// Score of the maximal M-window of a canonical k-mer.
pub type Signature = u64;

/// Signature of `kmer`, computed from scratch.
pub fn signature_of(kmer: &[u8], m: usize) -> Signature {
    let (canonical, _) = alphabet::canonical(kmer);
    canonical_signature(&canonical, m)
}

/// Signature of a k-mer that is already canonical.
pub fn canonical_signature(canonical_kmer: &[u8], m: usize) -> Signature {
    debug_assert!(m >= 1 && m <= MAX_SCORED_LENGTH && m <= canonical_kmer.len());
    canonical_kmer
        .windows(m)
        .map(alphabet::score)
        .max()
        .unwrap_or_default()
}

/// One k-mer produced by a [`KmerScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedKmer {
    /// Offset of the k-mer in the read
    pub position: usize,
    /// Canonical form
    pub kmer: Vec<u8>,
    /// Whether the read orientation was already canonical
    pub forward: bool,
    pub signature: Signature,
}

/// Sliding maximum over a window of precomputed scores.
#[derive(Debug, Clone, Copy)]
struct WindowMax {
    value: u64,
    position: usize,
}

impl WindowMax {
    fn scan(scores: &[u64], start: usize, end: usize) -> Self {
        let mut best = WindowMax {
            value: scores[start],
            position: start,
        };
        // prefer the rightmost maximum so it stays in the window longest
        for (position, &value) in scores.iter().enumerate().take(end + 1).skip(start + 1) {
            if value >= best.value {
                best = WindowMax { value, position };
            }
        }
        best
    }

    /// Slide the window to `[start, end]`, where `end` is the only new slot.
    fn slide(&mut self, scores: &[u64], start: usize, end: usize) {
        if self.position < start {
            *self = Self::scan(scores, start, end);
        } else if scores[end] >= self.value {
            self.value = scores[end];
            self.position = end;
        }
    }
}

/// Canonical k-mers of a read with their signatures, left to right.
#[derive(Debug, Clone)]
pub struct KmerScanner<'a> {
    read: &'a [u8],
    k: usize,
    m: usize,
    next_position: usize,
    forward_scores: Vec<u64>,
    reverse_scores: Vec<u64>,
    forward_max: Option<WindowMax>,
    reverse_max: Option<WindowMax>,
}

impl<'a> KmerScanner<'a> {
    /// Scanner over `read`. Reads shorter than `k` yield nothing.
    pub fn new(read: &'a [u8], k: usize, m: usize) -> Self {
        debug_assert!(m >= 1 && m <= MAX_SCORED_LENGTH && m <= k);
        let (forward_scores, reverse_scores) = if read.len() >= k {
            rolling_window_scores(read, m)
        } else {
            (Vec::new(), Vec::new())
        };
        Self {
            read,
            k,
            m,
            next_position: 0,
            forward_scores,
            reverse_scores,
            forward_max: None,
            reverse_max: None,
        }
    }

    fn remaining(&self) -> usize {
        (self.read.len() + 1).saturating_sub(self.k + self.next_position)
    }
}

impl Iterator for KmerScanner<'_> {
    type Item = ScannedKmer;

    fn next(&mut self) -> Option<ScannedKmer> {
        if self.remaining() == 0 {
            return None;
        }
        let position = self.next_position;
        self.next_position += 1;

        let last_window = position + self.k - self.m;
        let forward_max = advance_max(
            &mut self.forward_max,
            &self.forward_scores,
            position,
            last_window,
        );
        let reverse_max = advance_max(
            &mut self.reverse_max,
            &self.reverse_scores,
            position,
            last_window,
        );

        let window = &self.read[position..position + self.k];
        let forward = alphabet::is_forward_canonical(window);
        let (kmer, signature) = if forward {
            (window.to_vec(), forward_max)
        } else {
            (alphabet::reverse_complement(window), reverse_max)
        };

        Some(ScannedKmer {
            position,
            kmer,
            forward,
            signature,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for KmerScanner<'_> {}

fn advance_max(slot: &mut Option<WindowMax>, scores: &[u64], start: usize, end: usize) -> u64 {
    match slot {
        Some(max) => max.slide(scores, start, end),
        None => *slot = Some(WindowMax::scan(scores, start, end)),
    }
    slot.map_or(0, |max| max.value)
}

/// Scores of every M-window of `read` and of the reverse complement of
/// that same window, indexed by window start.
fn rolling_window_scores(read: &[u8], m: usize) -> (Vec<u64>, Vec<u64>) {
    let windows = read.len() + 1 - m;
    let top = 1u64 << (2 * (m - 1));
    let mut forward = Vec::with_capacity(windows);
    let mut reverse = Vec::with_capacity(windows);

    forward.push(alphabet::score(&read[..m]));
    reverse.push(alphabet::reverse_complement_score(&read[..m]));
    for j in 0..windows - 1 {
        let leaving = alphabet::value(read[j]);
        let entering = alphabet::value(read[j + m]);
        forward.push((forward[j] - leaving * top) * 4 + entering);
        reverse.push((reverse[j] - (3 - leaving)) / 4 + (3 - entering) * top);
    }

    (forward, reverse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_orientation_independent() {
        let kmer = b"GATTACAGGT";
        let rc = alphabet::reverse_complement(kmer);
        assert_eq!(signature_of(kmer, 4), signature_of(&rc, 4));
    }

    #[test]
    fn test_signature_is_max_window_score() {
        // canonical form of AACGT is itself; best 2-window is AA
        assert_eq!(signature_of(b"AACGT", 2), alphabet::score(b"AA"));
    }

    #[test]
    fn test_scanner_matches_from_scratch() {
        let read = b"TTGACCATGGATCCAAGTTTACGGCATAGGCTTAAC";
        for (k, m) in [(5, 2), (7, 4), (11, 4), (21, 8)] {
            let scanned: Vec<_> = KmerScanner::new(read, k, m).collect();
            assert_eq!(scanned.len(), read.len() - k + 1);
            for item in scanned {
                let window = &read[item.position..item.position + k];
                let (canonical, forward) = alphabet::canonical(window);
                assert_eq!(item.kmer, &*canonical);
                assert_eq!(item.forward, forward);
                assert_eq!(item.signature, signature_of(window, m), "k={k} m={m}");
            }
        }
    }

    #[test]
    fn test_short_read_yields_nothing() {
        assert_eq!(KmerScanner::new(b"ACGT", 5, 2).count(), 0);
        assert_eq!(KmerScanner::new(b"ACGTA", 5, 2).count(), 1);
    }
}
