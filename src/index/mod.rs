pub mod arena;
pub mod hash_level;
pub mod kmer_index;
pub mod prune;
pub mod signature;

pub use arena::{Arena, Handle};
pub use hash_level::{HashLevel, LevelCursor, PRIME_CAPACITIES};
pub use kmer_index::{Anchor, EntryId, KmerCursor, KmerEntry, KmerIndex, SignatureCursor};
pub use prune::{prune, PruneReport};
pub use signature::{canonical_signature, signature_of, KmerScanner, ScannedKmer, Signature};
