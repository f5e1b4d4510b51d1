//! Near-duplicate detection: shingling, MinHash signatures, LSH banding.
//!
//! Everything in this crate is deterministic and purely functional apart from
//! [`lsh::BandedIndex`], which is the one growing structure (owned by the
//! pipeline's commit lane). Nothing here does IO.

pub mod lsh;
pub mod minhash;
pub mod resolver;
pub mod shingle;

pub use lsh::BandedIndex;
pub use minhash::{MinHashSignature, MinHasher};
pub use resolver::{find_duplicate, SignatureStore};
pub use shingle::{shingle, ShingleSet};
