//! Shape LOD Library - Shapefile decoding and line generalization trees
//!
//! This library decodes ESRI shapefile geometry from a resident byte buffer and
//! precomputes, for every polygon ring and polyline part, a binary line
//! generalization (BLG) tree. A consumer can then ask for the geometry at any
//! importance threshold without re-running simplification or re-reading bytes.
//!
//! # Architecture
//!
//! - **[`ByteCursor`]**: Bounds-checked reader with explicit byte order per read
//! - **[`ShapeHeader`]**: The fixed 100-byte file header
//! - **[`RecordReader`]**: Lazy iterator over variable-length shape records
//! - **[`VertexChain`]**: Arena-backed circular list of ring vertices with cached importance
//! - **[`builder`]**: Sort (quality) and sample (linear time) tree construction
//! - **[`GeneralizationTree`]**: Per-ring importance index queried by threshold
//! - **[`ShapeCollection`]**: Decodes a whole source and builds every tree in parallel
//!
//! # Performance Characteristics
//!
//! - **Decode**: O(B) in the size of the buffer, no copies of the raw bytes
//! - **Sort build**: O(P × N log N) per ring where P is the number of eviction passes
//! - **Sample build**: O(N × I) per ring for sample interval I
//! - **Query**: O(N) per ring

pub mod builder;
mod chain;
mod collection;
mod cursor;
mod header;
mod record;
mod tree;
pub mod utils;

#[cfg(test)]
pub(crate) mod fixtures;

// Public API exports
pub use builder::BuildMethod;
pub use chain::{ChainIter, RemovedVertex, VertexChain, VertexId};
pub use collection::{CollectionInfo, Config, RingTree, ShapeCollection, SimplifiedShape};
pub use cursor::ByteCursor;
pub use header::{BoundsXY, FILE_SIGNATURE, HEADER_LEN, ShapeHeader, ShapeType, ValueRange};
pub use record::{RecordReader, Ring, Shape, ShapeRecord};
pub use tree::{GeneralizationTree, TreeEntry};

/// Error types for decoding and tree building
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("Invalid shapefile header: {0}")]
    InvalidHeader(String),

    #[error("Invalid shapefile signature: expected 9994, found {0}")]
    InvalidSignature(i32),

    #[error("Insufficient data: {requested} bytes requested at offset {position} of {length}")]
    InsufficientData {
        position: usize,
        requested: usize,
        length: usize,
    },

    #[error("Malformed record {record_number}: {reason}")]
    MalformedRecord { record_number: i32, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShapeError {
    /// True for every failure that makes the file header unusable
    pub fn is_invalid_header(&self) -> bool {
        matches!(
            self,
            ShapeError::InvalidHeader(_) | ShapeError::InvalidSignature(_)
        )
    }

    pub(crate) fn malformed(record_number: i32, reason: impl Into<String>) -> Self {
        ShapeError::MalformedRecord {
            record_number,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(Config) -> Config = |c| c;
        let _: fn() -> GeneralizationTree = GeneralizationTree::new;
        let _: for<'a> fn(&'a [u8]) -> ByteCursor<'a> = |d| ByteCursor::new(d);
    }

    #[test]
    fn test_invalid_header_category() {
        assert!(ShapeError::InvalidSignature(0).is_invalid_header());
        assert!(ShapeError::InvalidHeader("short".into()).is_invalid_header());
        assert!(!ShapeError::malformed(3, "bad").is_invalid_header());
    }
}
