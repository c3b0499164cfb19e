//! Error types for meshix

use crate::mesh::Coord;
use thiserror::Error;

/// Result type alias using meshix's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in meshix operations
#[derive(Error, Debug)]
pub enum Error {
    /// Row keys are not strictly increasing under the (y, then z) order
    #[error("row keys not strictly increasing at index {index}")]
    UnsortedRowKeys {
        /// Index of the offending key
        index: usize,
    },

    /// CSR offsets decrease somewhere
    #[error("row_ptr not non-decreasing at index {index}")]
    NonMonotonicRowPtr {
        /// Index of the offending offset
        index: usize,
    },

    /// A buffer does not have the length the CSR layout requires
    #[error("buffer length mismatch for '{buffer}': expected {expected}, got {got}")]
    LengthMismatch {
        /// Which buffer is wrong
        buffer: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// A stored interval is empty (`begin >= end`)
    #[error("empty interval [{begin}, {end}) at index {index}")]
    EmptyInterval {
        /// Index into the interval buffer
        index: usize,
        /// Interval begin
        begin: Coord,
        /// Interval end
        end: Coord,
    },

    /// Intervals within one row overlap or touch
    #[error("intervals overlap or touch in row {row} at interval index {index}")]
    IntervalOverlap {
        /// Row containing the offending pair
        row: usize,
        /// Index of the second interval of the pair
        index: usize,
    },

    /// Out of memory
    #[error("out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Device mismatch between operands
    #[error("device mismatch: meshes and client must live on the same device")]
    DeviceMismatch,

    /// Backend-specific error
    #[error("backend error: {0}")]
    Backend(String),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}
