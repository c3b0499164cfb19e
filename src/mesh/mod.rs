//! Sparse 3D cell meshes in CSR interval form
//!
//! A mesh keys each non-empty (y, z) row to a sorted run of half-open
//! X-intervals. Storage is compressed sparse row: a sorted row-key array, an
//! offset array, and one flat interval array.

mod cell;
mod convert;
mod core;

pub use self::cell::{Coord, Interval, RowKey};
pub use self::core::Mesh;
