//! Coordinate, interval, and row-key value types

use crate::runtime::Element;
use bytemuck::{Pod, Zeroable};

/// Cell coordinate along any axis
///
/// Signed; the whole `i32` range is a valid cell index.
pub type Coord = i32;

/// Half-open interval `[begin, end)` on the X axis
///
/// Invariant for stored intervals: `begin < end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Interval {
    /// Inclusive begin
    pub begin: Coord,
    /// Exclusive end
    pub end: Coord,
}

impl Interval {
    /// Number of cells covered
    #[inline]
    pub fn size(&self) -> Coord {
        self.end - self.begin
    }

    /// Whether the interval covers no cells
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Overlap of two intervals: `[max(begin), min(end))`
    ///
    /// The result may be empty; callers check [`Interval::is_empty`] before
    /// storing it.
    #[inline]
    pub fn intersection(&self, other: &Interval) -> Interval {
        Interval {
            begin: self.begin.max(other.begin),
            end: self.end.min(other.end),
        }
    }
}

/// Row key for the 3D sparse structure (Y and Z axes)
///
/// Rows are identified by their (y, z) coordinates; the X-axis data for each
/// row is a list of intervals. The derived `Ord` is lexicographic (y, then
/// z), which is the order row keys are stored in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Pod, Zeroable)]
#[repr(C)]
pub struct RowKey {
    /// Y coordinate
    pub y: Coord,
    /// Z coordinate
    pub z: Coord,
}

impl Element for Interval {}
impl Element for RowKey {}
