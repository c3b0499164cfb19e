//! Reusable scratch buffers for the intersection pipeline

use crate::error::Result;
use crate::mesh::{Interval, RowKey};
use crate::runtime::{Buffer, Element, Runtime};

/// Caller-owned scratch pool reused across intersection calls
///
/// Every buffer grows on demand and is never shrunk, so a workspace that has
/// seen the largest inputs of a workload allocates nothing on later calls.
/// A workspace is exclusively owned by one call for its duration; concurrent
/// calls need separate workspaces.
pub struct IntersectWorkspace<R: Runtime> {
    /// 1 where a row of A also exists in B
    pub(crate) flags: Buffer<usize, R>,
    /// Row index into A per flagged row, −1 otherwise
    pub(crate) idx_a: Buffer<i64, R>,
    /// Row index into B per flagged row, −1 otherwise
    pub(crate) idx_b: Buffer<i64, R>,
    /// Exclusive scan of `flags`
    pub(crate) positions: Buffer<usize, R>,
    /// Keys of the matched rows, densely packed
    pub(crate) matched_keys: Buffer<RowKey, R>,
    /// A-side row index per matched row
    pub(crate) matched_idx_a: Buffer<i64, R>,
    /// B-side row index per matched row
    pub(crate) matched_idx_b: Buffer<i64, R>,
    /// Output intervals per matched row
    pub(crate) row_counts: Buffer<usize, R>,
    /// CSR offsets over the matched rows (one extra slot for the total)
    pub(crate) row_ptr: Buffer<usize, R>,
    /// Pessimistically sized fill buffer (`A.E + B.E`)
    pub(crate) intervals: Buffer<Interval, R>,
    /// 1 where a matched row produced intervals
    pub(crate) has_intervals: Buffer<usize, R>,
    /// Exclusive scan of `has_intervals`
    pub(crate) new_positions: Buffer<usize, R>,
}

impl<R: Runtime> IntersectWorkspace<R> {
    /// Create an empty workspace on `device`
    ///
    /// No memory is allocated until the first intersection sizes the
    /// buffers.
    pub fn new(device: &R::Device) -> Self {
        Self {
            flags: Buffer::new_empty(device),
            idx_a: Buffer::new_empty(device),
            idx_b: Buffer::new_empty(device),
            positions: Buffer::new_empty(device),
            matched_keys: Buffer::new_empty(device),
            matched_idx_a: Buffer::new_empty(device),
            matched_idx_b: Buffer::new_empty(device),
            row_counts: Buffer::new_empty(device),
            row_ptr: Buffer::new_empty(device),
            intervals: Buffer::new_empty(device),
            has_intervals: Buffer::new_empty(device),
            new_positions: Buffer::new_empty(device),
        }
    }

    /// Size the row-matching scratch for `num_rows_a` driving rows
    pub(crate) fn reserve_row_match(&mut self, num_rows_a: usize) -> Result<()> {
        ensure_capacity(&mut self.flags, num_rows_a)?;
        ensure_capacity(&mut self.idx_a, num_rows_a)?;
        ensure_capacity(&mut self.idx_b, num_rows_a)?;
        ensure_capacity(&mut self.positions, num_rows_a)
    }

    /// Size the per-matched-row scratch for `matched_rows` rows
    pub(crate) fn reserve_matched(&mut self, matched_rows: usize) -> Result<()> {
        ensure_capacity(&mut self.matched_keys, matched_rows)?;
        ensure_capacity(&mut self.matched_idx_a, matched_rows)?;
        ensure_capacity(&mut self.matched_idx_b, matched_rows)?;
        ensure_capacity(&mut self.row_counts, matched_rows)?;
        ensure_capacity(&mut self.row_ptr, matched_rows + 1)?;
        ensure_capacity(&mut self.has_intervals, matched_rows)?;
        ensure_capacity(&mut self.new_positions, matched_rows)
    }

    /// Size the fill buffer to the worst-case interval count
    pub(crate) fn reserve_intervals(&mut self, capacity: usize) -> Result<()> {
        ensure_capacity(&mut self.intervals, capacity)
    }
}

/// Reallocate `buffer` if it holds fewer than `len` elements
///
/// Content is not preserved; these are scratch buffers.
fn ensure_capacity<T: Element, R: Runtime>(buffer: &mut Buffer<T, R>, len: usize) -> Result<()> {
    if buffer.len() < len {
        let device = buffer.device().clone();
        *buffer = Buffer::zeroed(len, &device)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_workspace_grows_monotonically() {
        let device = CpuDevice::new();
        let mut ws = IntersectWorkspace::<CpuRuntime>::new(&device);
        assert_eq!(ws.flags.len(), 0);

        ws.reserve_row_match(100).unwrap();
        assert_eq!(ws.flags.len(), 100);
        let ptr = ws.flags.ptr();

        // Smaller requests keep the existing allocation.
        ws.reserve_row_match(10).unwrap();
        assert_eq!(ws.flags.len(), 100);
        assert_eq!(ws.flags.ptr(), ptr);

        ws.reserve_matched(40).unwrap();
        assert_eq!(ws.row_ptr.len(), 41);
    }
}
