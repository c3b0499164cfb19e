//! Mesh struct, creation, validation, getters

use crate::error::{Error, Result};
use crate::mesh::{Interval, RowKey};
use crate::runtime::{Buffer, Runtime};

/// CSR-based 3D mesh of half-open X-intervals keyed by (y, z) rows
///
/// Layout for a mesh with `N` rows and `E` intervals:
/// - `row_keys[N]`: (y, z) of each non-empty row, strictly increasing
///   under the lexicographic order
/// - `row_ptr[N + 1]`: non-decreasing CSR offsets, `row_ptr[0] = 0`,
///   `row_ptr[N] = E`
/// - `intervals[E]`: per-row intervals, sorted by `begin` and separated by
///   at least one empty cell within each row
///
/// The empty mesh has `N = 0`, `E = 0` and all buffers length zero.
///
/// Canonical outputs of the intersection pipeline contain no empty rows; on
/// input, rows with `row_ptr[i] == row_ptr[i + 1]` are tolerated and simply
/// never survive to the output.
pub struct Mesh<R: Runtime> {
    row_keys: Buffer<RowKey, R>,
    row_ptr: Buffer<usize, R>,
    intervals: Buffer<Interval, R>,
    device: R::Device,
}

impl<R: Runtime> Mesh<R> {
    /// The empty mesh
    pub fn empty(device: &R::Device) -> Self {
        Self {
            row_keys: Buffer::new_empty(device),
            row_ptr: Buffer::new_empty(device),
            intervals: Buffer::new_empty(device),
            device: device.clone(),
        }
    }

    /// Assemble a mesh from buffers the pipeline has already shaped
    pub(crate) fn from_parts(
        row_keys: Buffer<RowKey, R>,
        row_ptr: Buffer<usize, R>,
        intervals: Buffer<Interval, R>,
        device: R::Device,
    ) -> Self {
        Self {
            row_keys,
            row_ptr,
            intervals,
            device,
        }
    }

    /// Create a mesh from host slices, validating every mesh invariant
    ///
    /// For `N = 0`, `row_ptr` may be `[]` or `[0]`; both produce the
    /// canonical empty mesh. Otherwise `row_ptr` must have `N + 1` entries
    /// with `row_ptr[0] = 0` and `row_ptr[N] = intervals.len()`.
    pub fn from_slices(
        row_keys: &[RowKey],
        row_ptr: &[usize],
        intervals: &[Interval],
        device: &R::Device,
    ) -> Result<Self> {
        let num_rows = row_keys.len();

        if num_rows == 0 {
            if !(row_ptr.is_empty() || row_ptr == [0]) {
                return Err(Error::LengthMismatch {
                    buffer: "row_ptr",
                    expected: 0,
                    got: row_ptr.len(),
                });
            }
            if !intervals.is_empty() {
                return Err(Error::LengthMismatch {
                    buffer: "intervals",
                    expected: 0,
                    got: intervals.len(),
                });
            }
            return Ok(Self::empty(device));
        }

        validate_parts(row_keys, row_ptr, intervals)?;

        Ok(Self {
            row_keys: Buffer::from_slice(row_keys, device)?,
            row_ptr: Buffer::from_slice(row_ptr, device)?,
            intervals: Buffer::from_slice(intervals, device)?,
            device: device.clone(),
        })
    }

    /// Number of rows `N`
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.row_keys.len()
    }

    /// Number of stored intervals `E`
    #[inline]
    pub fn num_intervals(&self) -> usize {
        self.intervals.len()
    }

    /// Whether this is the empty mesh
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Total number of cells covered by all intervals
    ///
    /// Copies the interval buffer to the host.
    pub fn num_cells(&self) -> u64 {
        self.intervals
            .to_vec()
            .iter()
            .map(|iv| iv.size() as u64)
            .sum()
    }

    /// Row key buffer
    #[inline]
    pub fn row_keys(&self) -> &Buffer<RowKey, R> {
        &self.row_keys
    }

    /// CSR offset buffer
    #[inline]
    pub fn row_ptr(&self) -> &Buffer<usize, R> {
        &self.row_ptr
    }

    /// Interval buffer
    #[inline]
    pub fn intervals(&self) -> &Buffer<Interval, R> {
        &self.intervals
    }

    /// Device this mesh lives on
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.device
    }

    /// Check every mesh invariant, in O(N + E)
    ///
    /// Copies the buffers to the host; intended for input checking and
    /// debugging, not hot paths.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        validate_parts(
            &self.row_keys.to_vec(),
            &self.row_ptr.to_vec(),
            &self.intervals.to_vec(),
        )
    }
}

impl<R: Runtime> std::fmt::Debug for Mesh<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("num_rows", &self.num_rows())
            .field("num_intervals", &self.num_intervals())
            .finish()
    }
}

/// Invariant checks shared by `from_slices` and `validate`
///
/// Requires `row_keys` non-empty.
fn validate_parts(row_keys: &[RowKey], row_ptr: &[usize], intervals: &[Interval]) -> Result<()> {
    let num_rows = row_keys.len();

    if row_ptr.len() != num_rows + 1 {
        return Err(Error::LengthMismatch {
            buffer: "row_ptr",
            expected: num_rows + 1,
            got: row_ptr.len(),
        });
    }
    if row_ptr[0] != 0 {
        return Err(Error::NonMonotonicRowPtr { index: 0 });
    }
    if row_ptr[num_rows] != intervals.len() {
        return Err(Error::LengthMismatch {
            buffer: "intervals",
            expected: row_ptr[num_rows],
            got: intervals.len(),
        });
    }

    for i in 1..num_rows {
        if row_keys[i - 1] >= row_keys[i] {
            return Err(Error::UnsortedRowKeys { index: i });
        }
    }

    for i in 0..num_rows {
        if row_ptr[i] > row_ptr[i + 1] {
            return Err(Error::NonMonotonicRowPtr { index: i + 1 });
        }
    }

    for (index, iv) in intervals.iter().enumerate() {
        if iv.is_empty() {
            return Err(Error::EmptyInterval {
                index,
                begin: iv.begin,
                end: iv.end,
            });
        }
    }

    // Within a row: sorted by begin, pairwise disjoint with a gap.
    for row in 0..num_rows {
        for index in row_ptr[row] + 1..row_ptr[row + 1] {
            if intervals[index - 1].end >= intervals[index].begin {
                return Err(Error::IntervalOverlap { row, index });
            }
        }
    }

    Ok(())
}
