//! Row matching: (y, z) key search and CSR range lookup

use crate::mesh::RowKey;
use std::ops::Range;

/// Find the row holding `key` in a sorted, unique key array
///
/// Lower-bound search under the lexicographic (y, then z) order; returns the
/// row index or −1 when the key is absent. Safe to call from any parallel
/// worker.
pub(crate) fn find_row(keys: &[RowKey], key: RowKey) -> i64 {
    match keys.binary_search(&key) {
        Ok(index) => index as i64,
        Err(_) => -1,
    }
}

/// Interval ranges of a matched row pair, from the two CSR offset arrays
///
/// `None` when either side is unmatched or carries no intervals; this is
/// the empty-row shortcut shared by the count and fill phases.
pub(crate) fn row_ranges(
    idx_a: i64,
    idx_b: i64,
    row_ptr_a: &[usize],
    row_ptr_b: &[usize],
) -> Option<(Range<usize>, Range<usize>)> {
    if idx_a < 0 || idx_b < 0 {
        return None;
    }
    let ia = idx_a as usize;
    let ib = idx_b as usize;

    let range_a = row_ptr_a[ia]..row_ptr_a[ia + 1];
    let range_b = row_ptr_b[ib]..row_ptr_b[ib + 1];
    if range_a.is_empty() || range_b.is_empty() {
        None
    } else {
        Some((range_a, range_b))
    }
}
