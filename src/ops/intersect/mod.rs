//! The mesh intersection pipeline
//!
//! [`intersect_meshes`] is a bulk-synchronous composition of data-parallel
//! kernels sharing a small set of scratch buffers. Dependencies flow
//! strictly forward; every kernel is preceded by a barrier that makes the
//! previous kernel's writes visible.
//!
//! | Phase | Kernel      | Work items | Produces                              |
//! |-------|-------------|------------|---------------------------------------|
//! | P1    | row match   | `N_A`      | match flag + (idx_a, idx_b) per A-row |
//! | P2    | row scan    | `N_A`      | row positions + matched count `M`     |
//! | P3    | row compact | `N_A`      | packed (key, idx_a, idx_b)[M]         |
//! | P4    | count       | `M`        | output intervals per matched row      |
//! | P5    | offset scan | `M`        | `row_ptr[0..=M]` + total `T`          |
//! | P6    | fill        | `M`        | intervals[0..T]                       |
//! | P7    | compact     | `M`        | final mesh, empty rows removed        |
//!
//! The pipeline is generic over the backend client; any runtime with
//! host-coherent memory whose client implements
//! [`ParallelOps`](crate::runtime::ParallelOps) can run it unchanged.

mod merge;
mod row_match;
mod workspace;

pub use self::workspace::IntersectWorkspace;

use self::merge::merge_row_intervals;
use self::row_match::{find_row, row_ranges};
use crate::error::{Error, Result};
use crate::mesh::{Interval, Mesh, RowKey};
use crate::runtime::kernel::SharedSlice;
use crate::runtime::{Buffer, Device, ParallelOps, Runtime, RuntimeClient};

/// Compute the intersection of two meshes
///
/// Returns a new canonical mesh containing exactly the cells present in
/// both inputs. Returns the empty mesh when either input is empty, when no
/// row keys match, or when every matched row's intervals are disjoint.
///
/// The inputs are read-only and may be shared across concurrent calls;
/// `workspace` is exclusively owned by this call for its duration. In debug
/// builds the inputs' mesh invariants are re-checked up front (O(N + E));
/// release builds assume them.
pub fn intersect_meshes<R, C>(
    client: &C,
    a: &Mesh<R>,
    b: &Mesh<R>,
    workspace: &mut IntersectWorkspace<R>,
) -> Result<Mesh<R>>
where
    R: Runtime,
    C: RuntimeClient<R> + ParallelOps,
{
    let device = client.device().clone();
    if !a.device().is_same(&device) || !b.device().is_same(&device) {
        return Err(Error::DeviceMismatch);
    }

    #[cfg(debug_assertions)]
    {
        a.validate()?;
        b.validate()?;
    }

    if a.is_empty() || b.is_empty() {
        return Ok(Mesh::empty(&device));
    }

    let num_rows_a = a.num_rows();

    // Safety: every buffer below is host-coherent per the ParallelOps
    // contract, and the input meshes are not mutated for the duration of
    // the call.
    let a_keys = unsafe { a.row_keys().as_host_slice() };
    let b_keys = unsafe { b.row_keys().as_host_slice() };
    let a_row_ptr = unsafe { a.row_ptr().as_host_slice() };
    let b_row_ptr = unsafe { b.row_ptr().as_host_slice() };
    let a_intervals = unsafe { a.intervals().as_host_slice() };
    let b_intervals = unsafe { b.intervals().as_host_slice() };

    workspace.reserve_row_match(num_rows_a)?;

    // Phase 1: flag the rows of A whose key also exists in B.
    {
        let flags_buf = unsafe { workspace.flags.as_host_slice_mut() };
        let idx_a_buf = unsafe { workspace.idx_a.as_host_slice_mut() };
        let idx_b_buf = unsafe { workspace.idx_b.as_host_slice_mut() };
        let flags = SharedSlice::new(&mut flags_buf[..num_rows_a]);
        let idx_a = SharedSlice::new(&mut idx_a_buf[..num_rows_a]);
        let idx_b = SharedSlice::new(&mut idx_b_buf[..num_rows_a]);

        client.parallel_for(num_rows_a, |i| {
            let found = find_row(b_keys, a_keys[i]);
            // Safety: each work item writes only index i.
            unsafe {
                if found >= 0 {
                    flags.write(i, 1);
                    idx_a.write(i, i as i64);
                    idx_b.write(i, found);
                } else {
                    flags.write(i, 0);
                    idx_a.write(i, -1);
                    idx_b.write(i, -1);
                }
            }
        });
        client.barrier();
    }

    // Phase 2: scan the flags into dense positions.
    let matched_rows = {
        let flags = unsafe { workspace.flags.as_host_slice() };
        let positions = unsafe { workspace.positions.as_host_slice_mut() };
        client.exclusive_scan(&flags[..num_rows_a], &mut positions[..num_rows_a])
    };
    client.barrier();

    if matched_rows == 0 {
        return Ok(Mesh::empty(&device));
    }

    workspace.reserve_matched(matched_rows)?;

    // Phase 3: pack the matched rows.
    {
        let flags = &unsafe { workspace.flags.as_host_slice() }[..num_rows_a];
        let positions = &unsafe { workspace.positions.as_host_slice() }[..num_rows_a];
        let idx_a = &unsafe { workspace.idx_a.as_host_slice() }[..num_rows_a];
        let idx_b = &unsafe { workspace.idx_b.as_host_slice() }[..num_rows_a];
        let matched_keys_buf = unsafe { workspace.matched_keys.as_host_slice_mut() };
        let matched_idx_a_buf = unsafe { workspace.matched_idx_a.as_host_slice_mut() };
        let matched_idx_b_buf = unsafe { workspace.matched_idx_b.as_host_slice_mut() };
        let matched_keys = SharedSlice::new(&mut matched_keys_buf[..matched_rows]);
        let matched_idx_a = SharedSlice::new(&mut matched_idx_a_buf[..matched_rows]);
        let matched_idx_b = SharedSlice::new(&mut matched_idx_b_buf[..matched_rows]);

        client.parallel_for(num_rows_a, |i| {
            if flags[i] == 0 {
                return;
            }
            let pos = positions[i];
            // Safety: the exclusive scan assigns flagged rows unique
            // positions.
            unsafe {
                matched_keys.write(pos, a_keys[i]);
                matched_idx_a.write(pos, idx_a[i]);
                matched_idx_b.write(pos, idx_b[i]);
            }
        });
        client.barrier();
    }

    // Phase 4: count output intervals per matched row.
    {
        let matched_idx_a = &unsafe { workspace.matched_idx_a.as_host_slice() }[..matched_rows];
        let matched_idx_b = &unsafe { workspace.matched_idx_b.as_host_slice() }[..matched_rows];
        let row_counts_buf = unsafe { workspace.row_counts.as_host_slice_mut() };
        let row_counts = SharedSlice::new(&mut row_counts_buf[..matched_rows]);

        client.parallel_for(matched_rows, |r| {
            let count = match row_ranges(matched_idx_a[r], matched_idx_b[r], a_row_ptr, b_row_ptr)
            {
                Some((range_a, range_b)) => {
                    merge_row_intervals(&a_intervals[range_a], &b_intervals[range_b], |_, _| {})
                }
                None => 0,
            };
            // Safety: each work item writes only index r.
            unsafe { row_counts.write(r, count) };
        });
        client.barrier();
    }

    // Phase 5: scan the counts into CSR offsets.
    let total_intervals = {
        let row_counts = unsafe { workspace.row_counts.as_host_slice() };
        let row_ptr = unsafe { workspace.row_ptr.as_host_slice_mut() };
        client.scan_csr_row_ptr(&row_counts[..matched_rows], &mut row_ptr[..matched_rows + 1])
    };
    client.barrier();

    if total_intervals == 0 {
        return Ok(Mesh::empty(&device));
    }

    // Phase 6: fill. One allocation at the worst-case bound, no second
    // sizing pass over the data.
    workspace.reserve_intervals(a.num_intervals() + b.num_intervals())?;
    {
        let matched_idx_a = &unsafe { workspace.matched_idx_a.as_host_slice() }[..matched_rows];
        let matched_idx_b = &unsafe { workspace.matched_idx_b.as_host_slice() }[..matched_rows];
        let row_ptr = &unsafe { workspace.row_ptr.as_host_slice() }[..matched_rows + 1];
        let intervals_buf = unsafe { workspace.intervals.as_host_slice_mut() };
        let intervals_out = SharedSlice::new(&mut intervals_buf[..total_intervals]);

        client.parallel_for(matched_rows, |r| {
            if let Some((range_a, range_b)) =
                row_ranges(matched_idx_a[r], matched_idx_b[r], a_row_ptr, b_row_ptr)
            {
                let base = row_ptr[r];
                merge_row_intervals(&a_intervals[range_a], &b_intervals[range_b], |k, overlap| {
                    // Safety: rows own disjoint offset ranges, and the fill
                    // merge emits exactly the counted intervals.
                    unsafe { intervals_out.write(base + k, overlap) };
                });
            }
        });
        client.barrier();
    }

    // Phase 7: flag rows that produced intervals and scan their final
    // positions.
    {
        let row_ptr = &unsafe { workspace.row_ptr.as_host_slice() }[..matched_rows + 1];
        let has_buf = unsafe { workspace.has_intervals.as_host_slice_mut() };
        let has_intervals = SharedSlice::new(&mut has_buf[..matched_rows]);

        client.parallel_for(matched_rows, |r| {
            // Safety: each work item writes only index r.
            unsafe { has_intervals.write(r, usize::from(row_ptr[r] < row_ptr[r + 1])) };
        });
        client.barrier();
    }

    let final_rows = {
        let has_intervals = unsafe { workspace.has_intervals.as_host_slice() };
        let new_positions = unsafe { workspace.new_positions.as_host_slice_mut() };
        client.exclusive_scan(
            &has_intervals[..matched_rows],
            &mut new_positions[..matched_rows],
        )
    };
    client.barrier();

    if final_rows == 0 {
        return Ok(Mesh::empty(&device));
    }

    // Assemble the exact-sized output mesh.
    let mut out_keys = Buffer::<RowKey, R>::zeroed(final_rows, &device)?;
    let mut out_row_ptr = Buffer::<usize, R>::zeroed(final_rows + 1, &device)?;
    let mut out_intervals = Buffer::<Interval, R>::zeroed(total_intervals, &device)?;

    if final_rows == matched_rows {
        // No empty rows: the packed arrays are already the answer.
        out_keys.copy_from_prefix(&workspace.matched_keys, matched_rows)?;
        out_row_ptr.copy_from_prefix(&workspace.row_ptr, matched_rows + 1)?;
    } else {
        // Scatter keys and offsets of the surviving rows. The intervals do
        // not move, so the absolute offsets stay correct and the first
        // surviving row's offset is 0.
        let matched_keys = &unsafe { workspace.matched_keys.as_host_slice() }[..matched_rows];
        let row_ptr = &unsafe { workspace.row_ptr.as_host_slice() }[..matched_rows + 1];
        let has_intervals = &unsafe { workspace.has_intervals.as_host_slice() }[..matched_rows];
        let new_positions = &unsafe { workspace.new_positions.as_host_slice() }[..matched_rows];
        let keys_out = SharedSlice::new(unsafe { out_keys.as_host_slice_mut() });
        let row_ptr_out = SharedSlice::new(unsafe { out_row_ptr.as_host_slice_mut() });

        client.parallel_for(matched_rows, |r| {
            if has_intervals[r] == 0 {
                return;
            }
            let pos = new_positions[r];
            // Safety: surviving rows scan to unique positions.
            unsafe {
                keys_out.write(pos, matched_keys[r]);
                row_ptr_out.write(pos, row_ptr[r]);
            }
        });
        client.barrier();

        let out_row_ptr_buf = unsafe { out_row_ptr.as_host_slice_mut() };
        out_row_ptr_buf[final_rows] = total_intervals;
    }

    out_intervals.copy_from_prefix(&workspace.intervals, total_intervals)?;
    client.barrier();

    Ok(Mesh::from_parts(out_keys, out_row_ptr, out_intervals, device))
}
