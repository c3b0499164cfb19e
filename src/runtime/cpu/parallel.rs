//! CPU realizations of the parallel primitives
//!
//! Each primitive has a rayon path and a sequential fallback selected by the
//! `rayon` feature. Both paths are deterministic and produce identical
//! results; the scan is two-pass chunked so worker count never affects the
//! output.

/// Minimum work items a rayon task should own; keeps per-row kernels from
/// splintering into tasks smaller than their scheduling cost.
#[cfg(feature = "rayon")]
const PAR_MIN_LEN: usize = 64;

/// Below this length a chunked scan costs more than it saves.
#[cfg(feature = "rayon")]
const SCAN_CHUNK: usize = 4096;

#[cfg(feature = "rayon")]
pub(super) fn parallel_for<F>(n: usize, f: F)
where
    F: Fn(usize) + Send + Sync,
{
    use rayon::prelude::*;

    (0..n).into_par_iter().with_min_len(PAR_MIN_LEN).for_each(f);
}

#[cfg(not(feature = "rayon"))]
pub(super) fn parallel_for<F>(n: usize, f: F)
where
    F: Fn(usize) + Send + Sync,
{
    for i in 0..n {
        f(i);
    }
}

/// Sequential exclusive scan; also the tail path of the chunked scan
fn exclusive_scan_serial(counts: &[usize], prefix: &mut [usize]) -> usize {
    let mut acc = 0usize;
    for (p, &c) in prefix.iter_mut().zip(counts) {
        *p = acc;
        acc += c;
    }
    acc
}

#[cfg(feature = "rayon")]
pub(super) fn exclusive_scan(counts: &[usize], prefix: &mut [usize]) -> usize {
    use rayon::prelude::*;

    debug_assert_eq!(counts.len(), prefix.len());
    if counts.len() < SCAN_CHUNK {
        return exclusive_scan_serial(counts, prefix);
    }

    // Pass 1: per-chunk totals.
    let chunk_sums: Vec<usize> = counts
        .par_chunks(SCAN_CHUNK)
        .map(|chunk| chunk.iter().sum())
        .collect();

    // Exclusive scan of the (small) chunk totals.
    let mut chunk_offsets = vec![0usize; chunk_sums.len()];
    let total = exclusive_scan_serial(&chunk_sums, &mut chunk_offsets);

    // Pass 2: local scan per chunk seeded with its offset.
    prefix
        .par_chunks_mut(SCAN_CHUNK)
        .zip(counts.par_chunks(SCAN_CHUNK))
        .zip(chunk_offsets.par_iter())
        .for_each(|((prefix_chunk, count_chunk), &base)| {
            let mut acc = base;
            for (p, &c) in prefix_chunk.iter_mut().zip(count_chunk) {
                *p = acc;
                acc += c;
            }
        });

    total
}

#[cfg(not(feature = "rayon"))]
pub(super) fn exclusive_scan(counts: &[usize], prefix: &mut [usize]) -> usize {
    debug_assert_eq!(counts.len(), prefix.len());
    exclusive_scan_serial(counts, prefix)
}
