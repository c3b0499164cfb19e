//! Randomized invariant tests
//!
//! Meshes are generated from a seeded RNG and the intersection is checked
//! against a naïve point-set oracle: a cell belongs to the output iff it
//! belongs to both inputs. All runs are deterministic.

use meshix::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

/// (y, z, x), ordered the same way the mesh orders rows and intervals
type Cell = (i32, i32, i32);

type Parts = (Vec<RowKey>, Vec<usize>, Vec<Interval>);

fn mesh_parts(mesh: &Mesh<CpuRuntime>) -> Parts {
    (
        mesh.row_keys().to_vec(),
        mesh.row_ptr().to_vec(),
        mesh.intervals().to_vec(),
    )
}

fn cells_of(mesh: &Mesh<CpuRuntime>) -> BTreeSet<Cell> {
    let (keys, row_ptr, intervals) = mesh_parts(mesh);
    let mut cells = BTreeSet::new();
    for (row, k) in keys.iter().enumerate() {
        for interval in &intervals[row_ptr[row]..row_ptr[row + 1]] {
            for x in interval.begin..interval.end {
                cells.insert((k.y, k.z, x));
            }
        }
    }
    cells
}

/// Rebuild the canonical CSR triplet from a cell set
///
/// Consecutive X cells coalesce into maximal intervals, so this is the
/// canonical form the intersection must produce.
fn canonical_parts(cells: &BTreeSet<Cell>) -> Parts {
    let mut keys: Vec<RowKey> = Vec::new();
    let mut row_ptr = vec![0usize];
    let mut intervals: Vec<Interval> = Vec::new();

    for &(y, z, x) in cells {
        let k = RowKey { y, z };
        if keys.last() == Some(&k) {
            let last = intervals.last_mut().unwrap();
            if x == last.end {
                last.end = x + 1;
                continue;
            }
        } else {
            if !keys.is_empty() {
                row_ptr.push(intervals.len());
            }
            keys.push(k);
        }
        intervals.push(Interval { begin: x, end: x + 1 });
    }
    if keys.is_empty() {
        return (Vec::new(), Vec::new(), Vec::new());
    }
    row_ptr.push(intervals.len());
    (keys, row_ptr, intervals)
}

fn random_mesh(rng: &mut StdRng) -> Mesh<CpuRuntime> {
    let device = CpuDevice::new();
    let mut keys = Vec::new();
    let mut row_ptr = vec![0usize];
    let mut intervals = Vec::new();

    for y in -4i32..4 {
        for z in -2i32..2 {
            if !rng.random_bool(0.45) {
                continue;
            }
            keys.push(RowKey { y, z });
            let runs = rng.random_range(1..5);
            let mut x = rng.random_range(-20i32..-10);
            for _ in 0..runs {
                // A gap of at least one cell keeps rows canonical.
                let begin = x + rng.random_range(1..5);
                let end = begin + rng.random_range(1..6);
                intervals.push(Interval { begin, end });
                x = end;
            }
            row_ptr.push(intervals.len());
        }
    }

    Mesh::from_slices(&keys, &row_ptr, &intervals, &device).expect("generated mesh is valid")
}

fn client() -> CpuClient {
    CpuRuntime::default_client(&CpuDevice::new())
}

/// Reference two-pointer merge, reimplemented independently of the crate
fn reference_row_merge(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut out = Vec::new();
    let (mut ia, mut ib) = (0, 0);
    while ia < a.len() && ib < b.len() {
        let begin = a[ia].begin.max(b[ib].begin);
        let end = a[ia].end.min(b[ib].end);
        if begin < end {
            out.push(Interval { begin, end });
        }
        let (end_a, end_b) = (a[ia].end, b[ib].end);
        if end_a <= end_b {
            ia += 1;
        }
        if end_b <= end_a {
            ib += 1;
        }
    }
    out
}

#[test]
fn output_matches_point_set_oracle() {
    let client = client();
    for seed in 0..60u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = random_mesh(&mut rng);
        let b = random_mesh(&mut rng);

        let c = client.intersect(&a, &b).unwrap();
        c.validate().unwrap();

        let expected: BTreeSet<Cell> = cells_of(&a).intersection(&cells_of(&b)).copied().collect();
        assert_eq!(cells_of(&c), expected, "seed {seed}: wrong cell set");

        // The output is not merely the right set of cells, it is the
        // canonical CSR encoding of that set.
        assert_eq!(mesh_parts(&c), canonical_parts(&expected), "seed {seed}");
    }
}

#[test]
fn output_has_no_empty_rows_and_no_touching_intervals() {
    let client = client();
    for seed in 0..60u64 {
        let mut rng = StdRng::seed_from_u64(1000 + seed);
        let a = random_mesh(&mut rng);
        let b = random_mesh(&mut rng);
        let c = client.intersect(&a, &b).unwrap();

        let (keys, row_ptr, intervals) = mesh_parts(&c);
        for row in 0..keys.len() {
            assert!(row_ptr[row] < row_ptr[row + 1], "seed {seed}: empty row {row}");
            for i in row_ptr[row] + 1..row_ptr[row + 1] {
                assert!(
                    intervals[i - 1].end < intervals[i].begin,
                    "seed {seed}: touching intervals in row {row}"
                );
            }
        }
        for interval in &intervals {
            assert!(interval.begin < interval.end, "seed {seed}: empty interval");
        }
    }
}

#[test]
fn commutativity() {
    let client = client();
    for seed in 0..40u64 {
        let mut rng = StdRng::seed_from_u64(2000 + seed);
        let a = random_mesh(&mut rng);
        let b = random_mesh(&mut rng);

        let ab = client.intersect(&a, &b).unwrap();
        let ba = client.intersect(&b, &a).unwrap();
        assert_eq!(mesh_parts(&ab), mesh_parts(&ba), "seed {seed}");
    }
}

#[test]
fn idempotence() {
    let client = client();
    for seed in 0..40u64 {
        let mut rng = StdRng::seed_from_u64(3000 + seed);
        let a = random_mesh(&mut rng);
        let aa = client.intersect(&a, &a).unwrap();
        assert_eq!(mesh_parts(&aa), mesh_parts(&a), "seed {seed}");
    }
}

#[test]
fn empty_mesh_absorbs() {
    let client = client();
    let device = CpuDevice::new();
    let empty = Mesh::<CpuRuntime>::empty(&device);
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(4000 + seed);
        let a = random_mesh(&mut rng);

        assert!(client.intersect(&a, &empty).unwrap().is_empty());
        assert!(client.intersect(&empty, &a).unwrap().is_empty());
    }
}

#[test]
fn output_size_is_bounded_and_keys_are_common() {
    let client = client();
    for seed in 0..40u64 {
        let mut rng = StdRng::seed_from_u64(5000 + seed);
        let a = random_mesh(&mut rng);
        let b = random_mesh(&mut rng);
        let c = client.intersect(&a, &b).unwrap();

        assert!(
            c.num_intervals() <= a.num_intervals() + b.num_intervals(),
            "seed {seed}: output exceeds worst-case bound"
        );

        let a_keys: BTreeSet<RowKey> = a.row_keys().to_vec().into_iter().collect();
        let b_keys: BTreeSet<RowKey> = b.row_keys().to_vec().into_iter().collect();
        for k in c.row_keys().to_vec() {
            assert!(
                a_keys.contains(&k) && b_keys.contains(&k),
                "seed {seed}: output key not common to both inputs"
            );
        }
    }
}

#[test]
fn rows_match_sequential_reference_merge() {
    let client = client();
    for seed in 0..40u64 {
        let mut rng = StdRng::seed_from_u64(6000 + seed);
        let a = random_mesh(&mut rng);
        let b = random_mesh(&mut rng);
        let c = client.intersect(&a, &b).unwrap();

        let (a_keys, a_ptr, a_iv) = mesh_parts(&a);
        let (b_keys, b_ptr, b_iv) = mesh_parts(&b);
        let (c_keys, c_ptr, c_iv) = mesh_parts(&c);

        for (row, k) in c_keys.iter().enumerate() {
            let ia = a_keys.binary_search(k).expect("output key exists in A");
            let ib = b_keys.binary_search(k).expect("output key exists in B");
            let expected = reference_row_merge(
                &a_iv[a_ptr[ia]..a_ptr[ia + 1]],
                &b_iv[b_ptr[ib]..b_ptr[ib + 1]],
            );
            assert_eq!(
                &c_iv[c_ptr[row]..c_ptr[row + 1]],
                expected.as_slice(),
                "seed {seed}: row {row} differs from reference merge"
            );
        }
    }
}

#[test]
fn workspace_reuse_is_deterministic() {
    let client = client();
    let device = CpuDevice::new();
    let mut workspace = IntersectWorkspace::new(&device);

    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(7000 + seed);
        let a = random_mesh(&mut rng);
        let b = random_mesh(&mut rng);

        let fresh = client.intersect(&a, &b).unwrap();
        let reused_once = client.intersect_with(&a, &b, &mut workspace).unwrap();
        let reused_twice = client.intersect_with(&a, &b, &mut workspace).unwrap();

        assert_eq!(mesh_parts(&fresh), mesh_parts(&reused_once), "seed {seed}");
        assert_eq!(mesh_parts(&reused_once), mesh_parts(&reused_twice), "seed {seed}");
    }
}
