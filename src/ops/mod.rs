//! Mesh operations
//!
//! Operations are exposed as traits on a backend's client, the same way the
//! runtime's kernels are dispatched. The generic pipeline behind them lives
//! in [`intersect`] and is reusable by any backend whose client implements
//! the parallel primitives.

pub mod intersect;

pub use self::intersect::IntersectWorkspace;

use crate::error::Result;
use crate::mesh::Mesh;
use crate::runtime::Runtime;

/// Mesh intersection on a backend client
///
/// `intersect(A, B)` returns the canonical mesh covering exactly the cells
/// present in both inputs:
///
/// - **Pure**: `A` and `B` are read-only; the result shares no storage with
///   them.
/// - **Canonical**: the result satisfies every mesh invariant and contains
///   no empty rows.
/// - **Deterministic**: for fixed inputs the result is bit-identical across
///   runs and worker counts.
/// - **Errors**: allocation failure and device mismatch are reported;
///   invariant-violating inputs are rejected in debug builds. Any failure
///   aborts the call and releases partial output.
pub trait IntersectOps<R: Runtime> {
    /// Intersect two meshes, allocating scratch per call
    fn intersect(&self, a: &Mesh<R>, b: &Mesh<R>) -> Result<Mesh<R>>;

    /// Intersect two meshes, reusing scratch held by `workspace`
    ///
    /// The workspace must not be shared between concurrent calls; it grows
    /// to fit and amortizes allocation across repeated intersections.
    fn intersect_with(
        &self,
        a: &Mesh<R>,
        b: &Mesh<R>,
        workspace: &mut IntersectWorkspace<R>,
    ) -> Result<Mesh<R>>;
}
