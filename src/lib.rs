//! # meshix
//!
//! **Set-theoretic intersection of 3D sparse cell meshes, in parallel.**
//!
//! meshix stores the live cell set of a 3D domain in a compressed sparse row
//! (CSR) layout: each non-empty (y, z) row keys a sorted list of half-open
//! X-intervals. The crate computes the intersection of two such meshes with a
//! bulk-synchronous pipeline of data-parallel kernels, as a building block
//! for geometry processing and adaptive mesh refinement (AMR) workflows.
//!
//! ## Why meshix?
//!
//! - **Compact**: unions of axis-aligned intervals instead of dense voxel
//!   grids; memory scales with surface complexity, not volume
//! - **Parallel**: every phase is a data-parallel kernel over rows; the CPU
//!   backend fans out over rayon when the `rayon` feature is enabled
//! - **Backend-pluggable**: the pipeline is generic over the [`runtime`]
//!   traits; a downstream runtime with host-coherent memory reuses it as-is
//! - **Deterministic**: for fixed inputs the output is bit-identical across
//!   runs and across the serial and threaded backends
//!
//! ## Quick Start
//!
//! ```
//! use meshix::prelude::*;
//!
//! let device = CpuDevice::new();
//! let client = CpuRuntime::default_client(&device);
//!
//! // One row at (y, z) = (0, 0) carrying [0, 10) on the X axis.
//! let a = Mesh::<CpuRuntime>::from_slices(
//!     &[RowKey { y: 0, z: 0 }],
//!     &[0, 1],
//!     &[Interval { begin: 0, end: 10 }],
//!     &device,
//! )?;
//! let b = Mesh::<CpuRuntime>::from_slices(
//!     &[RowKey { y: 0, z: 0 }],
//!     &[0, 1],
//!     &[Interval { begin: 5, end: 15 }],
//!     &device,
//! )?;
//!
//! let c = client.intersect(&a, &b)?;
//! assert_eq!(c.intervals().to_vec(), vec![Interval { begin: 5, end: 10 }]);
//! # Ok::<(), meshix::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded CPU kernels; without it the CPU
//!   backend runs the same kernels sequentially

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod error;
pub mod mesh;
pub mod ops;
pub mod runtime;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::mesh::{Coord, Interval, Mesh, RowKey};
    pub use crate::ops::{IntersectOps, IntersectWorkspace};
    pub use crate::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
    pub use crate::runtime::{Device, ParallelOps, Runtime, RuntimeClient};
}

/// Default runtime: the host CPU backend
pub type DefaultRuntime = runtime::cpu::CpuRuntime;
