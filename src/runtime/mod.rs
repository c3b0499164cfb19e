//! Runtime backends for mesh computation
//!
//! This module defines the backend traits the intersection pipeline is
//! written against, and provides the CPU implementation.
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity)
//! ├── Device (identifies a specific compute unit)
//! ├── Client (dispatches kernels, owns synchronization)
//! └── ParallelOps (the bulk-synchronous primitive set)
//! ```
//!
//! The pipeline coordinates its kernels exclusively through [`ParallelOps`]:
//! `parallel_for`, `exclusive_scan`, and `barrier`, plus the runtime's
//! deep-copy operations. A backend that implements these over host-coherent
//! memory gets the whole intersection pipeline for free.

mod buffer;
pub mod cpu;
pub mod kernel;

pub use buffer::{Buffer, Element};

use crate::error::Result;

/// Core trait for compute backends
///
/// `Runtime` abstracts over different compute devices. It uses static
/// dispatch via generics for zero-cost abstraction.
///
/// # Associated Types
///
/// - `Device`: Identifies a specific compute unit
/// - `Client`: Handles kernel dispatch and synchronization
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device identifier type
    type Device: Device;

    /// Client for dispatching kernels
    type Client: RuntimeClient<Self>;

    /// Human-readable name of this runtime
    fn name() -> &'static str;

    /// Allocate zero-initialized device memory
    ///
    /// Returns a device pointer (u64) usable with the copy operations below.
    /// Fails with [`crate::error::Error::OutOfMemory`] when the allocation
    /// cannot be satisfied.
    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64>;

    /// Deallocate device memory
    fn deallocate(ptr: u64, size_bytes: usize, device: &Self::Device);

    /// Copy bytes from host memory to device memory
    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()>;

    /// Copy bytes from device memory to host memory
    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()>;

    /// Copy bytes within device memory (deep copy)
    fn copy_within_device(src: u64, dst: u64, size_bytes: usize, device: &Self::Device)
    -> Result<()>;

    /// Get the default device
    fn default_device() -> Self::Device;

    /// Get the default client for a device
    fn default_client(device: &Self::Device) -> Self::Client;
}

/// Trait for device identification
pub trait Device: Clone + Send + Sync + 'static {
    /// Unique identifier for this device
    fn id(&self) -> usize;

    /// Check if two devices are the same
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}

/// Trait for runtime clients that handle kernel dispatch
pub trait RuntimeClient<R: Runtime>: Clone + Send + Sync {
    /// Get the device this client operates on
    fn device(&self) -> &R::Device;

    /// Synchronize: wait for all pending kernels to complete
    fn synchronize(&self);
}

/// Bulk-synchronous data-parallel primitives supplied by a backend
///
/// These four operators are the only cross-thread coordination the
/// intersection pipeline uses. Work items inside one `parallel_for` execute
/// with no ordering guarantee; a [`ParallelOps::barrier`] between kernels
/// establishes happens-before for everything submitted earlier.
///
/// Kernel closures observe buffer contents through host-coherent slices, so
/// an implementing backend must make its memory host-visible (the CPU
/// backend trivially does).
pub trait ParallelOps {
    /// Execute `f(i)` for every `i` in `[0, n)`
    ///
    /// No ordering between work items. The caller is responsible for
    /// data-race freedom: distinct work items must write distinct cells.
    fn parallel_for<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Send + Sync;

    /// Exclusive prefix sum
    ///
    /// Writes `prefix[i] = counts[0] + … + counts[i-1]` (so `prefix[0] = 0`)
    /// and returns the grand total. `counts` and `prefix` must have equal
    /// length. Deterministic: equal inputs produce equal outputs regardless
    /// of worker count.
    fn exclusive_scan(&self, counts: &[usize], prefix: &mut [usize]) -> usize;

    /// Exclusive scan into a CSR offset array
    ///
    /// `row_ptr` must be one element longer than `counts`. Writes the
    /// exclusive prefix sum into `row_ptr[0..n]`, stores the total in
    /// `row_ptr[n]`, and returns it.
    fn scan_csr_row_ptr(&self, counts: &[usize], row_ptr: &mut [usize]) -> usize {
        let n = counts.len();
        debug_assert_eq!(row_ptr.len(), n + 1);
        let total = self.exclusive_scan(counts, &mut row_ptr[..n]);
        row_ptr[n] = total;
        total
    }

    /// Block until all previously submitted work is complete and its memory
    /// effects are visible
    fn barrier(&self);
}
