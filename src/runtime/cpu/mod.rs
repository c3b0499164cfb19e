//! CPU runtime implementation
//!
//! The CPU runtime allocates on the heap and is the reference backend for
//! the intersection pipeline. With the `rayon` feature (default), the
//! parallel primitives fan out over the global rayon pool; without it they
//! run the same kernels sequentially, with identical results.

mod parallel;

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::ops::intersect::intersect_meshes;
use crate::ops::{IntersectOps, IntersectWorkspace};
use crate::runtime::{Device, ParallelOps, Runtime, RuntimeClient};
use std::alloc::{alloc_zeroed, dealloc, Layout as AllocLayout};

/// CPU compute runtime
///
/// This is the default runtime and works on any platform.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

/// CPU device (there's only one: the host CPU)
#[derive(Clone, Debug, Default)]
pub struct CpuDevice {
    id: usize,
}

impl CpuDevice {
    /// Create a new CPU device
    pub fn new() -> Self {
        Self { id: 0 }
    }
}

impl Device for CpuDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        "cpu".to_string()
    }
}

/// CPU client for kernel dispatch
#[derive(Clone, Debug)]
pub struct CpuClient {
    device: CpuDevice,
}

impl CpuClient {
    /// Create a new CPU client
    pub fn new(device: CpuDevice) -> Self {
        Self { device }
    }
}

impl RuntimeClient<CpuRuntime> for CpuClient {
    fn device(&self) -> &CpuDevice {
        &self.device
    }

    fn synchronize(&self) {
        // CPU kernels return only after completion, nothing to wait for
    }
}

impl ParallelOps for CpuClient {
    fn parallel_for<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        parallel::parallel_for(n, f);
    }

    fn exclusive_scan(&self, counts: &[usize], prefix: &mut [usize]) -> usize {
        parallel::exclusive_scan(counts, prefix)
    }

    fn barrier(&self) {
        self.synchronize();
    }
}

impl IntersectOps<CpuRuntime> for CpuClient {
    fn intersect(&self, a: &Mesh<CpuRuntime>, b: &Mesh<CpuRuntime>) -> Result<Mesh<CpuRuntime>> {
        let mut workspace = IntersectWorkspace::new(&self.device);
        intersect_meshes(self, a, b, &mut workspace)
    }

    fn intersect_with(
        &self,
        a: &Mesh<CpuRuntime>,
        b: &Mesh<CpuRuntime>,
        workspace: &mut IntersectWorkspace<CpuRuntime>,
    ) -> Result<Mesh<CpuRuntime>> {
        intersect_meshes(self, a, b, workspace)
    }
}

// Alignment for all allocations; covers SIMD-friendly access to every
// element type the crate stores.
const ALLOC_ALIGN: usize = 64;

impl Runtime for CpuRuntime {
    type Device = CpuDevice;
    type Client = CpuClient;

    fn name() -> &'static str {
        "cpu"
    }

    fn allocate(size_bytes: usize, _device: &Self::Device) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let layout = AllocLayout::from_size_align(size_bytes, ALLOC_ALIGN)
            .map_err(|_| Error::OutOfMemory { size: size_bytes })?;
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(Error::OutOfMemory { size: size_bytes });
        }

        Ok(ptr as u64)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &Self::Device) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        // Matches the allocation layout above; from_size_align cannot fail
        // for a size that was successfully allocated.
        let layout = AllocLayout::from_size_align(size_bytes, ALLOC_ALIGN)
            .expect("invalid deallocation layout");
        unsafe {
            dealloc(ptr as *mut u8, layout);
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &Self::Device) -> Result<()> {
        if src.is_empty() || dst == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len());
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &Self::Device) -> Result<()> {
        if dst.is_empty() || src == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }

    fn copy_within_device(
        src: u64,
        dst: u64,
        size_bytes: usize,
        _device: &Self::Device,
    ) -> Result<()> {
        if size_bytes == 0 || src == 0 || dst == 0 {
            return Ok(());
        }

        unsafe {
            // Plain copy in case src and dst overlap
            std::ptr::copy(src as *const u8, dst as *mut u8, size_bytes);
        }
        Ok(())
    }

    fn default_device() -> Self::Device {
        CpuDevice::new()
    }

    fn default_client(device: &Self::Device) -> Self::Client {
        CpuClient::new(device.clone())
    }
}
