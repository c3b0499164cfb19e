//! Typed device buffers
//!
//! [`Buffer`] is the owned storage unit for mesh data: an exactly-sized,
//! device-resident array of a plain-old-data element type. All host↔device
//! traffic goes through byte slices via `bytemuck`.

use crate::error::Result;
use crate::runtime::Runtime;
use std::marker::PhantomData;

/// Marker trait for element types storable in a [`Buffer`]
///
/// Implemented for the index and geometry types the crate stores. The
/// `bytemuck::Pod` bound makes the byte-level host↔device copies safe.
pub trait Element: bytemuck::Pod + Send + Sync + 'static {}

impl Element for i32 {}
impl Element for i64 {}
impl Element for u32 {}
impl Element for u64 {}
impl Element for usize {}

/// Owned, exactly-sized device storage for `len` elements of `T`
///
/// Unlike a host `Vec`, the backing memory lives wherever the runtime `R`
/// allocates; host access goes through [`Buffer::to_vec`] or, for
/// host-coherent runtimes, the unsafe slice views used by kernels. Memory is
/// released on drop.
pub struct Buffer<T: Element, R: Runtime> {
    /// Raw device pointer (CPU ptr cast to u64 on the host backend)
    ptr: u64,
    len: usize,
    device: R::Device,
    _marker: PhantomData<T>,
}

impl<T: Element, R: Runtime> Buffer<T, R> {
    /// An empty buffer (no allocation)
    pub fn new_empty(device: &R::Device) -> Self {
        Self {
            ptr: 0,
            len: 0,
            device: device.clone(),
            _marker: PhantomData,
        }
    }

    /// Allocate a zero-initialized buffer of `len` elements
    pub fn zeroed(len: usize, device: &R::Device) -> Result<Self> {
        if len == 0 {
            return Ok(Self::new_empty(device));
        }
        let ptr = R::allocate(len * std::mem::size_of::<T>(), device)?;
        Ok(Self {
            ptr,
            len,
            device: device.clone(),
            _marker: PhantomData,
        })
    }

    /// Allocate a buffer and copy `data` into it
    pub fn from_slice(data: &[T], device: &R::Device) -> Result<Self> {
        let buf = Self::zeroed(data.len(), device)?;
        if !data.is_empty() {
            R::copy_to_device(bytemuck::cast_slice(data), buf.ptr, device)?;
        }
        Ok(buf)
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw device pointer
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// Device this buffer lives on
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.device
    }

    /// Copy the buffer contents to a host `Vec`
    ///
    /// The destination is allocated with the alignment of `T` and cast to
    /// bytes for the copy, so stricter-aligned element types are safe.
    /// A failing device-to-host copy is fatal.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = vec![T::zeroed(); self.len];
        if self.len > 0 {
            R::copy_from_device(self.ptr, bytemuck::cast_slice_mut(&mut out), &self.device)
                .expect("copy_from_device failed in to_vec()");
        }
        out
    }

    /// Deep-copy the first `len` elements of `src` into this buffer
    ///
    /// Both buffers must hold at least `len` elements and live on the same
    /// device.
    pub fn copy_from_prefix(&mut self, src: &Buffer<T, R>, len: usize) -> Result<()> {
        debug_assert!(len <= src.len && len <= self.len);
        if len == 0 {
            return Ok(());
        }
        R::copy_within_device(
            src.ptr,
            self.ptr,
            len * std::mem::size_of::<T>(),
            &self.device,
        )
    }

    /// View the buffer as a host slice
    ///
    /// # Safety
    ///
    /// The runtime must store this buffer in host-coherent memory (true for
    /// [`crate::runtime::cpu::CpuRuntime`]), and no mutable access may alias
    /// the returned slice for its lifetime.
    pub unsafe fn as_host_slice(&self) -> &[T] {
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr as *const T, self.len) }
    }

    /// View the buffer as a mutable host slice
    ///
    /// # Safety
    ///
    /// Same requirements as [`Buffer::as_host_slice`], with exclusive access
    /// guaranteed by the `&mut self` receiver.
    pub unsafe fn as_host_slice_mut(&mut self) -> &mut [T] {
        if self.len == 0 {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.ptr as *mut T, self.len) }
    }
}

impl<T: Element, R: Runtime> Drop for Buffer<T, R> {
    fn drop(&mut self) {
        if self.ptr != 0 {
            R::deallocate(self.ptr, self.len * std::mem::size_of::<T>(), &self.device);
        }
    }
}

impl<T: Element, R: Runtime> std::fmt::Debug for Buffer<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &format_args!("0x{:x}", self.ptr))
            .field("len", &self.len)
            .finish()
    }
}

// The pointer is uniquely owned and the element type is Pod, so a Buffer can
// move between threads and be read from several.
unsafe impl<T: Element, R: Runtime> Send for Buffer<T, R> {}
unsafe impl<T: Element, R: Runtime> Sync for Buffer<T, R> {}
