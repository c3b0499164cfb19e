//! Conversion between memory spaces

use crate::error::Result;
use crate::mesh::Mesh;
use crate::runtime::{Buffer, Runtime};

impl<R: Runtime> Mesh<R> {
    /// Copy this mesh into the memory space of another runtime
    ///
    /// This is the single cross-space transfer: every buffer is staged
    /// through the host and re-uploaded to `device`. Converting an empty
    /// mesh performs no allocation.
    pub fn to_runtime<T: Runtime>(&self, device: &T::Device) -> Result<Mesh<T>> {
        if self.is_empty() {
            return Ok(Mesh::empty(device));
        }

        Ok(Mesh::from_parts(
            Buffer::from_slice(&self.row_keys().to_vec(), device)?,
            Buffer::from_slice(&self.row_ptr().to_vec(), device)?,
            Buffer::from_slice(&self.intervals().to_vec(), device)?,
            device.clone(),
        ))
    }
}
