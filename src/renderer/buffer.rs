use gfx_hal::{buffer, prelude::*, Backend, Limits};
use std::mem::{self, ManuallyDrop};
use std::ptr;

use crate::error::{Error, Result};

pub struct Buffer<'a, B: Backend> {
    pub device: &'a B::Device,
    pub buf: ManuallyDrop<B::Buffer>,
    pub len: u64,
}

impl<'a, B: Backend> Buffer<'a, B> {
    /// Vertex buffer with room for `count` elements of `T`.
    pub fn new<T>(device: &'a B::Device, count: usize, limits: &Limits) -> Result<Self> {
        let buffer_len = count as u64 * mem::size_of::<T>() as u64;
        assert_ne!(buffer_len, 0);
        let memory_size = padded_size(buffer_len, limits.non_coherent_atom_size as u64);

        let buf = unsafe { device.create_buffer(memory_size, buffer::Usage::VERTEX) }
            .map_err(Error::gpu("create vertex buffer"))?;

        Ok(Buffer {
            device,
            buf: ManuallyDrop::new(buf),
            len: buffer_len,
        })
    }
}

fn padded_size(len: u64, atom: u64) -> u64 {
    let atom = atom.max(1);
    ((len + atom - 1) / atom) * atom
}

impl<'a, B: Backend> Drop for Buffer<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_buffer(ManuallyDrop::into_inner(ptr::read(&self.buf)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::padded_size;

    #[test]
    fn rounds_up_to_atom() {
        assert_eq!(padded_size(48, 64), 64);
        assert_eq!(padded_size(64, 64), 64);
        assert_eq!(padded_size(65, 64), 128);
        assert_eq!(padded_size(24, 1), 24);
    }

    #[test]
    fn zero_atom_is_unaligned() {
        assert_eq!(padded_size(24, 0), 24);
    }
}
