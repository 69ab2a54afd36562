use gfx_hal::{adapter::MemoryType, memory as m, prelude::*, Backend, MemoryTypeId};
use std::iter;
use std::mem::{self, ManuallyDrop};
use std::ptr;

use super::buffer::Buffer;
use crate::error::{Error, Result};

/// A vertex buffer bound to CPU-visible memory.
pub struct Memory<'a, B: Backend> {
    pub buffer: ManuallyDrop<Buffer<'a, B>>,
    memory: ManuallyDrop<B::Memory>,
}

impl<'a, B: Backend> Memory<'a, B> {
    pub fn new(mut buffer: Buffer<'a, B>, memory_types: &[MemoryType]) -> Result<Self> {
        let memory = Self::allocate_gpu_memory(&mut buffer, memory_types)?;
        Ok(Memory {
            buffer: ManuallyDrop::new(buffer),
            memory,
        })
    }

    fn allocate_gpu_memory(
        buffer: &mut Buffer<'a, B>,
        memory_types: &[MemoryType],
    ) -> Result<ManuallyDrop<B::Memory>> {
        let device = buffer.device;
        unsafe {
            let buffer_req = device.get_buffer_requirements(&buffer.buf);
            let upload_type = upload_type(memory_types, &buffer_req)?;
            let memory = device
                .allocate_memory(upload_type, buffer_req.size)
                .map_err(Error::gpu("allocate buffer memory"))?;
            if let Err(err) = device.bind_buffer_memory(&memory, 0, &mut buffer.buf) {
                device.free_memory(memory);
                return Err(Error::gpu("bind buffer memory")(err));
            }
            Ok(ManuallyDrop::new(memory))
        }
    }

    /// Copies `data` to the start of the buffer.
    pub fn upload<T: Copy>(&self, data: &[T]) -> Result<()> {
        let len = (data.len() * mem::size_of::<T>()) as u64;
        check_upload(len, self.buffer.len)?;

        let device = self.buffer.device;
        unsafe {
            let mapping = device
                .map_memory(&self.memory, m::Segment::ALL)
                .map_err(Error::gpu("map buffer memory"))?;
            ptr::copy_nonoverlapping(data.as_ptr() as *const u8, mapping, len as usize);
            let flushed =
                device.flush_mapped_memory_ranges(iter::once((&*self.memory, m::Segment::ALL)));
            device.unmap_memory(&self.memory);
            flushed.map_err(Error::gpu("flush buffer memory"))?;
        }
        Ok(())
    }
}

fn check_upload(len: u64, capacity: u64) -> Result<()> {
    if len > capacity {
        return Err(Error::UploadOverflow { len, capacity });
    }
    Ok(())
}

fn upload_type(properties: &[MemoryType], buffer_req: &m::Requirements) -> Result<MemoryTypeId> {
    properties
        .iter()
        .enumerate()
        .position(|(id, mem_type)| {
            buffer_req.type_mask & (1 << id) != 0
                && mem_type.properties.contains(m::Properties::CPU_VISIBLE)
        })
        .map(MemoryTypeId::from)
        .ok_or(Error::NoMemoryType)
}

impl<'a, B: Backend> Drop for Memory<'a, B> {
    fn drop(&mut self) {
        unsafe {
            let device = self.buffer.device;
            ManuallyDrop::drop(&mut self.buffer);
            device.free_memory(ManuallyDrop::into_inner(ptr::read(&self.memory)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_type(properties: m::Properties) -> MemoryType {
        MemoryType {
            properties,
            heap_index: 0,
        }
    }

    #[test]
    fn picks_first_cpu_visible_type_allowed_by_mask() {
        let types = [
            memory_type(m::Properties::DEVICE_LOCAL),
            memory_type(m::Properties::CPU_VISIBLE | m::Properties::COHERENT),
            memory_type(m::Properties::CPU_VISIBLE),
        ];
        let req = m::Requirements {
            size: 64,
            alignment: 16,
            type_mask: 0b101,
        };
        assert_eq!(upload_type(&types, &req).unwrap(), MemoryTypeId(2));
    }

    #[test]
    fn upload_fits_up_to_capacity() {
        assert!(check_upload(48, 48).is_ok());
        assert!(check_upload(0, 48).is_ok());
        match check_upload(49, 48) {
            Err(Error::UploadOverflow { len, capacity }) => {
                assert_eq!((len, capacity), (49, 48));
            }
            other => panic!("expected UploadOverflow, got {:?}", other),
        }
    }

    #[test]
    fn no_visible_type_is_an_error() {
        let types = [memory_type(m::Properties::DEVICE_LOCAL)];
        let req = m::Requirements {
            size: 64,
            alignment: 16,
            type_mask: 0b1,
        };
        assert!(matches!(
            upload_type(&types, &req),
            Err(Error::NoMemoryType)
        ));
    }
}
