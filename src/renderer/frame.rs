use gfx_hal::{command, pool, prelude::*, queue::family::QueueFamilyId, Backend};
use std::mem::ManuallyDrop;
use std::ptr;

use crate::error::{Error, Result};

/// Per-frame-in-flight command buffers, sync objects and framebuffers.
///
/// Slots are pushed one at a time, so a failure part way through still
/// releases whatever was created through `Drop`.
pub struct FrameSlots<'a, B: Backend> {
    device: &'a B::Device,
    command_pool: ManuallyDrop<B::CommandPool>,
    pub command_buffers: Vec<B::CommandBuffer>,
    pub submission_complete_semaphores: Vec<B::Semaphore>,
    pub submission_complete_fences: Vec<B::Fence>,
    pub framebuffers: Vec<Option<B::Framebuffer>>,
}

impl<'a, B: Backend> FrameSlots<'a, B> {
    pub fn new(device: &'a B::Device, family: QueueFamilyId, count: usize) -> Result<Self> {
        // each slot resets its own buffer once its fence has signalled
        let command_pool = unsafe {
            device.create_command_pool(family, pool::CommandPoolCreateFlags::RESET_INDIVIDUAL)
        }
        .map_err(Error::gpu("create command pool"))?;

        let mut slots: Self = FrameSlots {
            device,
            command_pool: ManuallyDrop::new(command_pool),
            command_buffers: Vec::with_capacity(count),
            submission_complete_semaphores: Vec::with_capacity(count),
            submission_complete_fences: Vec::with_capacity(count),
            framebuffers: Vec::with_capacity(count),
        };

        for _ in 0..count {
            let cmd_buffer = unsafe { slots.command_pool.allocate_one(command::Level::Primary) };
            slots.command_buffers.push(cmd_buffer);
            slots.submission_complete_semaphores.push(
                device
                    .create_semaphore()
                    .map_err(Error::gpu("create semaphore"))?,
            );
            slots
                .submission_complete_fences
                .push(device.create_fence(true).map_err(Error::gpu("create fence"))?);
            slots.framebuffers.push(None);
        }

        Ok(slots)
    }
}

impl<'a, B: Backend> Drop for FrameSlots<'a, B> {
    fn drop(&mut self) {
        let device = self.device;
        unsafe {
            for framebuffer in self.framebuffers.drain(..).flatten() {
                device.destroy_framebuffer(framebuffer);
            }
            for s in self.submission_complete_semaphores.drain(..) {
                device.destroy_semaphore(s);
            }
            for f in self.submission_complete_fences.drain(..) {
                device.destroy_fence(f);
            }
            let mut command_pool = ManuallyDrop::into_inner(ptr::read(&self.command_pool));
            command_pool.free(self.command_buffers.drain(..));
            device.destroy_command_pool(command_pool);
        }
    }
}
