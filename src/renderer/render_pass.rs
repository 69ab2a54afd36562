use gfx_hal::{format as f, image as i, pass, prelude::*, Backend};
use std::mem::ManuallyDrop;
use std::ptr;

use crate::error::{Error, Result};

/// Single color attachment, cleared on load and presented afterwards.
pub struct RenderPass<'a, B: Backend> {
    device: &'a B::Device,
    pub raw: ManuallyDrop<B::RenderPass>,
}

impl<'a, B: Backend> RenderPass<'a, B> {
    pub fn new(device: &'a B::Device, format: f::Format) -> Result<Self> {
        let attachment = pass::Attachment {
            format: Some(format),
            samples: 1,
            ops: pass::AttachmentOps::new(
                pass::AttachmentLoadOp::Clear,
                pass::AttachmentStoreOp::Store,
            ),
            stencil_ops: pass::AttachmentOps::DONT_CARE,
            layouts: i::Layout::Undefined..i::Layout::Present,
        };

        let subpass = pass::SubpassDesc {
            colors: &[(0, i::Layout::ColorAttachmentOptimal)],
            depth_stencil: None,
            inputs: &[],
            resolves: &[],
            preserves: &[],
        };

        let raw = unsafe { device.create_render_pass(&[attachment], &[subpass], &[]) }
            .map_err(Error::gpu("create render pass"))?;

        Ok(RenderPass {
            device,
            raw: ManuallyDrop::new(raw),
        })
    }
}

impl<'a, B: Backend> Drop for RenderPass<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_render_pass(ManuallyDrop::into_inner(ptr::read(&self.raw)))
        }
    }
}
