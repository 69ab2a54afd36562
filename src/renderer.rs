use gfx_hal::{
    adapter, buffer as b, command, image as i,
    prelude::*,
    queue::{family::QueueFamilyId, Submission},
    window, Backend,
};

use std::borrow::Borrow;
use std::iter;
use std::mem::ManuallyDrop;

mod buffer;
mod frame;
mod memory;
mod pipeline;
mod render_pass;
mod swapchain;
pub mod vertex;

use crate::error::{Error, Result};
use crate::shader::CompiledShaders;
use buffer::Buffer;
use frame::FrameSlots;
use memory::Memory;
use pipeline::{Pipeline, COLOR_BINDING, POSITION_BINDING};
use render_pass::RenderPass;
use swapchain::Swapchain;
use vertex::{Color, Position, COLORS, POSITIONS};

pub use swapchain::presentable;

const FRAMES_IN_FLIGHT: usize = 2;
const CLEAR_COLOR: [f32; 4] = [0.2, 0.2, 0.2, 0.0];

pub struct Renderer<'a, B: Backend> {
    frame: usize,
    device: &'a B::Device,
    frames: ManuallyDrop<FrameSlots<'a, B>>,
    positions: ManuallyDrop<Memory<'a, B>>,
    // one per frame in flight so a pending frame never sees new colors
    colors: Vec<Memory<'a, B>>,
    pipeline: ManuallyDrop<Pipeline<'a, B>>,
    render_pass: ManuallyDrop<RenderPass<'a, B>>,
    swapchain: ManuallyDrop<Swapchain<'a, B>>,
    pending_dims: Option<window::Extent2D>,
}

impl<'a, B> Renderer<'a, B>
where
    B: Backend,
{
    pub fn new(
        surface: &'a mut B::Surface,
        adapter: &'a adapter::Adapter<B>,
        device: &'a B::Device,
        family: QueueFamilyId,
        init_dims: window::Extent2D,
        vsync: bool,
        shaders: &CompiledShaders,
    ) -> Result<Self> {
        let memory_types = adapter.physical_device.memory_properties().memory_types;
        let limits = adapter.physical_device.limits();

        let swapchain = Swapchain::new(device, surface, adapter, init_dims, vsync)?;

        let positions = Memory::new(
            Buffer::new::<Position>(device, POSITIONS.len(), &limits)?,
            &memory_types,
        )?;
        positions.upload(&POSITIONS)?;

        let mut colors = Vec::with_capacity(FRAMES_IN_FLIGHT);
        for _ in 0..FRAMES_IN_FLIGHT {
            let memory = Memory::new(
                Buffer::new::<Color>(device, COLORS.len(), &limits)?,
                &memory_types,
            )?;
            memory.upload(&COLORS)?;
            colors.push(memory);
        }

        let render_pass = RenderPass::new(device, swapchain.format)?;
        let pipeline = Pipeline::new(device, &shaders.vertex, &shaders.fragment, &*render_pass.raw)?;
        let frames = FrameSlots::new(device, family, FRAMES_IN_FLIGHT)?;

        Ok(Renderer {
            device,
            frames: ManuallyDrop::new(frames),
            positions: ManuallyDrop::new(positions),
            colors,
            pipeline: ManuallyDrop::new(pipeline),
            render_pass: ManuallyDrop::new(render_pass),
            swapchain: ManuallyDrop::new(swapchain),
            frame: 0,
            pending_dims: None,
        })
    }

    /// Takes effect at the start of the next frame.
    pub fn request_resize(&mut self, dims: window::Extent2D) {
        self.pending_dims = Some(dims);
    }

    pub fn render(&mut self, queue: &mut B::CommandQueue, colors: &[Color; 3]) -> Result<()> {
        if let Some(dims) = self.pending_dims.take() {
            if self.swapchain.resize(dims)? {
                log::info!("resized to {}x{}", dims.width, dims.height);
            }
        }

        // nothing to draw into while the surface is zero-sized
        if self.swapchain.stale && !self.swapchain.recreate()? {
            return Ok(());
        }

        let surface_image = unsafe {
            match self.swapchain.surface.acquire_image(!0) {
                Ok((image, _)) => image,
                Err(err) => {
                    log::debug!("acquire failed ({:?}), rebuilding swapchain", err);
                    self.swapchain.recreate()?;
                    return Ok(());
                }
            }
        };

        let frame_idx = self.frame % FRAMES_IN_FLIGHT;
        let frames = &mut *self.frames;

        unsafe {
            let fence = &frames.submission_complete_fences[frame_idx];
            self.device
                .wait_for_fence(fence, !0)
                .map_err(Error::gpu("wait for fence"))?;
            self.device
                .reset_fence(fence)
                .map_err(Error::gpu("reset fence"))?;
            if let Some(framebuffer) = frames.framebuffers[frame_idx].take() {
                self.device.destroy_framebuffer(framebuffer);
            }
        }

        // the slot's previous frame is done, its color buffer is free
        self.colors[frame_idx].upload(colors)?;

        let framebuffer = unsafe {
            self.device.create_framebuffer(
                &self.render_pass.raw,
                iter::once(surface_image.borrow()),
                i::Extent {
                    width: self.swapchain.dims.width,
                    height: self.swapchain.dims.height,
                    depth: 1,
                },
            )
        }
        .map_err(Error::gpu("create framebuffer"))?;

        let cmd_buffer = &mut frames.command_buffers[frame_idx];
        unsafe {
            cmd_buffer.reset(false);
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);
            cmd_buffer.set_viewports(0, &[self.swapchain.viewport.clone()]);
            cmd_buffer.set_scissors(0, &[self.swapchain.viewport.rect]);
            cmd_buffer.bind_graphics_pipeline(&self.pipeline.pipeline);
            cmd_buffer.bind_vertex_buffers(
                POSITION_BINDING,
                iter::once((&*self.positions.buffer.buf, b::SubRange::WHOLE)),
            );
            cmd_buffer.bind_vertex_buffers(
                COLOR_BINDING,
                iter::once((&*self.colors[frame_idx].buffer.buf, b::SubRange::WHOLE)),
            );
            cmd_buffer.begin_render_pass(
                &self.render_pass.raw,
                &framebuffer,
                self.swapchain.viewport.rect,
                &[command::ClearValue {
                    color: command::ClearColor {
                        float32: CLEAR_COLOR,
                    },
                }],
                command::SubpassContents::Inline,
            );
            cmd_buffer.draw(0..3, 0..1);
            cmd_buffer.end_render_pass();
            cmd_buffer.finish();

            let submission = Submission {
                command_buffers: iter::once(&*cmd_buffer),
                wait_semaphores: None,
                signal_semaphores: iter::once(&frames.submission_complete_semaphores[frame_idx]),
            };

            queue.submit(
                submission,
                Some(&frames.submission_complete_fences[frame_idx]),
            );

            let result = queue.present_surface(
                &mut self.swapchain.surface,
                surface_image,
                Some(&frames.submission_complete_semaphores[frame_idx]),
            );

            frames.framebuffers[frame_idx] = Some(framebuffer);

            if let Err(err) = result {
                log::debug!("present failed ({:?}), rebuilding swapchain", err);
                self.swapchain.recreate()?;
            }
        }

        self.frame += 1;
        Ok(())
    }
}

impl<'a, B: Backend> Drop for Renderer<'a, B> {
    fn drop(&mut self) {
        if let Err(err) = self.device.wait_idle() {
            log::error!("device did not go idle before teardown: {:?}", err);
        }
        unsafe {
            // framebuffers and pipeline go before the render pass they use
            ManuallyDrop::drop(&mut self.frames);
            self.colors.clear();
            ManuallyDrop::drop(&mut self.positions);
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.swapchain);
        }
        log::info!("renderer released after {} frames", self.frame);
    }
}
