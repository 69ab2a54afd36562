use gfx_hal::{adapter::Adapter, format as f, prelude::*, pso, window, Backend};

use crate::error::{Error, Result};

pub struct Swapchain<'a, B: Backend> {
    device: &'a B::Device,
    adapter: &'a Adapter<B>,
    pub viewport: pso::Viewport,
    pub dims: window::Extent2D,
    pub surface: &'a mut B::Surface,
    pub format: f::Format,
    present_mode: window::PresentMode,
    /// Set while the surface has no usable extent and nothing was configured.
    pub stale: bool,
}

impl<'a, B: Backend> Swapchain<'a, B> {
    pub fn new(
        device: &'a B::Device,
        surface: &'a mut B::Surface,
        adapter: &'a Adapter<B>,
        dims: window::Extent2D,
        vsync: bool,
    ) -> Result<Self> {
        let caps = surface.capabilities(&adapter.physical_device);
        let formats = surface.supported_formats(&adapter.physical_device);
        let format = formats.map_or(f::Format::Rgba8Srgb, |formats| {
            formats
                .iter()
                .find(|format| format.base_format().1 == f::ChannelType::Srgb)
                .copied()
                .unwrap_or(formats[0])
        });
        let present_mode = choose_present_mode(caps.present_modes, vsync);
        log::info!("swapchain format {:?}, present mode {:?}", format, present_mode);

        let viewport = pso::Viewport {
            rect: pso::Rect {
                x: 0,
                y: 0,
                w: dims.width as _,
                h: dims.height as _,
            },
            depth: 0.0..1.0,
        };

        let mut swapchain = Swapchain {
            device,
            surface,
            adapter,
            viewport,
            format,
            dims,
            present_mode,
            stale: true,
        };

        swapchain.recreate()?;
        Ok(swapchain)
    }

    pub fn resize(&mut self, dims: window::Extent2D) -> Result<bool> {
        self.dims = dims;
        self.recreate()
    }

    /// Returns `false` when the surface is zero-sized (minimized); the old
    /// configuration and `dims` are left alone and the frame should be skipped.
    pub fn recreate(&mut self) -> Result<bool> {
        let caps = self.surface.capabilities(&self.adapter.physical_device);

        let mut swap_config = window::SwapchainConfig::from_caps(&caps, self.format, self.dims);
        swap_config.present_mode = self.present_mode;
        let extent = swap_config.extent;
        if !presentable(extent) {
            log::debug!(
                "surface is {}x{}, keeping swapchain at {}x{}",
                extent.width,
                extent.height,
                self.dims.width,
                self.dims.height
            );
            self.stale = true;
            return Ok(false);
        }
        unsafe {
            self.surface
                .configure_swapchain(&self.device, swap_config)
                .map_err(Error::gpu("configure swapchain"))?;
        }
        log::debug!("swapchain configured at {}x{}", extent.width, extent.height);

        self.dims = extent;
        self.viewport.rect.w = extent.width as _;
        self.viewport.rect.h = extent.height as _;
        self.stale = false;
        Ok(true)
    }
}

/// A swapchain can only be configured with a non-zero extent.
pub fn presentable(extent: window::Extent2D) -> bool {
    extent.width != 0 && extent.height != 0
}

/// FIFO waits for vblank and is always available.
fn choose_present_mode(available: window::PresentMode, vsync: bool) -> window::PresentMode {
    if vsync {
        return window::PresentMode::FIFO;
    }
    [window::PresentMode::MAILBOX, window::PresentMode::IMMEDIATE]
        .iter()
        .copied()
        .find(|&mode| available.contains(mode))
        .unwrap_or(window::PresentMode::FIFO)
}

impl<'a, B: Backend> Drop for Swapchain<'a, B> {
    fn drop(&mut self) {
        unsafe { self.surface.unconfigure_swapchain(&self.device) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfx_hal::window::PresentMode;

    #[test]
    fn zero_extents_are_not_presentable() {
        let extent = |width, height| window::Extent2D { width, height };
        assert!(presentable(extent(400, 400)));
        assert!(presentable(extent(1, 1)));
        assert!(!presentable(extent(0, 0)));
        assert!(!presentable(extent(0, 300)));
        assert!(!presentable(extent(300, 0)));
    }

    #[test]
    fn vsync_always_uses_fifo() {
        assert_eq!(choose_present_mode(PresentMode::all(), true), PresentMode::FIFO);
    }

    #[test]
    fn without_vsync_prefers_mailbox_then_immediate() {
        assert_eq!(
            choose_present_mode(PresentMode::all(), false),
            PresentMode::MAILBOX
        );
        assert_eq!(
            choose_present_mode(PresentMode::FIFO | PresentMode::IMMEDIATE, false),
            PresentMode::IMMEDIATE
        );
        assert_eq!(
            choose_present_mode(PresentMode::FIFO, false),
            PresentMode::FIFO
        );
    }
}
