use fps_counter::FPSCounter;
use gfx_hal::{adapter::Adapter, queue::family::QueueFamilyId, window, Backend};

use crate::animation::ColorAnimation;
use crate::config::Config;
use crate::error::Result;
use crate::renderer::{presentable, Renderer};
use crate::shader::CompiledShaders;

/// The windowed application: load, resize, update, render, unload.
pub struct Game<'a, B: Backend> {
    renderer: Renderer<'a, B>,
    animation: ColorAnimation,
    fps_counter: FPSCounter,
}

impl<'a, B: Backend> Game<'a, B> {
    pub fn load(
        surface: &'a mut B::Surface,
        adapter: &'a Adapter<B>,
        device: &'a B::Device,
        family: QueueFamilyId,
        config: &Config,
    ) -> Result<Self> {
        let shaders = CompiledShaders::load(&config.shader_dir)?;
        let renderer = Renderer::new(
            surface,
            adapter,
            device,
            family,
            config.extent(),
            config.vsync(),
            &shaders,
        )?;
        log::info!("loaded");

        Ok(Game {
            renderer,
            animation: ColorAnimation::new(config.color_step),
            fps_counter: FPSCounter::new(),
        })
    }

    pub fn resize(&mut self, dims: window::Extent2D) {
        // minimized windows report 0x0
        if !presentable(dims) {
            log::debug!("ignoring resize to {}x{}", dims.width, dims.height);
            return;
        }
        self.renderer.request_resize(dims);
    }

    pub fn update(&mut self) {
        log::trace!("fps: {}", self.fps_counter.tick());
    }

    /// Draws the current colors; the animation steps after they are taken.
    pub fn render(&mut self, queue: &mut B::CommandQueue) -> Result<()> {
        let colors = self.animation.advance();
        self.renderer.render(queue, &colors)
    }

    pub fn unload(self) {
        log::info!("unloading");
    }
}
