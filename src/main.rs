#[cfg(feature = "metal")]
use gfx_backend_metal as back;

#[cfg(feature = "vulkan")]
use gfx_backend_vulkan as back;

mod animation;
mod config;
mod error;
mod game;
mod renderer;
mod shader;

use anyhow::Context;
use clap::Parser;
use config::Config;
use error::Error;
use game::Game;

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use gfx_hal::{adapter::Adapter, prelude::*, window, Backend, Features};

/// Posted by the render thread when it stops.
#[derive(Debug)]
enum RenderEvent {
    Exited,
}

type PendingResize = Arc<Mutex<Option<window::Extent2D>>>;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::parse();
    if let Err(err) = config.validate() {
        fatal(&anyhow::Error::new(err));
    }

    let event_loop = winit::event_loop::EventLoop::<RenderEvent>::with_user_event();
    let wb = winit::window::WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(winit::dpi::Size::Physical(winit::dpi::PhysicalSize::new(
            config.width,
            config.height,
        )))
        .with_min_inner_size(winit::dpi::Size::Logical(winit::dpi::LogicalSize::new(
            64.0, 64.0,
        )));
    let window = wb.build(&event_loop).context("failed to create window")?;

    let window_should_close = Arc::new(AtomicBool::new(false));
    let resized: PendingResize = Arc::new(Mutex::new(None));

    let proxy = event_loop.create_proxy();
    let should_close = Arc::clone(&window_should_close);
    let pending = Arc::clone(&resized);
    let handler = thread::spawn(move || {
        let result = run(window, &config, &should_close, &pending);
        let _ = proxy.send_event(RenderEvent::Exited);
        result
    });

    let mut handler = Some(handler);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = winit::event_loop::ControlFlow::Wait;
        match event {
            winit::event::Event::WindowEvent { event, .. } => match event {
                winit::event::WindowEvent::CloseRequested
                | winit::event::WindowEvent::KeyboardInput {
                    input:
                        winit::event::KeyboardInput {
                            virtual_keycode: Some(winit::event::VirtualKeyCode::Escape),
                            ..
                        },
                    ..
                } => {
                    log::info!("close requested");
                    window_should_close.store(true, Ordering::Relaxed);
                }
                winit::event::WindowEvent::Resized(size) => {
                    *resized.lock().unwrap_or_else(|e| e.into_inner()) = Some(window::Extent2D {
                        width: size.width,
                        height: size.height,
                    });
                }
                _ => {}
            },
            winit::event::Event::UserEvent(RenderEvent::Exited) => {
                let outcome = match handler.take().map(thread::JoinHandle::join) {
                    Some(Ok(result)) => result,
                    Some(Err(_)) => Err(anyhow::anyhow!("render thread panicked")),
                    None => Ok(()),
                };
                if let Err(err) = outcome {
                    fatal(&err);
                }
                log::info!("closed");
                *control_flow = winit::event_loop::ControlFlow::Exit;
            }
            _ => {}
        }
    });
}

fn fatal(err: &anyhow::Error) -> ! {
    log::error!("{:#}", err);
    process::exit(1);
}

/// Render thread body. Owns the backend instance and surface.
fn run(
    window: winit::window::Window,
    config: &Config,
    should_close: &AtomicBool,
    resized: &PendingResize,
) -> anyhow::Result<()> {
    let instance = back::Instance::create(env!("CARGO_PKG_NAME"), 1)
        .map_err(Error::gpu("create backend instance"))?;
    let mut surface = unsafe { instance.create_surface(&window) }
        .map_err(Error::gpu("create window surface"))?;

    let result = render_loop::<back::Backend>(
        instance.enumerate_adapters(),
        &mut surface,
        config,
        should_close,
        resized,
    );

    unsafe {
        instance.destroy_surface(surface);
    }
    result
}

fn render_loop<B: Backend>(
    adapters: Vec<Adapter<B>>,
    surface: &mut B::Surface,
    config: &Config,
    should_close: &AtomicBool,
    resized: &PendingResize,
) -> anyhow::Result<()> {
    if adapters.is_empty() {
        return Err(Error::NoAdapter.into());
    }
    let (adapter, family) = adapters
        .iter()
        .find_map(|adapter| {
            adapter
                .queue_families
                .iter()
                .find(|family| {
                    surface.supports_queue_family(family) && family.queue_type().supports_graphics()
                })
                .map(|family| (adapter, family))
        })
        .ok_or(Error::NoQueueFamily)?;
    log::info!("using adapter {}", adapter.info.name);

    let mut gpu = unsafe {
        adapter
            .physical_device
            .open(&[(family, &[1.0])], Features::empty())
    }
    .map_err(Error::gpu("open device"))?;

    let mut queue_group = gpu.queue_groups.pop().ok_or(Error::NoQueueFamily)?;
    let queue = &mut queue_group.queues[0];
    let device = gpu.device;

    let mut game = Game::load(surface, adapter, &device, queue_group.family, config)
        .context("failed to load")?;

    while !should_close.load(Ordering::Relaxed) {
        let dims = resized.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(dims) = dims {
            game.resize(dims);
        }
        game.update();
        game.render(queue).context("failed to render frame")?;
    }

    game.unload();
    Ok(())
}
