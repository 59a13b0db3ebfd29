use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameClock, FrameCtx};
use crate::device::{Gpu, GpuInit};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "sprite-batch".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            resizable: true,
        }
    }
}

/// Entry point for the event loop.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until it exits or the window closes.
    ///
    /// Errors from window/GPU creation or `App::on_gpu_ready` are returned
    /// after the loop stops.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState { config, gpu_init, app, entry: None, error: None };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct RuntimeState<A: App + 'static> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    entry: Option<WindowEntry>,
    error: Option<anyhow::Error>,
}

impl<A: App + 'static> RuntimeState<A> {
    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        entry
            .with_gpu(|gpu| self.app.on_gpu_ready(gpu))
            .context("application setup failed")?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self) -> AppControl {
        let (app, Some(entry)) = (&mut self.app, self.entry.as_mut()) else {
            return AppControl::Continue;
        };

        entry.with_mut(|fields| {
            let time = fields.clock.tick();
            let mut ctx = FrameCtx { window: fields.window, gpu: fields.gpu, time };
            app.on_frame(&mut ctx)
        })
    }
}

impl<A: App + 'static> ApplicationHandler for RuntimeState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(err) = self.create_entry(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: every frame re-submits the whole scene.
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.app.on_window_event(&event) == AppControl::Exit {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                }
            }

            WindowEvent::RedrawRequested => {
                if self.redraw() == AppControl::Exit {
                    self.entry = None;
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}
