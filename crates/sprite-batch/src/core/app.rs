use anyhow::Result;
use winit::event::WindowEvent;

use crate::device::Gpu;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called once the window's device exists, before the first frame.
    ///
    /// This is where GPU-backed state (sink, atlas, fonts) is created. An error
    /// stops the runtime.
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let _ = gpu;
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
