use anyhow::Result;
use winit::window::Window;

use crate::coords::{Color, Viewport};
use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{FrameEncoder, RenderCtx, RenderTarget};

use super::app::AppControl;
use super::clock::FrameTime;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback borrow, `'w` the window borrow carried by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
}

impl FrameCtx<'_, '_> {
    /// Window size in logical pixels.
    pub fn viewport(&self) -> Viewport {
        let logical = self.window.inner_size().to_logical::<f64>(self.window.scale_factor());
        Viewport::new(logical.width as f32, logical.height as f32)
    }

    /// Acquires a frame, clears it to `clear`, lets `encoder` replay its
    /// batches, then presents.
    ///
    /// Surface errors are absorbed (skip or reconfigure) unless fatal, and the
    /// encoder's recorded batches are discarded with the frame. An error from
    /// `encode` drops the frame and is returned.
    pub fn render<E>(&mut self, clear: Color, encoder: &mut E) -> Result<AppControl>
    where
        E: FrameEncoder + ?Sized,
    {
        let viewport = self.viewport();
        let scale_factor = self.window.scale_factor() as f32;

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface error: {err}");
                let action = self.gpu.handle_surface_error(err);
                return Ok(skip_frame(action, encoder));
            }
        };

        {
            let _clear = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite-batch clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(linear_clear(clear)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            viewport,
            scale_factor,
        );

        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            encoder.encode(&rctx, &mut target)?;
        }

        self.window.pre_present_notify();
        self.gpu.submit(frame);
        Ok(AppControl::Continue)
    }
}

/// Drops the encoder's recording for a frame that was never acquired.
fn skip_frame<E: FrameEncoder + ?Sized>(action: SurfaceErrorAction, encoder: &mut E) -> AppControl {
    encoder.discard();
    match action {
        SurfaceErrorAction::Fatal => AppControl::Exit,
        SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => AppControl::Continue,
    }
}

/// sRGB colour to the linear value an sRGB surface expects.
fn linear_clear(c: Color) -> wgpu::Color {
    let [r, g, b, a] = c.to_f32();
    let lin = |v: f32| f64::from(v).powf(2.2);
    wgpu::Color { r: lin(r), g: lin(g), b: lin(b), a: f64::from(a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingEncoder {
        pending: usize,
        discards: usize,
    }

    impl FrameEncoder for CountingEncoder {
        fn encode(&mut self, _: &RenderCtx<'_>, _: &mut RenderTarget<'_>) -> Result<()> {
            self.pending = 0;
            Ok(())
        }

        fn discard(&mut self) {
            self.pending = 0;
            self.discards += 1;
        }
    }

    #[test]
    fn skipped_frame_discards_recorded_batches() {
        let mut enc = CountingEncoder { pending: 5, ..Default::default() };
        assert_eq!(skip_frame(SurfaceErrorAction::SkipFrame, &mut enc), AppControl::Continue);
        assert_eq!(enc.pending, 0);

        enc.pending = 2;
        assert_eq!(skip_frame(SurfaceErrorAction::Reconfigured, &mut enc), AppControl::Continue);
        assert_eq!(skip_frame(SurfaceErrorAction::Fatal, &mut enc), AppControl::Exit);
        assert_eq!(enc.pending, 0);
        assert_eq!(enc.discards, 3);
    }

    #[test]
    fn clear_colour_is_linearised() {
        let c = linear_clear(Color::rgba(255, 0, 128, 255));
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - (128.0f64 / 255.0).powf(2.2)).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }
}
