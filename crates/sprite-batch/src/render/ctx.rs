use anyhow::Result;

use crate::coords::Viewport;

/// Per-frame GPU handles plus the logical viewport.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub viewport: Viewport,
    /// Physical pixels per logical pixel; used for scissor tests.
    pub scale_factor: f32,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
        scale_factor: f32,
    ) -> Self {
        Self { device, queue, surface_format, viewport, scale_factor }
    }
}

/// Encoder and colour attachment of the frame being recorded.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }
}

/// Replays recorded batches into an acquired frame.
///
/// [`FrameCtx::render`](crate::core::FrameCtx::render) calls exactly one of
/// `encode` or `discard` per frame, so recorded work never outlives its frame.
pub trait FrameEncoder {
    fn encode(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<()>;

    /// Drops recorded batches when no frame could be acquired.
    fn discard(&mut self);
}
