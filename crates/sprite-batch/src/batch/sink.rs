use anyhow::Result;

use crate::command::{CommandInstance, TextureId};

/// Values shared by every batch of one flush.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameUniforms {
    /// Seconds since the engine was created; drives animated text effects.
    pub time: f32,
    pub camera_scale: f32,
    pub camera_offset: [f32; 2],
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self { time: 0.0, camera_scale: 1.0, camera_offset: [0.0, 0.0] }
    }
}

/// GPU submission seam used by [`BatchEngine::flush`](super::BatchEngine::flush).
///
/// One batch is always `bind_texture` → `upload_instances` → `draw_instanced`.
/// Every method may fail; a failure aborts the flush and is propagated to the
/// caller, since GPU state after a partial submission is unreliable.
pub trait RenderSink {
    /// Called once per non-empty flush, before its first batch.
    fn begin_flush(&mut self, uniforms: &FrameUniforms) -> Result<()>;

    fn bind_texture(&mut self, texture: TextureId) -> Result<()>;

    /// Uploads the per-instance buffer for the batch about to be drawn.
    fn upload_instances(&mut self, instances: &[CommandInstance]) -> Result<()>;

    /// Draws the unit quad `instance_count` times, reading the last upload.
    fn draw_instanced(&mut self, instance_count: u32) -> Result<()>;
}

/// Creates and destroys GPU textures from RGBA8 pixels.
pub trait TextureFactory {
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId>;

    fn release_texture(&mut self, texture: TextureId);
}

impl<T: RenderSink + ?Sized> RenderSink for &mut T {
    fn begin_flush(&mut self, uniforms: &FrameUniforms) -> Result<()> {
        (**self).begin_flush(uniforms)
    }

    fn bind_texture(&mut self, texture: TextureId) -> Result<()> {
        (**self).bind_texture(texture)
    }

    fn upload_instances(&mut self, instances: &[CommandInstance]) -> Result<()> {
        (**self).upload_instances(instances)
    }

    fn draw_instanced(&mut self, instance_count: u32) -> Result<()> {
        (**self).draw_instanced(instance_count)
    }
}
