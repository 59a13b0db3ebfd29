use crate::coords::{Color, Rect};

use super::{CommandInstance, RenderType, TextEffect, TextureId, UvRect, ZIndex};

/// One draw as requested by a producer (façade or application code).
///
/// Every field is meaningful for every render type; producers fill all of
/// them. Scissor state is not part of the request, the engine captures it at
/// submit time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawRequest {
    pub texture: TextureId,
    /// Placement. For `RenderType::Line` this holds `(x1, y1, x2, y2)`.
    pub rect: Rect,
    pub uv: UvRect,
    /// Tint, multiplied with the sampled texel.
    pub color: Color,
    /// Outline / line width; outline width for text.
    pub thickness: f32,
    /// Radians, around the rect centre.
    pub rotation: f32,
    pub ignore_zoom: bool,
    pub ignore_camera: bool,
    pub render_type: RenderType,
    pub z: ZIndex,
    pub effect: TextEffect,
}

impl DrawRequest {
    /// A white, untransformed textured quad covering the whole texture at z 0.
    #[inline]
    pub fn new(texture: TextureId, rect: Rect) -> Self {
        Self {
            texture,
            rect,
            uv: UvRect::FULL,
            color: Color::WHITE,
            thickness: 1.0,
            rotation: 0.0,
            ignore_zoom: true,
            ignore_camera: false,
            render_type: RenderType::Texture,
            z: ZIndex::default(),
            effect: TextEffect::Default,
        }
    }

    #[inline]
    pub fn with_z(mut self, z: impl Into<ZIndex>) -> Self {
        self.z = z.into();
        self
    }

    #[inline]
    pub fn with_uv(mut self, uv: UvRect) -> Self {
        self.uv = uv;
        self
    }

    #[inline]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    #[inline]
    pub fn with_render_type(mut self, render_type: RenderType) -> Self {
        self.render_type = render_type;
        self
    }
}

/// A pool slot: sort keys plus the packed GPU payload.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderCommand {
    pub texture: TextureId,
    pub z: ZIndex,
    pub instance: CommandInstance,
}

impl RenderCommand {
    #[inline]
    pub fn new(req: &DrawRequest, scissor: Option<Rect>) -> Self {
        Self {
            texture: req.texture,
            z: req.z,
            instance: CommandInstance::pack(req, scissor),
        }
    }
}

impl Default for RenderCommand {
    fn default() -> Self {
        Self {
            texture: TextureId::default(),
            z: ZIndex::default(),
            instance: bytemuck::Zeroable::zeroed(),
        }
    }
}
