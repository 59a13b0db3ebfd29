use bytemuck::{Pod, Zeroable};

use crate::coords::Rect;

use super::DrawRequest;

/// Number of 4-byte scalars per instance.
pub const FLOATS_PER_INSTANCE: usize = 19;

/// Scissor `x` value meaning "no clipping".
pub const NO_SCISSOR: f32 = -1.0;

/// Per-instance GPU payload (76 bytes).
///
///  offset  0  rect           [f32; 4]  x, y, w, h
///  offset 16  uv             [f32; 4]  min_u, min_v, max_u, max_v
///  offset 32  color          u32       packed RGBA
///  offset 36  thickness      f32
///  offset 40  rotation       f32       radians
///  offset 44  ignore_zoom    f32       0 / 1
///  offset 48  ignore_camera  f32       0 / 1
///  offset 52  render_type    f32
///  offset 56  scissor        [f32; 4]  x, y, w, h (x = -1: none)
///  offset 72  text_effect    f32
///
/// The order and widths are shared with `batch.wgsl` and must not change.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CommandInstance {
    pub rect: [f32; 4],
    pub uv: [f32; 4],
    pub color: u32,
    pub thickness: f32,
    pub rotation: f32,
    pub ignore_zoom: f32,
    pub ignore_camera: f32,
    pub render_type: f32,
    pub scissor: [f32; 4],
    pub text_effect: f32,
}

impl CommandInstance {
    /// Packs every field of `req` plus the active scissor.
    ///
    /// All 19 scalars are written, so a recycled pool slot never carries data
    /// from an earlier frame.
    #[inline]
    pub fn pack(req: &DrawRequest, scissor: Option<Rect>) -> Self {
        let scissor = match scissor {
            Some(s) => [s.x, s.y, s.w, s.h],
            None => [NO_SCISSOR, 0.0, 0.0, 0.0],
        };

        Self {
            rect: [req.rect.x, req.rect.y, req.rect.w, req.rect.h],
            uv: req.uv.to_array(),
            color: req.color.0,
            thickness: req.thickness,
            rotation: req.rotation,
            ignore_zoom: flag(req.ignore_zoom),
            ignore_camera: flag(req.ignore_camera),
            render_type: req.render_type.shader_value(),
            scissor,
            text_effect: req.effect.shader_value(),
        }
    }

    #[inline]
    pub fn has_scissor(&self) -> bool {
        self.scissor[0] >= 0.0
    }
}

#[inline]
fn flag(v: bool) -> f32 {
    if v { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{RenderType, TextEffect, TextureId, UvRect, ZIndex};
    use crate::coords::Color;

    #[test]
    fn layout_is_nineteen_scalars() {
        assert_eq!(std::mem::size_of::<CommandInstance>(), FLOATS_PER_INSTANCE * 4);
        assert_eq!(std::mem::size_of::<CommandInstance>(), 76);
        assert_eq!(std::mem::offset_of!(CommandInstance, color), 32);
        assert_eq!(std::mem::offset_of!(CommandInstance, scissor), 56);
        assert_eq!(std::mem::offset_of!(CommandInstance, text_effect), 72);
    }

    #[test]
    fn pack_writes_scissor_sentinel_when_unclipped() {
        let req = DrawRequest::new(TextureId(3), Rect::new(1.0, 2.0, 3.0, 4.0));
        let inst = CommandInstance::pack(&req, None);
        assert_eq!(inst.scissor, [NO_SCISSOR, 0.0, 0.0, 0.0]);
        assert!(!inst.has_scissor());
    }

    #[test]
    fn pack_copies_every_field() {
        let req = DrawRequest {
            texture: TextureId(9),
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            uv: UvRect::new(0.1, 0.2, 0.3, 0.4),
            color: Color::rgba(1, 2, 3, 4),
            thickness: 5.0,
            rotation: 0.5,
            ignore_zoom: true,
            ignore_camera: false,
            render_type: RenderType::Text,
            z: ZIndex(7),
            effect: TextEffect::Chroma,
        };
        let inst = CommandInstance::pack(&req, Some(Rect::new(10.0, 20.0, 30.0, 40.0)));

        assert_eq!(inst.rect, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(inst.uv, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(inst.color, 0x0102_0304);
        assert_eq!((inst.thickness, inst.rotation), (5.0, 0.5));
        assert_eq!((inst.ignore_zoom, inst.ignore_camera), (1.0, 0.0));
        assert_eq!(inst.render_type, 4.0);
        assert_eq!(inst.scissor, [10.0, 20.0, 30.0, 40.0]);
        assert_eq!(inst.text_effect, 2.0);
    }

    #[test]
    fn color_bytes_are_the_packed_u32() {
        let mut req = DrawRequest::new(TextureId(0), Rect::new(0.0, 0.0, 1.0, 1.0));
        req.color = Color(0xDEAD_BEEF);
        let inst = CommandInstance::pack(&req, None);
        let bytes = bytemuck::bytes_of(&inst);
        assert_eq!(&bytes[32..36], &0xDEAD_BEEFu32.to_ne_bytes());
    }
}
