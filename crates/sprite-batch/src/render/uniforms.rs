use bytemuck::{Pod, Zeroable};

use crate::batch::FrameUniforms;
use crate::coords::Viewport;

/// `Frame` uniform block of `batch.wgsl` (48 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct FrameUniform {
    pub viewport: [f32; 2],
    pub camera_center: [f32; 2],
    pub camera_offset: [f32; 2],
    pub camera_scale: f32,
    pub time: f32,
    pub scale_factor: f32,
    pub _pad: [f32; 3],
}

impl FrameUniform {
    pub(super) fn new(flush: &FrameUniforms, viewport: Viewport, scale_factor: f32) -> Self {
        let viewport = Viewport::new(viewport.width.max(1.0), viewport.height.max(1.0));
        Self {
            viewport: [viewport.width, viewport.height],
            camera_center: viewport.center(),
            camera_offset: flush.camera_offset,
            camera_scale: flush.camera_scale,
            time: flush.time,
            scale_factor: scale_factor.max(f32::EPSILON),
            _pad: [0.0; 3],
        }
    }

    pub(super) fn min_binding_size() -> std::num::NonZeroU64 {
        std::num::NonZeroU64::MIN.saturating_add(std::mem::size_of::<Self>() as u64 - 1)
    }
}

/// Byte stride between per-flush uniform slots.
pub(super) fn slot_stride(min_offset_alignment: u32) -> u64 {
    let size = std::mem::size_of::<FrameUniform>() as u64;
    let align = u64::from(min_offset_alignment.max(1));
    size.div_ceil(align) * align
}
