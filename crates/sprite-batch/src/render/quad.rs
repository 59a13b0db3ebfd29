use bytemuck::{Pod, Zeroable};

use crate::command::CommandInstance;

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: component, alpha: component }
}

/// Unit quad corner, `0..1` on both axes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub pos: [f32; 2],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Vertex layout of [`CommandInstance`]; locations match `batch.wgsl`.
pub(super) fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 10] = wgpu::vertex_attr_array![
        1 => Float32x4, // rect
        2 => Float32x4, // uv
        3 => Uint32,    // packed colour
        4 => Float32,   // thickness
        5 => Float32,   // rotation
        6 => Float32,   // ignore_zoom
        7 => Float32,   // ignore_camera
        8 => Float32,   // render_type
        9 => Float32x4, // scissor
        10 => Float32   // text_effect
    ];

    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<CommandInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &ATTRS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_attributes_follow_struct_offsets() {
        let layout = instance_layout();
        assert_eq!(layout.array_stride, 76);

        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, [0, 16, 32, 36, 40, 44, 48, 52, 56, 72]);
        assert_eq!(
            layout.attributes[2].offset,
            std::mem::offset_of!(CommandInstance, color) as u64
        );
        assert_eq!(
            layout.attributes[8].offset,
            std::mem::offset_of!(CommandInstance, scissor) as u64
        );
    }
}
