//! wgpu backend.
//!
//! `WgpuSink` is the production [`RenderSink`](crate::batch::RenderSink):
//! flushes record their batches into it, and `encode` replays every recorded
//! batch into the frame's render pass.
//!
//! Convention:
//! - command rects are logical pixels (top-left origin, +Y down)
//! - the vertex shader applies rotation, camera and the NDC transform

mod ctx;
mod quad;
mod recording;
mod uniforms;
mod wgpu_sink;

pub use ctx::{FrameEncoder, RenderCtx, RenderTarget};
pub use wgpu_sink::WgpuSink;
