//! GPU device + surface management for the single render window.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
