//! Command batching engine.
//!
//! Producers `submit` draw requests into a fixed-capacity pool; `flush`
//! orders the live prefix by (z-index, texture), partitions it into runs of
//! equal texture and issues one instanced draw per run through a
//! [`RenderSink`].

mod engine;
mod metrics;
mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{BatchEngine, DEFAULT_MAX_COMMANDS};
pub use metrics::{FlushStats, FrameMetrics};
pub use sink::{FrameUniforms, RenderSink, TextureFactory};
