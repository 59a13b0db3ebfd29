//! Window + runtime loop.
//!
//! Owns the `winit` event loop and the single render window, and wires them
//! to the GPU layer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
