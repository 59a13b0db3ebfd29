//! Geometry and colour types shared by the command model and façades.
//!
//! Canonical CPU space:
//! - pixels, origin top-left
//! - +X right, +Y down

mod color;
mod rect;
mod viewport;

pub use color::Color;
pub use rect::Rect;
pub use viewport::Viewport;
