//! Draw command model.
//!
//! Responsibilities:
//! - describe one queued draw (`DrawRequest`) as producers see it
//! - store it in the pool as a `RenderCommand` with its GPU payload already packed
//! - define the paint-order key (z-index, then texture identity)

mod instance;
mod key;
mod render_type;
mod request;
mod texture_id;
mod uv;
mod z_index;

pub use instance::{CommandInstance, FLOATS_PER_INSTANCE, NO_SCISSOR};
pub use key::batch_order;
pub use render_type::{RenderType, TextEffect};
pub use request::{DrawRequest, RenderCommand};
pub use texture_id::TextureId;
pub use uv::UvRect;
pub use z_index::ZIndex;
