//! Texture lookup on top of the atlas.
//!
//! - [`TextureRegistry`]: path → atlas region or standalone texture
//! - [`Texture`]: resolved, copyable handle used by the façades
//! - [`AnimatedTexture`]: sprite-sheet animation over an atlas entry

mod handle;
mod registry;
mod sprite;

pub use handle::Texture;
pub use registry::{RegistryError, TextureRegistry};
pub use sprite::{
    sprite_config_path, AnimatedTexture, SpriteConfig, SpriteDefinition, SpriteError, SpriteFrame, SpriteFrameConfig,
};
