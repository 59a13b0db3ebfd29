use crate::atlas::{AtlasRegion, TexturesAtlas};
use crate::command::{TextureId, UvRect};

/// A drawable texture: GPU identity plus the sub-rectangle to sample.
///
/// Handles are plain values; they stay valid until the registry that
/// produced them reloads or releases its atlas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Texture {
    pub id: TextureId,
    /// Pixel size of the sampled region.
    pub width: u32,
    pub height: u32,
    pub uv: UvRect,
}

impl Texture {
    /// A whole standalone texture.
    pub fn standalone(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height, uv: UvRect::FULL }
    }

    pub fn from_region(atlas: &TexturesAtlas, region: &AtlasRegion) -> Self {
        Self {
            id: atlas.texture_id(),
            width: region.width,
            height: region.height,
            uv: region.uv,
        }
    }

    /// Same texture, different region.
    #[inline]
    pub fn with_uv(self, uv: UvRect, width: u32, height: u32) -> Self {
        Self { uv, width, height, ..self }
    }
}
