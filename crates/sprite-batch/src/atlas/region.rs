use std::collections::BTreeMap;

use crate::command::{TextureId, UvRect};

/// Path of the always-present 1×1 white region.
pub const BLANK_PATH: &str = "";

/// Placement of one asset inside the atlas.
///
/// `width`/`height` are the source asset's exact size; padding only affects
/// spacing between regions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AtlasRegion {
    pub uv: UvRect,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRegion {
    pub fn from_pixels(x: u32, y: u32, width: u32, height: u32, side: u32) -> Self {
        Self {
            uv: UvRect::from_pixels(x, y, width, height, side, side),
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the two pixel rects, each grown by `padding` to the right and
    /// bottom, share any pixel.
    pub fn overlaps_padded(&self, other: &AtlasRegion, padding: u32) -> bool {
        let (ax1, ay1) = (self.x + self.width + padding, self.y + self.height + padding);
        let (bx1, by1) = (other.x + other.width + padding, other.y + other.height + padding);
        self.x < bx1 && other.x < ax1 && self.y < by1 && other.y < ay1
    }
}

/// How a [`TexturesAtlas`] came to be.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AtlasOrigin {
    Packed,
    Cached,
}

/// A built atlas: one GPU texture and the path→region table.
///
/// Immutable; a reload replaces the whole value.
#[derive(Debug, Clone)]
pub struct TexturesAtlas {
    texture: TextureId,
    side: u32,
    regions: BTreeMap<String, AtlasRegion>,
    blank: AtlasRegion,
    origin: AtlasOrigin,
}

impl TexturesAtlas {
    /// `regions` is expected to hold the blank region; without one, the
    /// top-left pixel stands in for it.
    pub(crate) fn new(
        texture: TextureId,
        side: u32,
        regions: BTreeMap<String, AtlasRegion>,
        origin: AtlasOrigin,
    ) -> Self {
        let blank = regions
            .get(BLANK_PATH)
            .copied()
            .unwrap_or_else(|| AtlasRegion::from_pixels(0, 0, 1, 1, side));
        Self { texture, side, regions, blank, origin }
    }

    #[inline]
    pub fn texture_id(&self) -> TextureId {
        self.texture
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.side
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.side
    }

    #[inline]
    pub fn origin(&self) -> AtlasOrigin {
        self.origin
    }

    #[inline]
    pub fn get(&self, path: &str) -> Option<&AtlasRegion> {
        self.regions.get(path)
    }

    #[inline]
    pub fn contains(&self, path: &str) -> bool {
        self.regions.contains_key(path)
    }

    /// Region for `path`, or the blank region when the path was not packed.
    #[inline]
    pub fn region(&self, path: &str) -> AtlasRegion {
        self.regions.get(path).copied().unwrap_or(self.blank)
    }

    #[inline]
    pub fn blank(&self) -> AtlasRegion {
        self.blank
    }

    #[inline]
    pub fn uv(&self, path: &str) -> UvRect {
        self.region(path).uv
    }

    /// Every region including the blank one, ordered by path.
    pub fn regions(&self) -> impl Iterator<Item = (&str, &AtlasRegion)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of regions including the blank one.
    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
