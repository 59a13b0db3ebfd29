use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::atlas::{AtlasRegion, TexturesAtlas};
use crate::command::UvRect;
use crate::coords::Color;

use super::Texture;

/// Contents of a `<name>.sprite.json` file next to a texture.
///
/// ```json
/// { "loop": true, "smooth": false, "durationMs": 120,
///   "frames": [{ "x": 0, "y": 0, "width": 16, "height": 16 }] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpriteConfig {
    #[serde(rename = "loop")]
    pub looping: bool,
    pub smooth: bool,
    pub duration_ms: u32,
    pub frames: Vec<SpriteFrameConfig>,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self { looping: true, smooth: false, duration_ms: 120, frames: Vec::new() }
    }
}

impl SpriteConfig {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// Frame rectangle in pixels, relative to the source texture.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpriteFrameConfig {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Sprite config path for a texture: `player.png` → `player.sprite.json`.
pub fn sprite_config_path(texture_path: &str) -> String {
    let file_start = texture_path.rfind('/').map_or(0, |i| i + 1);
    match texture_path[file_start..].rfind('.') {
        Some(dot) => format!("{}sprite.json", &texture_path[..file_start + dot + 1]),
        None => format!("{texture_path}.sprite.json"),
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpriteError {
    #[error(
        "`{path}` frame {index} at {},{} ({}x{}) lies outside its {width}x{height} texture",
        frame.x, frame.y, frame.width, frame.height
    )]
    FrameOutOfBounds { path: String, index: usize, frame: SpriteFrameConfig, width: u32, height: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteFrame {
    pub width: u32,
    pub height: u32,
    pub uv: UvRect,
}

/// Frames of one sprite, projected into the texture they are sampled from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDefinition {
    pub path: String,
    pub frames: Vec<SpriteFrame>,
    pub looping: bool,
    pub smooth: bool,
    pub frame_duration_ms: u32,
}

impl SpriteDefinition {
    /// Frames of `config` placed inside the atlas region of `path`.
    /// Without frames, the whole region is one static frame.
    ///
    /// Every frame must lie within the region, or sampling would bleed into
    /// neighbouring atlas entries.
    pub fn for_atlas(
        path: &str,
        atlas: &TexturesAtlas,
        config: Option<&SpriteConfig>,
    ) -> Result<Self, SpriteError> {
        let region = atlas.region(path);
        let side = atlas.width();
        Self::project(path, &region, config, |f| {
            UvRect::from_pixels(region.x + f.x, region.y + f.y, f.width, f.height, side, side)
        })
    }

    /// Frames of `config` over a standalone `width × height` texture.
    pub fn for_texture(
        path: &str,
        width: u32,
        height: u32,
        config: Option<&SpriteConfig>,
    ) -> Result<Self, SpriteError> {
        let whole = AtlasRegion { uv: UvRect::FULL, x: 0, y: 0, width, height };
        Self::project(path, &whole, config, |f| {
            UvRect::from_pixels(f.x, f.y, f.width, f.height, width, height)
        })
    }

    fn project(
        path: &str,
        region: &AtlasRegion,
        config: Option<&SpriteConfig>,
        uv: impl Fn(&SpriteFrameConfig) -> UvRect,
    ) -> Result<Self, SpriteError> {
        let frames = config.map_or(&[][..], |cfg| &cfg.frames[..]);
        if let Some((index, frame)) = frames.iter().enumerate().find(|(_, f)| !fits(f, region)) {
            return Err(SpriteError::FrameOutOfBounds {
                path: path.to_string(),
                index,
                frame: *frame,
                width: region.width,
                height: region.height,
            });
        }

        Ok(match config {
            Some(cfg) if !cfg.frames.is_empty() => Self {
                path: path.to_string(),
                frames: cfg
                    .frames
                    .iter()
                    .map(|f| SpriteFrame { width: f.width, height: f.height, uv: uv(f) })
                    .collect(),
                looping: cfg.looping,
                smooth: cfg.smooth,
                frame_duration_ms: cfg.duration_ms,
            },
            _ => Self {
                path: path.to_string(),
                frames: vec![SpriteFrame { width: region.width, height: region.height, uv: region.uv }],
                looping: false,
                smooth: false,
                frame_duration_ms: 0,
            },
        })
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }
}

fn fits(f: &SpriteFrameConfig, region: &AtlasRegion) -> bool {
    u64::from(f.x) + u64::from(f.width) <= u64::from(region.width)
        && u64::from(f.y) + u64::from(f.height) <= u64::from(region.height)
}

/// A texture plus explicit frame state.
///
/// Time only moves through [`advance`](Self::advance); rendering never
/// changes the frame.
#[derive(Debug, Clone)]
pub struct AnimatedTexture {
    base: Texture,
    definition: Arc<SpriteDefinition>,
    accumulator_ms: f32,
    frame: usize,
}

impl AnimatedTexture {
    pub fn new(base: Texture, definition: Arc<SpriteDefinition>) -> Self {
        Self { base, definition, accumulator_ms: 0.0, frame: 0 }
    }

    #[inline]
    pub fn definition(&self) -> &SpriteDefinition {
        &self.definition
    }

    #[inline]
    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// Moves the animation forward by `dt`.
    ///
    /// Looping sprites wrap to the first frame; others stop on the last one.
    pub fn advance(&mut self, dt: Duration) {
        let def = &self.definition;
        if def.frames.len() <= 1 || def.frame_duration_ms == 0 {
            return;
        }

        let duration = def.frame_duration_ms as f32;
        self.accumulator_ms += dt.as_secs_f32() * 1000.0;

        while self.accumulator_ms >= duration {
            self.accumulator_ms -= duration;
            self.frame += 1;

            if self.frame >= def.frames.len() {
                if def.looping {
                    self.frame = 0;
                } else {
                    self.frame = def.frames.len() - 1;
                    self.accumulator_ms = 0.0;
                    return;
                }
            }
        }
    }

    /// Restarts from the first frame.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.accumulator_ms = 0.0;
    }

    /// The current frame as a drawable texture.
    pub fn current(&self) -> Texture {
        self.texture_for(self.frame)
    }

    /// Next frame and its blend weight for smooth sprites.
    ///
    /// The returned colour is `tint` with alpha scaled by progress through the
    /// current frame; draw it over [`current`](Self::current).
    pub fn crossfade(&self, tint: Color) -> Option<(Texture, Color)> {
        let def = &self.definition;
        if !def.smooth || def.frames.len() <= 1 {
            return None;
        }

        let last = def.frames.len() - 1;
        let next = match self.frame {
            f if f == last && def.looping => 0,
            f if f == last => f,
            f => f + 1,
        };

        let blend = if def.frame_duration_ms > 0 {
            (self.accumulator_ms / def.frame_duration_ms as f32).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let alpha = (blend * tint.a() as f32) as u8;

        Some((self.texture_for(next), tint.with_alpha(alpha)))
    }

    fn texture_for(&self, index: usize) -> Texture {
        match self.definition.frames.get(index) {
            Some(f) => self.base.with_uv(f.uv, f.width, f.height),
            None => self.base,
        }
    }
}
