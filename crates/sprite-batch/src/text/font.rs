use std::collections::HashMap;

use crate::batch::TextureFactory;
use crate::command::{TextureId, UvRect};

/// Empty border around every glyph cell, in pixels. Leaves room for the
/// outline the shader draws around glyphs.
pub const GLYPH_PADDING: i32 = 6;

const FIRST_CHAR: u32 = 32;
const LAST_CHAR: u32 = 2000;

#[derive(thiserror::Error, Debug)]
pub enum FontLoadError {
    #[error("font load error: {0}")]
    Parse(String),

    #[error("font has no horizontal line metrics")]
    NoLineMetrics,

    #[error("font covers no printable characters")]
    NoGlyphs,

    #[error("failed to upload font texture")]
    Upload(#[source] anyhow::Error),
}

/// One glyph cell in the font texture.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphInfo {
    /// Cell rect in the font texture, in pixels.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub uv: UvRect,
    /// Cell origin relative to the pen: `x` is added to the pen, `y` is
    /// subtracted from the line top.
    pub x_offset: i32,
    pub y_offset: i32,
    /// Pen advance, in pixels at the rasterized size.
    pub advance: u32,
}

/// A font rasterized at one pixel size into a grid texture.
///
/// Glyphs are white with coverage in alpha, so the draw colour tints them.
#[derive(Debug, Clone)]
pub struct BitmapFont {
    texture: TextureId,
    size: u32,
    line_height: u32,
    glyphs: HashMap<char, GlyphInfo>,
}

impl BitmapFont {
    /// Parses `bytes` and rasterizes every covered character in `32..=2000`
    /// at `size` pixels, then uploads the grid.
    pub fn load<F: TextureFactory + ?Sized>(
        bytes: &[u8],
        size: u32,
        textures: &mut F,
    ) -> Result<Self, FontLoadError> {
        let settings = fontdue::FontSettings { scale: size as f32, ..fontdue::FontSettings::default() };
        let font = fontdue::Font::from_bytes(bytes, settings)
            .map_err(|e| FontLoadError::Parse(e.to_string()))?;

        let grid = GlyphGrid::rasterize(&font, size)?;
        let texture = textures
            .create_texture(grid.side, grid.side, &grid.rgba)
            .map_err(FontLoadError::Upload)?;

        log::info!(
            "font rasterized at {size}px: {} glyphs, {}x{} texture",
            grid.glyphs.len(),
            grid.side,
            grid.side
        );
        Ok(Self::from_glyphs(texture, size, grid.line_height, grid.glyphs))
    }

    /// A font from an existing glyph table, e.g. a pre-baked bitmap font.
    pub fn from_glyphs(
        texture: TextureId,
        size: u32,
        line_height: u32,
        glyphs: HashMap<char, GlyphInfo>,
    ) -> Self {
        Self { texture, size: size.max(1), line_height, glyphs }
    }

    #[inline]
    pub fn texture_id(&self) -> TextureId {
        self.texture
    }

    /// Pixel size the glyphs were rasterized at.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn line_height(&self) -> u32 {
        self.line_height
    }

    /// Glyph for `c`, falling back to `?`.
    #[inline]
    pub fn glyph(&self, c: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&c).or_else(|| self.glyphs.get(&'?'))
    }

    /// Summed advance of one line, unscaled.
    pub fn line_width(&self, line: &str) -> u32 {
        line.chars().filter_map(|c| self.glyph(c)).map(|g| g.advance).sum()
    }

    /// Widest line and line count, unscaled.
    pub fn measure(&self, text: &str) -> (u32, usize) {
        text.split('\n').fold((0, 0), |(w, n), line| (w.max(self.line_width(line)), n + 1))
    }
}

struct GlyphGrid {
    side: u32,
    line_height: u32,
    rgba: Vec<u8>,
    glyphs: HashMap<char, GlyphInfo>,
}

impl GlyphGrid {
    /// Lays every glyph into a square grid of equal cells, each logical glyph
    /// box (advance × line height) centred in its cell.
    fn rasterize(font: &fontdue::Font, size: u32) -> Result<Self, FontLoadError> {
        let px = size as f32;
        let lm = font.horizontal_line_metrics(px).ok_or(FontLoadError::NoLineMetrics)?;
        let ascent = lm.ascent as i32;
        let line_height = ascent - lm.descent as i32 + lm.line_gap as i32;

        let chars: Vec<char> = (FIRST_CHAR..=LAST_CHAR)
            .filter_map(char::from_u32)
            .filter(|&c| font.lookup_glyph_index(c) != 0)
            .collect();
        if chars.is_empty() {
            return Err(FontLoadError::NoGlyphs);
        }

        let largest = chars
            .iter()
            .map(|&c| {
                let m = font.metrics(c, px);
                m.width.max(m.height) as i32
            })
            .max()
            .unwrap_or(0);
        let cell = line_height.max(largest) + GLYPH_PADDING * 2;
        let inner = cell - GLYPH_PADDING * 2;

        let columns = (chars.len() as f64).sqrt().ceil() as i32 + 1;
        let side = columns * cell;
        let mut rgba = vec![0u8; (side * side * 4) as usize];
        let mut glyphs = HashMap::with_capacity(chars.len());

        for (i, &c) in chars.iter().enumerate() {
            let cell_x = (i as i32 % columns) * cell;
            let cell_y = (i as i32 / columns) * cell;

            let (m, bitmap) = font.rasterize(c, px);
            let advance = m.advance_width as i32;

            let logical_x = cell_x + GLYPH_PADDING + (inner - advance) / 2;
            let logical_y = cell_y + GLYPH_PADDING + (inner - line_height) / 2;

            let draw_x = logical_x + m.xmin;
            let draw_y = logical_y + ascent - (m.ymin + m.height as i32);

            for (row, line) in bitmap.chunks_exact(m.width.max(1)).enumerate() {
                for (col, &coverage) in line.iter().enumerate() {
                    let (ax, ay) = (draw_x + col as i32, draw_y + row as i32);
                    if (0..side).contains(&ax) && (0..side).contains(&ay) {
                        let idx = ((ay * side + ax) * 4) as usize;
                        rgba[idx..idx + 4].copy_from_slice(&[255, 255, 255, coverage]);
                    }
                }
            }

            glyphs.insert(
                c,
                GlyphInfo {
                    x: cell_x as u32,
                    y: cell_y as u32,
                    width: cell as u32,
                    height: cell as u32,
                    uv: UvRect::from_pixels(cell_x as u32, cell_y as u32, cell as u32, cell as u32, side as u32, side as u32),
                    x_offset: cell_x - logical_x,
                    y_offset: logical_y - cell_y,
                    advance: advance.max(1) as u32,
                },
            );
        }

        Ok(Self {
            side: side as u32,
            line_height: line_height.max(0) as u32,
            rgba,
            glyphs,
        })
    }
}
