use anyhow::Result;

use crate::command::{DrawRequest, RenderType, TextEffect, ZIndex};
use crate::coords::{Color, Rect};

use super::{BitmapFont, HorAlign, HorPosition, VerAlign, VerPosition};

/// One text draw.
///
/// `(x, y)` is the anchor; the alignment and position enums decide where
/// the block sits relative to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams<'a> {
    pub text: &'a str,
    pub x: f32,
    pub y: f32,
    /// Target glyph size in pixels; glyphs scale by `font_size / font.size()`.
    pub font_size: u32,
    pub z: ZIndex,
    pub hor_align: HorAlign,
    pub hor_pos: HorPosition,
    pub ver_align: VerAlign,
    pub ver_pos: VerPosition,
    pub color: Color,
    pub rotation: f32,
    pub outline: f32,
    pub ignore_zoom: bool,
    pub ignore_camera: bool,
    pub effect: TextEffect,
}

impl<'a> TextParams<'a> {
    pub fn new(text: &'a str, x: f32, y: f32, font_size: u32) -> Self {
        Self {
            text,
            x,
            y,
            font_size,
            z: ZIndex::default(),
            hor_align: HorAlign::default(),
            hor_pos: HorPosition::default(),
            ver_align: VerAlign::default(),
            ver_pos: VerPosition::default(),
            color: Color::WHITE,
            rotation: 0.0,
            outline: 6.0,
            ignore_zoom: true,
            ignore_camera: false,
            effect: TextEffect::Default,
        }
    }

    pub fn with_z(mut self, z: impl Into<ZIndex>) -> Self {
        self.z = z.into();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_effect(mut self, effect: TextEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn aligned(mut self, hor: HorAlign, ver: VerAlign) -> Self {
        self.hor_align = hor;
        self.ver_align = ver;
        self
    }

    pub fn positioned(mut self, hor: HorPosition, ver: VerPosition) -> Self {
        self.hor_pos = hor;
        self.ver_pos = ver;
        self
    }
}

/// Emits one `Text` request per glyph of `p.text`.
///
/// Block placement:
/// - start = anchor − round(block size × position offset)
/// - line x = start x + round((block width − line width) × alignment offset)
/// - line y = start y + round(line index × font size × vertical alignment)
///
/// Whitespace-only text emits nothing. Characters the font lacks fall back
/// to `?`, or are skipped when that is missing too.
pub fn layout_text(
    font: &BitmapFont,
    p: &TextParams<'_>,
    mut emit: impl FnMut(DrawRequest) -> Result<()>,
) -> Result<()> {
    if p.text.trim().is_empty() {
        return Ok(());
    }

    let scale = p.font_size as f32 / font.size() as f32;
    let (max_width, line_count) = font.measure(p.text);

    let block_w = max_width as f32 * scale;
    let block_h = line_count as f32 * font.line_height() as f32 * scale;

    let start_x = p.x - (block_w * p.hor_pos.offset()).round_ties_even();
    let start_y = p.y - (block_h * p.ver_pos.offset()).round_ties_even();

    for (index, line) in p.text.split('\n').enumerate() {
        let line_w = font.line_width(line) as f32 * scale;
        let line_x = start_x + ((block_w - line_w) * p.hor_align.offset()).round_ties_even();
        let line_y = start_y
            + (index as f32 * font.size() as f32 * scale * p.ver_align.offset()).round_ties_even();

        let mut cursor = line_x;
        for c in line.chars() {
            let Some(g) = font.glyph(c) else {
                continue;
            };

            emit(DrawRequest {
                texture: font.texture_id(),
                rect: Rect::new(
                    cursor + g.x_offset as f32 * scale,
                    line_y - g.y_offset as f32 * scale,
                    g.width as f32 * scale,
                    g.height as f32 * scale,
                ),
                uv: g.uv,
                color: p.color,
                thickness: p.outline,
                rotation: p.rotation,
                ignore_zoom: p.ignore_zoom,
                ignore_camera: p.ignore_camera,
                render_type: RenderType::Text,
                z: p.z,
                effect: p.effect,
            })?;

            cursor += g.advance as f32 * scale;
        }
    }

    Ok(())
}
