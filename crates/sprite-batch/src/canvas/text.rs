use anyhow::Result;

use crate::batch::RenderSink;
use crate::text::{layout_text, BitmapFont, TextParams};

use super::Canvas;

impl<S: RenderSink> Canvas<'_, S> {
    /// Lays out `params` with `font` and submits one command per glyph.
    pub fn text(&mut self, font: &BitmapFont, params: &TextParams<'_>) -> Result<()> {
        layout_text(font, params, |req| self.submit(req))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::super::tests::{blank, engine};
    use super::*;
    use crate::command::{RenderType, TextureId, UvRect, ZIndex};
    use crate::text::GlyphInfo;

    #[test]
    fn text_batches_on_the_font_texture() {
        let g = GlyphInfo {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            uv: UvRect::FULL,
            x_offset: 0,
            y_offset: 0,
            advance: 6,
        };
        let glyphs: HashMap<char, GlyphInfo> = [('h', g), ('i', g)].into_iter().collect();
        let font = BitmapFont::from_glyphs(TextureId(42), 10, 12, glyphs);

        let mut e = engine();
        let mut c = Canvas::new(&mut e, blank());
        c.text(&font, &TextParams::new("hi", 0.0, 0.0, 10).with_z(ZIndex::UI_TEXT)).unwrap();
        e.flush().unwrap();

        let batches = e.sink().batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].texture, TextureId(42));
        assert_eq!(batches[0].instances.len(), 2);
        assert!(batches[0].instances.iter().all(|i| i.render_type == RenderType::Text.shader_value()));
    }
}
