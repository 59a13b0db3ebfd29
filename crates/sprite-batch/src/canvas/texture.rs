use anyhow::Result;

use crate::batch::RenderSink;
use crate::command::{DrawRequest, UvRect};
use crate::coords::Rect;
use crate::texture::{AnimatedTexture, Texture};

use super::{Canvas, DrawStyle};

impl<S: RenderSink> Canvas<'_, S> {
    /// Draws `texture` stretched over `rect`.
    pub fn texture(&mut self, texture: &Texture, rect: Rect, style: DrawStyle) -> Result<()> {
        self.texture_region(texture, texture.uv, rect, style)
    }

    /// Draws an explicit `uv` sub-rectangle of `texture`'s GPU texture.
    pub fn texture_region(&mut self, texture: &Texture, uv: UvRect, rect: Rect, style: DrawStyle) -> Result<()> {
        let req = style.apply(DrawRequest::new(texture.id, rect).with_uv(uv));
        self.submit(req)
    }

    /// Draws the current frame; smooth sprites also draw the next frame on
    /// top, faded by progress through the current one.
    pub fn animated(&mut self, anim: &AnimatedTexture, rect: Rect, style: DrawStyle) -> Result<()> {
        self.texture(&anim.current(), rect, style)?;

        if let Some((next, tint)) = anim.crossfade(style.color) {
            self.texture(&next, rect, DrawStyle { color: tint, ..style })?;
        }
        Ok(())
    }
}
