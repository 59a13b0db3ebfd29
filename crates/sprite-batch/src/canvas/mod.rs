//! Draw façades.
//!
//! A [`Canvas`] borrows the batch engine for one frame and turns shape,
//! texture and text calls into fully populated draw requests. Solid
//! geometry samples the atlas blank region, so it batches together with
//! sprites from the same atlas.

mod geometry;
mod text;
mod texture;

use anyhow::Result;

use crate::atlas::AssetSource;
use crate::batch::{BatchEngine, RenderSink};
use crate::command::{DrawRequest, ZIndex};
use crate::coords::{Color, Rect};
use crate::texture::{RegistryError, Texture, TextureRegistry};

/// Per-draw style shared by every façade call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawStyle {
    pub z: ZIndex,
    pub color: Color,
    /// Radians around the rect centre.
    pub rotation: f32,
    pub ignore_zoom: bool,
    pub ignore_camera: bool,
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            z: ZIndex::default(),
            color: Color::WHITE,
            rotation: 0.0,
            ignore_zoom: true,
            ignore_camera: false,
        }
    }
}

impl DrawStyle {
    pub fn at(z: impl Into<ZIndex>) -> Self {
        Self { z: z.into(), ..Self::default() }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Screen-space: neither camera offset nor zoom apply.
    pub fn screen(mut self) -> Self {
        self.ignore_camera = true;
        self.ignore_zoom = true;
        self
    }

    /// World-space: camera offset and zoom both apply.
    pub fn world(mut self) -> Self {
        self.ignore_camera = false;
        self.ignore_zoom = false;
        self
    }

    #[inline]
    fn apply(&self, mut req: DrawRequest) -> DrawRequest {
        req.z = self.z;
        req.color = self.color;
        req.rotation = self.rotation;
        req.ignore_zoom = self.ignore_zoom;
        req.ignore_camera = self.ignore_camera;
        req
    }
}

/// Frame-scoped drawing surface over a [`BatchEngine`].
pub struct Canvas<'a, S: RenderSink> {
    engine: &'a mut BatchEngine<S>,
    blank: Texture,
}

impl<'a, S: RenderSink> Canvas<'a, S> {
    /// `blank` backs solid geometry; normally the atlas blank region.
    pub fn new(engine: &'a mut BatchEngine<S>, blank: Texture) -> Self {
        Self { engine, blank }
    }

    /// Canvas using the registry's atlas blank region. Fails before the atlas is built.
    pub fn from_registry<A: AssetSource>(
        engine: &'a mut BatchEngine<S>,
        registry: &TextureRegistry<A>,
    ) -> Result<Self, RegistryError> {
        let blank = registry.blank()?;
        Ok(Self::new(engine, blank))
    }

    #[inline]
    pub fn engine(&mut self) -> &mut BatchEngine<S> {
        &mut *self.engine
    }

    #[inline]
    pub fn set_scissor(&mut self, rect: Option<Rect>) {
        self.engine.set_scissor(rect);
    }

    /// Runs `f` with `rect` as the clip rect, then restores the previous one.
    pub fn clipped<R>(&mut self, rect: Rect, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.engine.scissor();
        self.engine.set_scissor(Some(rect));
        let out = f(self);
        self.engine.set_scissor(previous);
        out
    }

    #[inline]
    fn submit(&mut self, req: DrawRequest) -> Result<()> {
        self.engine.submit(req)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::batch::testing::RecordingSink;
    use crate::command::{TextureId, UvRect, NO_SCISSOR};

    pub(crate) fn blank() -> Texture {
        Texture {
            id: TextureId(1),
            width: 1,
            height: 1,
            uv: UvRect::new(0.5, 0.5, 0.5078125, 0.5078125),
        }
    }

    pub(crate) fn engine() -> BatchEngine<RecordingSink> {
        BatchEngine::new(RecordingSink::default(), 256)
    }

    #[test]
    fn style_defaults() {
        let s = DrawStyle::default();
        assert_eq!(s.z, ZIndex(0));
        assert_eq!(s.color, Color::WHITE);
        assert!(s.ignore_zoom);
        assert!(!s.ignore_camera);

        let w = DrawStyle::at(ZIndex::WORLD_ENTITIES).world();
        assert!(!w.ignore_zoom && !w.ignore_camera);
        assert_eq!(w.z, ZIndex(100));
    }

    #[test]
    fn clipped_restores_previous_scissor() {
        let mut e = engine();
        let mut c = Canvas::new(&mut e, blank());
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        c.set_scissor(Some(outer));

        c.clipped(Rect::new(10.0, 10.0, 5.0, 5.0), |c| {
            c.fill_rect(Rect::new(0.0, 0.0, 50.0, 50.0), DrawStyle::default())
        })
        .unwrap();
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), DrawStyle::default()).unwrap();
        c.set_scissor(None);
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), DrawStyle::default()).unwrap();

        e.flush().unwrap();
        let inst = &e.sink().batches()[0].instances;
        assert_eq!(inst[0].scissor, [10.0, 10.0, 5.0, 5.0]);
        assert_eq!(inst[1].scissor, [0.0, 0.0, 100.0, 100.0]);
        assert_eq!(inst[2].scissor[0], NO_SCISSOR);
    }
}
