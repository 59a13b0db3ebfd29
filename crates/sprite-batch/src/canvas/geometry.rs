use anyhow::Result;

use crate::batch::RenderSink;
use crate::command::{DrawRequest, RenderType};
use crate::coords::Rect;

use super::{Canvas, DrawStyle};

impl<S: RenderSink> Canvas<'_, S> {
    pub fn fill_rect(&mut self, rect: Rect, style: DrawStyle) -> Result<()> {
        let req = self.solid(rect, RenderType::FillRect, 1.0, style);
        self.submit(req)
    }

    /// Rectangle outline `thickness` pixels wide, drawn inside `rect`.
    pub fn hollow_rect(&mut self, rect: Rect, thickness: f32, style: DrawStyle) -> Result<()> {
        let req = self.solid(rect, RenderType::HollowRect, thickness, style);
        self.submit(req)
    }

    /// Line from `(x1, y1)` to `(x2, y2)`. Lines ignore `style.rotation`.
    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32, style: DrawStyle) -> Result<()> {
        let style = DrawStyle { rotation: 0.0, ..style };
        let req = self.solid(Rect::new(x1, y1, x2, y2), RenderType::Line, thickness, style);
        self.submit(req)
    }

    fn solid(&self, rect: Rect, kind: RenderType, thickness: f32, style: DrawStyle) -> DrawRequest {
        let mut req = style.apply(
            DrawRequest::new(self.blank.id, rect)
                .with_uv(self.blank.uv)
                .with_render_type(kind),
        );
        req.thickness = thickness;
        req
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{blank, engine};
    use super::*;
    use crate::command::ZIndex;
    use crate::coords::Color;

    #[test]
    fn geometry_samples_the_blank_region() {
        let mut e = engine();
        let mut c = Canvas::new(&mut e, blank());
        let style = DrawStyle::at(ZIndex::HUD).with_color(Color::RED);

        c.fill_rect(Rect::new(1.0, 2.0, 3.0, 4.0), style).unwrap();
        c.hollow_rect(Rect::new(1.0, 2.0, 3.0, 4.0), 2.5, style).unwrap();
        c.line(0.0, 0.0, 10.0, 5.0, 3.0, style.with_rotation(1.0)).unwrap();
        e.flush().unwrap();

        let batches = e.sink().batches();
        assert_eq!(batches.len(), 1, "all geometry shares the blank texture");
        let inst = &batches[0].instances;

        assert_eq!(inst[0].render_type, RenderType::FillRect.shader_value());
        assert_eq!(inst[1].render_type, RenderType::HollowRect.shader_value());
        assert_eq!(inst[1].thickness, 2.5);
        assert_eq!(inst[2].render_type, RenderType::Line.shader_value());
        assert_eq!(inst[2].rect, [0.0, 0.0, 10.0, 5.0]);
        assert_eq!(inst[2].rotation, 0.0);
        for i in inst {
            assert_eq!(i.uv, blank().uv.to_array());
            assert_eq!(i.color, Color::RED.0);
        }
    }
}
