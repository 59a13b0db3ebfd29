/// Normalized texture sub-rectangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UvRect {
    pub min_u: f32,
    pub min_v: f32,
    pub max_u: f32,
    pub max_v: f32,
}

impl UvRect {
    /// The whole texture.
    pub const FULL: UvRect = UvRect::new(0.0, 0.0, 1.0, 1.0);

    #[inline]
    pub const fn new(min_u: f32, min_v: f32, max_u: f32, max_v: f32) -> Self {
        Self { min_u, min_v, max_u, max_v }
    }

    /// UVs of the pixel rect `(x, y, w, h)` inside a `tex_w × tex_h` texture.
    #[inline]
    pub fn from_pixels(x: u32, y: u32, w: u32, h: u32, tex_w: u32, tex_h: u32) -> Self {
        let tw = tex_w.max(1) as f32;
        let th = tex_h.max(1) as f32;
        Self {
            min_u: x as f32 / tw,
            min_v: y as f32 / th,
            max_u: (x + w) as f32 / tw,
            max_v: (y + h) as f32 / th,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.min_u, self.min_v, self.max_u, self.max_v]
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}
