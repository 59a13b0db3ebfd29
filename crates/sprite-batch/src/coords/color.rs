/// Packed RGBA colour.
///
/// Layout: red in bits 24..32, green 16..24, blue 8..16, alpha 0..8.
/// The packed value travels to the GPU unchanged as the instance colour
/// attribute, so this layout is shared with `batch.wgsl`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const BLACK: Color = Color(0x0000_00FF);
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const DARK_BLUE: Color = Color(0x0000_AAFF);
    pub const DARK_GREEN: Color = Color(0x00AA_00FF);
    pub const DARK_AQUA: Color = Color(0x00AA_AAFF);
    pub const DARK_RED: Color = Color(0xAA00_00FF);
    pub const DARK_PURPLE: Color = Color(0xAA00_AAFF);
    pub const GOLD: Color = Color(0xFFAA_00FF);
    pub const GRAY: Color = Color(0xAAAA_AAFF);
    pub const DARK_GRAY: Color = Color(0x5555_55FF);
    pub const BLUE: Color = Color(0x5555_FFFF);
    pub const GREEN: Color = Color(0x55FF_55FF);
    pub const AQUA: Color = Color(0x55FF_FFFF);
    pub const RED: Color = Color(0xFF55_55FF);
    pub const LIGHT_PURPLE: Color = Color(0xFF55_FFFF);
    pub const YELLOW: Color = Color(0xFFFF_55FF);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Creates a colour from `[0, 1]` float channels; out-of-range values are clamped.
    #[inline]
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        fn q(v: f32) -> u8 {
            (v * 255.0).clamp(0.0, 255.0) as u8
        }
        Self::rgba(q(r), q(g), q(b), q(a))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Returns the same colour with its alpha channel replaced.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self((self.0 & 0xFFFF_FF00) | a as u32)
    }

    /// Straight-alpha `[r, g, b, a]` in `[0, 1]`.
    #[inline]
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r() as f32 / 255.0,
            self.g() as f32 / 255.0,
            self.b() as f32 / 255.0,
            self.a() as f32 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_channels_in_rgba_order() {
        let c = Color::rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.0, 0x1234_5678);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x12, 0x34, 0x56, 0x78));
    }

    #[test]
    fn white_is_all_bits_set() {
        assert_eq!(Color::WHITE.0 as i32, -1);
        assert_eq!(Color::rgb(255, 255, 255), Color::WHITE);
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let c = Color::RED.with_alpha(0x40);
        assert_eq!(c.0, 0xFF55_5540);
    }

    #[test]
    fn from_f32_clamps() {
        assert_eq!(Color::from_f32(2.0, -1.0, 0.0, 1.0), Color::rgba(255, 0, 0, 255));
    }
}
