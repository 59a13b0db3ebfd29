/// Shader-side draw mode of a command.
///
/// The discriminant is sent to the GPU as a float, so the values are part of
/// the binary contract with `batch.wgsl`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum RenderType {
    #[default]
    Texture,
    FillRect,
    HollowRect,
    /// `rect.x, rect.y` is the start point and `rect.w, rect.h` the end point.
    Line,
    Text,
}

impl RenderType {
    #[inline]
    pub const fn shader_value(self) -> f32 {
        match self {
            RenderType::Texture => 0.0,
            RenderType::FillRect => 1.0,
            RenderType::HollowRect => 2.0,
            RenderType::Line => 3.0,
            RenderType::Text => 4.0,
        }
    }
}

/// Colour effect applied to `RenderType::Text` glyphs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum TextEffect {
    #[default]
    Default,
    Rainbow,
    Chroma,
}

impl TextEffect {
    #[inline]
    pub const fn shader_value(self) -> f32 {
        match self {
            TextEffect::Default => 0.0,
            TextEffect::Rainbow => 1.0,
            TextEffect::Chroma => 2.0,
        }
    }
}
