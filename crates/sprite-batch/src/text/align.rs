/// Horizontal alignment of each line inside the text block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum HorAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl HorAlign {
    /// Fraction of the free line space placed before the line.
    #[inline]
    pub const fn offset(self) -> f32 {
        match self {
            HorAlign::Left => 0.0,
            HorAlign::Center => 0.5,
            HorAlign::Right => 1.0,
        }
    }
}

/// Which side of the anchor the text block extends to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum HorPosition {
    /// Block ends at the anchor.
    #[default]
    Left,
    Center,
    /// Block starts at the anchor.
    Right,
}

impl HorPosition {
    /// Fraction of the block width shifted left of the anchor.
    #[inline]
    pub const fn offset(self) -> f32 {
        match self {
            HorPosition::Left => 1.0,
            HorPosition::Center => 0.5,
            HorPosition::Right => 0.0,
        }
    }
}

/// Direction in which successive lines advance.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum VerAlign {
    Up,
    #[default]
    Bottom,
}

impl VerAlign {
    #[inline]
    pub const fn offset(self) -> f32 {
        match self {
            VerAlign::Up => -1.0,
            VerAlign::Bottom => 1.0,
        }
    }
}

/// Which side of the anchor the text block extends to, vertically.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum VerPosition {
    Up,
    Center,
    #[default]
    Bottom,
}

impl VerPosition {
    /// Fraction of the block height shifted above the anchor.
    #[inline]
    pub const fn offset(self) -> f32 {
        match self {
            VerPosition::Up => 1.0,
            VerPosition::Center => 0.5,
            VerPosition::Bottom => 0.0,
        }
    }
}
