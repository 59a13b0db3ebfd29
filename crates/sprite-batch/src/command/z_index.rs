use core::cmp::Ordering;

/// Paint-order key for draw commands.
///
/// Lower values are drawn first; overlapping content must use strictly
/// increasing values to layer correctly.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct ZIndex(pub i32);

impl ZIndex {
    pub const WORLD_BLOCKS: ZIndex = ZIndex(0);
    pub const WORLD_ENTITIES: ZIndex = ZIndex(100);
    pub const WORLD_PLAYER: ZIndex = ZIndex(200);
    pub const WORLD_PARTICLES: ZIndex = ZIndex(300);
    pub const WORLD_DEBUG: ZIndex = ZIndex(400);

    pub const HUD: ZIndex = ZIndex(500);
    pub const HUD_INVENTORY: ZIndex = ZIndex(600);
    pub const HUD_INVENTORY_CONTENTS: ZIndex = ZIndex(700);
    pub const HUD_INVENTORY_TEXT: ZIndex = ZIndex(800);
    pub const HUD_TEXT: ZIndex = ZIndex(900);

    pub const UI_BACKGROUND: ZIndex = ZIndex(1000);
    pub const UI_OVERLAY: ZIndex = ZIndex(1500);
    pub const UI_ELEMENTS: ZIndex = ZIndex(2000);
    pub const UI_CONTENTS: ZIndex = ZIndex(2500);
    pub const UI_TEXT: ZIndex = ZIndex(3000);
    pub const UI_TOOLTIPS: ZIndex = ZIndex(4000);
    pub const UI_SCROLLBAR: ZIndex = ZIndex(4250);
    pub const UI_BORDER: ZIndex = ZIndex(4750);
    pub const UI_DEBUG: ZIndex = ZIndex(5000);
    pub const UI_CURSOR: ZIndex = ZIndex(6000);

    #[inline]
    pub const fn new(v: i32) -> Self {
        Self(v)
    }

    /// A layer `n` steps above this one.
    #[inline]
    pub const fn offset(self, n: i32) -> Self {
        Self(self.0 + n)
    }
}

impl Ord for ZIndex {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ZIndex {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i32> for ZIndex {
    fn from(v: i32) -> Self {
        Self(v)
    }
}
