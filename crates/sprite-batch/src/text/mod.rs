//! Bitmap text.
//!
//! [`BitmapFont`] rasterizes a TrueType/OpenType font into a grid texture;
//! [`layout_text`] turns a [`TextParams`] into one `Text` draw request per
//! glyph.

mod align;
mod font;
mod layout;

pub use align::{HorAlign, HorPosition, VerAlign, VerPosition};
pub use font::{BitmapFont, FontLoadError, GlyphInfo, GLYPH_PADDING};
pub use layout::{layout_text, TextParams};
