/// Integer identity of a GPU texture.
///
/// The batcher groups commands purely by this value; the atlas packer and the
/// registry decide which ids exist.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct TextureId(pub u32);

impl std::fmt::Display for TextureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
