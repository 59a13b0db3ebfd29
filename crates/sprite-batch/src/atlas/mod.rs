//! Offline texture atlas packing.
//!
//! [`AtlasBuilder`] loads a set of image assets through an [`AssetSource`],
//! packs them with a MaxRects best-short-side-fit strategy into one square
//! power-of-two texture, uploads it through a
//! [`TextureFactory`](crate::batch::TextureFactory) and persists the result
//! into a cache directory keyed on content hashes.
//!
//! A 1×1 opaque white region under [`BLANK_PATH`] is always present so that
//! solid geometry shares the texture batching path with sprites.

mod builder;
mod error;
mod meta;
pub mod packer;
mod region;
mod source;

pub use builder::AtlasBuilder;
pub use error::AtlasError;
pub use meta::CacheError;
pub use region::{AtlasOrigin, AtlasRegion, TexturesAtlas, BLANK_PATH};
pub use source::{AssetFingerprint, AssetSource, DirAssetSource, ImageData, MemoryAssetSource};
