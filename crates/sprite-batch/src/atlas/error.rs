/// Fatal atlas build failures.
///
/// Cache problems never show up here; a missing or stale cache is silently
/// rebuilt.
#[derive(thiserror::Error, Debug)]
pub enum AtlasError {
    #[error("asset `{0}` requested more than once")]
    DuplicateAsset(String),

    #[error("asset `{path}` has zero area ({width}x{height})")]
    EmptyAsset { path: String, width: u32, height: u32 },

    /// The empty path is the blank region; `,` `;` and line breaks cannot be
    /// stored in the cache metadata.
    #[error("asset path `{0:?}` is reserved")]
    ReservedPath(String),

    #[error("cannot pack {count} assets into a {max}x{max} atlas")]
    TooLarge { count: usize, max: u32 },

    #[error("failed to load asset `{path}`")]
    Asset {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("atlas cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode atlas image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to upload atlas texture")]
    Upload(#[source] anyhow::Error),
}
