use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::batch::TextureFactory;
use crate::config::AtlasConfig;

use super::meta::{AtlasMeta, CacheError};
use super::packer;
use super::{
    AssetFingerprint, AssetSource, AtlasError, AtlasOrigin, AtlasRegion, ImageData, TexturesAtlas,
    BLANK_PATH,
};

/// Builds texture atlases and maintains their on-disk cache.
///
/// `build` is deterministic for a given asset set, padding and asset
/// content. A cached atlas is reused only when padding, the asset set and
/// every asset fingerprint match; any doubt leads to a full rebuild.
#[derive(Debug, Clone)]
pub struct AtlasBuilder {
    config: AtlasConfig,
}

/// Reason a cached atlas was not reused.
#[derive(thiserror::Error, Debug)]
enum CacheMiss {
    #[error("no cached atlas")]
    Absent,
    #[error("corrupt metadata: {0}")]
    Corrupt(#[from] CacheError),
    #[error("padding changed ({cached} -> {requested})")]
    Padding { cached: u32, requested: u32 },
    #[error("asset set changed")]
    AssetSet,
    #[error("no metadata for `{0}`")]
    NoMetadata(String),
    #[error("`{0}` changed (hash or timestamp)")]
    Changed(String),
    #[error("cannot fingerprint `{path}`: {source:#}")]
    Fingerprint { path: String, source: anyhow::Error },
    #[error("no region for `{0}`")]
    NoRegion(String),
    #[error("cached image unreadable: {0}")]
    Image(#[from] image::ImageError),
    #[error("cached image is {width}x{height}, expected {side}x{side}")]
    ImageSize { width: u32, height: u32, side: u32 },
    #[error("cached atlas side {0} is not a power of two")]
    Side(u32),
    #[error("cached atlas side {side} exceeds the configured maximum {max}")]
    ExceedsMax { side: u32, max: u32 },
}

struct LoadedAsset {
    path: String,
    image: ImageData,
    fingerprint: AssetFingerprint,
}

impl AtlasBuilder {
    pub fn new(config: AtlasConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// `(image, metadata)` cache file paths for a set of `asset_count` assets.
    pub fn cache_files(&self, asset_count: usize) -> (PathBuf, PathBuf) {
        let dir = &self.config.cache_dir;
        (
            dir.join(format!("texture_atlas_{asset_count}.png")),
            dir.join(format!("texture_atlas_{asset_count}.meta")),
        )
    }

    /// Builds (or loads from cache) an atlas for `paths` and uploads it.
    ///
    /// The blank region is added implicitly and must not be requested.
    pub fn build<S, F, I, P>(&self, source: &S, paths: I, textures: &mut F) -> Result<TexturesAtlas, AtlasError>
    where
        S: AssetSource + ?Sized,
        F: TextureFactory + ?Sized,
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let requested = validate_paths(paths)?;

        match self.load_cached(source, &requested) {
            Ok((meta, rgba)) => {
                log::info!("texture atlas loaded from cache ({} textures)", requested.len());
                let texture = textures
                    .create_texture(meta.side, meta.side, &rgba)
                    .map_err(AtlasError::Upload)?;
                return Ok(TexturesAtlas::new(texture, meta.side, meta.regions, AtlasOrigin::Cached));
            }
            Err(CacheMiss::Absent) => {}
            Err(miss) => log::info!("texture atlas cache miss: {miss}"),
        }

        log::info!("building new texture atlas ({} textures)", requested.len());
        self.build_new(source, &requested, textures)
    }

    fn build_new<S, F>(
        &self,
        source: &S,
        requested: &BTreeSet<String>,
        textures: &mut F,
    ) -> Result<TexturesAtlas, AtlasError>
    where
        S: AssetSource + ?Sized,
        F: TextureFactory + ?Sized,
    {
        let padding = self.config.padding;
        let mut assets = load_assets(source, requested)?;

        // Largest first; stable, so equal areas keep path order.
        assets.sort_by_key(|a| std::cmp::Reverse(a.image.area()));

        let sizes: Vec<(u32, u32)> = assets.iter().map(|a| (a.image.width, a.image.height)).collect();
        let initial = packer::estimate_side(&sizes, padding, self.config.overhead);
        let (side, placements) = packer::pack(&sizes, padding, initial, self.config.max_side).ok_or(
            AtlasError::TooLarge { count: assets.len(), max: self.config.max_side },
        )?;
        log::info!("textures packed into {side}x{side} atlas");

        let mut rgba = vec![0u8; side as usize * side as usize * 4];
        let mut regions = BTreeMap::new();
        for (asset, p) in assets.iter().zip(&placements) {
            let src = asset.image.to_rgba().map_err(|source| AtlasError::Asset {
                path: asset.path.clone(),
                source,
            })?;
            blit(&mut rgba, side, &src, p.x, p.y, asset.image.width, asset.image.height);
            regions.insert(
                asset.path.clone(),
                AtlasRegion::from_pixels(p.x, p.y, asset.image.width, asset.image.height, side),
            );
        }

        let texture = textures
            .create_texture(side, side, &rgba)
            .map_err(AtlasError::Upload)?;

        let meta = AtlasMeta {
            side,
            padding,
            paths: assets.iter().map(|a| a.path.clone()).collect(),
            assets: assets.into_iter().map(|a| (a.path, a.fingerprint)).collect(),
            regions,
        };
        if let Err(e) = self.persist(requested.len(), &meta, &rgba) {
            log::warn!("failed to write texture atlas cache: {e}");
        }

        Ok(TexturesAtlas::new(texture, side, meta.regions, AtlasOrigin::Packed))
    }

    fn load_cached<S: AssetSource + ?Sized>(
        &self,
        source: &S,
        requested: &BTreeSet<String>,
    ) -> Result<(AtlasMeta, Vec<u8>), CacheMiss> {
        let (png_path, meta_path) = self.cache_files(requested.len());
        if !png_path.exists() || !meta_path.exists() {
            return Err(CacheMiss::Absent);
        }

        let text = std::fs::read_to_string(&meta_path).map_err(|_| CacheMiss::Absent)?;
        let meta = AtlasMeta::parse(&text)?;

        if meta.padding != self.config.padding {
            return Err(CacheMiss::Padding { cached: meta.padding, requested: self.config.padding });
        }

        let expected_paths = requested
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(BLANK_PATH));
        if !meta.paths.iter().map(String::as_str).eq(sorted(expected_paths)) {
            return Err(CacheMiss::AssetSet);
        }

        for path in &meta.paths {
            let Some(cached) = meta.assets.get(path) else {
                return Err(CacheMiss::NoMetadata(path.clone()));
            };
            if !meta.regions.contains_key(path) {
                return Err(CacheMiss::NoRegion(path.clone()));
            }
            if path == BLANK_PATH {
                continue;
            }
            let current = source
                .fingerprint(path)
                .map_err(|source| CacheMiss::Fingerprint { path: path.clone(), source })?;
            if &current != cached {
                return Err(CacheMiss::Changed(path.clone()));
            }
        }

        if !meta.side.is_power_of_two() {
            return Err(CacheMiss::Side(meta.side));
        }
        if meta.side > self.config.max_side {
            return Err(CacheMiss::ExceedsMax { side: meta.side, max: self.config.max_side });
        }

        let img = image::open(&png_path)?.to_rgba8();
        if img.width() != meta.side || img.height() != meta.side {
            return Err(CacheMiss::ImageSize { width: img.width(), height: img.height(), side: meta.side });
        }

        Ok((meta, img.into_raw()))
    }

    fn persist(&self, asset_count: usize, meta: &AtlasMeta, rgba: &[u8]) -> Result<(), AtlasError> {
        std::fs::create_dir_all(&self.config.cache_dir)?;
        let (png_path, meta_path) = self.cache_files(asset_count);

        image::save_buffer(&png_path, rgba, meta.side, meta.side, image::ExtendedColorType::Rgba8)?;
        std::fs::write(&meta_path, meta.to_text())?;
        log::debug!("texture atlas cached at {}", png_path.display());
        Ok(())
    }
}

fn sorted<'a>(it: impl Iterator<Item = &'a str>) -> impl Iterator<Item = &'a str> {
    it.collect::<BTreeSet<_>>().into_iter()
}

fn validate_paths<I, P>(paths: I) -> Result<BTreeSet<String>, AtlasError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<str>,
{
    let mut out = BTreeSet::new();
    for p in paths {
        let p = p.as_ref();
        if p == BLANK_PATH || p.contains([',', ';', '\n', '\r']) {
            return Err(AtlasError::ReservedPath(p.to_string()));
        }
        if !out.insert(p.to_string()) {
            return Err(AtlasError::DuplicateAsset(p.to_string()));
        }
    }
    Ok(out)
}

fn load_assets<S: AssetSource + ?Sized>(
    source: &S,
    requested: &BTreeSet<String>,
) -> Result<Vec<LoadedAsset>, AtlasError> {
    let mut assets = Vec::with_capacity(requested.len() + 1);
    assets.push(LoadedAsset {
        path: BLANK_PATH.to_string(),
        image: ImageData::blank(),
        fingerprint: AssetFingerprint::blank(),
    });

    for path in requested {
        let (image, fingerprint) = source
            .load_fingerprinted(path)
            .map_err(|source| AtlasError::Asset { path: path.clone(), source })?;
        if image.area() == 0 {
            return Err(AtlasError::EmptyAsset { path: path.clone(), width: image.width, height: image.height });
        }
        assets.push(LoadedAsset { path: path.clone(), image, fingerprint });
    }

    Ok(assets)
}

/// Copies a `w × h` RGBA image into the square `side` buffer at `(x, y)`.
fn blit(dst: &mut [u8], side: u32, src: &[u8], x: u32, y: u32, w: u32, h: u32) {
    let row = w as usize * 4;
    for r in 0..h as usize {
        let d = ((y as usize + r) * side as usize + x as usize) * 4;
        dst[d..d + row].copy_from_slice(&src[r * row..(r + 1) * row]);
    }
}
