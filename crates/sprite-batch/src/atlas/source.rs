use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use sha2::{Digest, Sha256};

/// Decoded 8-bit image in its source channel layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// 1 (grey), 2 (grey + alpha), 3 (RGB) or 4 (RGBA).
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Self {
        Self { width, height, channels, pixels }
    }

    /// A `width × height` RGBA image filled with `rgba`.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat((width * height) as usize);
        Self::new(width, height, 4, pixels)
    }

    /// The 1×1 opaque white image backing solid geometry.
    pub fn blank() -> Self {
        Self::solid(1, 1, [255, 255, 255, 255])
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Keeps 8-bit layouts as they are; anything else is converted to RGB or RGBA.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        match img {
            DynamicImage::ImageLuma8(b) => Self::new(width, height, 1, b.into_raw()),
            DynamicImage::ImageLumaA8(b) => Self::new(width, height, 2, b.into_raw()),
            DynamicImage::ImageRgb8(b) => Self::new(width, height, 3, b.into_raw()),
            DynamicImage::ImageRgba8(b) => Self::new(width, height, 4, b.into_raw()),
            other if other.color().has_alpha() => {
                Self::new(width, height, 4, other.to_rgba8().into_raw())
            }
            other => Self::new(width, height, 3, other.to_rgb8().into_raw()),
        }
    }

    /// Expands to tightly packed RGBA8. Missing alpha becomes 255.
    ///
    /// Fails when the pixel buffer is shorter than the header promises.
    pub fn to_rgba(&self) -> Result<Vec<u8>> {
        let n = (self.width * self.height) as usize;
        let ch = self.channels as usize;
        if !(1..=4).contains(&ch) {
            return Err(anyhow!("unsupported channel count {ch}"));
        }
        if self.pixels.len() < n * ch {
            return Err(anyhow!(
                "pixel buffer holds {} bytes, {}x{}x{ch} needs {}",
                self.pixels.len(),
                self.width,
                self.height,
                n * ch
            ));
        }

        if ch == 4 {
            return Ok(self.pixels[..n * 4].to_vec());
        }

        let src = &self.pixels[..n * ch];
        let mut out = Vec::with_capacity(n * 4);
        match ch {
            1 => src.iter().for_each(|&l| out.extend_from_slice(&[l, l, l, 255])),
            2 => src
                .chunks_exact(2)
                .for_each(|p| out.extend_from_slice(&[p[0], p[0], p[0], p[1]])),
            _ => src
                .chunks_exact(3)
                .for_each(|p| out.extend_from_slice(&[p[0], p[1], p[2], 255])),
        }
        Ok(out)
    }
}

/// Content identity of an asset, recorded in the atlas cache.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AssetFingerprint {
    /// Hex SHA-256 of the asset bytes.
    pub hash: String,
    /// Modification time, milliseconds since the Unix epoch.
    pub modified: u64,
}

impl AssetFingerprint {
    /// Fingerprint recorded for the blank region.
    pub fn blank() -> Self {
        Self { hash: "blank".to_string(), modified: 0 }
    }
}

/// Resolves logical asset paths to pixels.
///
/// Used both by the atlas builder and for standalone texture loads.
pub trait AssetSource {
    fn load(&self, path: &str) -> Result<ImageData>;

    fn fingerprint(&self, path: &str) -> Result<AssetFingerprint>;

    /// The image together with the fingerprint of exactly the content that
    /// was decoded. Sources whose content can change between calls override
    /// this to read once.
    fn load_fingerprinted(&self, path: &str) -> Result<(ImageData, AssetFingerprint)> {
        let fingerprint = self.fingerprint(path)?;
        Ok((self.load(path)?, fingerprint))
    }

    /// Reads a UTF-8 side file (e.g. a sprite sheet description).
    /// `Ok(None)` when it does not exist.
    fn read_text(&self, _path: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

impl<T: AssetSource + ?Sized> AssetSource for &T {
    fn load(&self, path: &str) -> Result<ImageData> {
        (**self).load(path)
    }

    fn fingerprint(&self, path: &str) -> Result<AssetFingerprint> {
        (**self).fingerprint(path)
    }

    fn load_fingerprinted(&self, path: &str) -> Result<(ImageData, AssetFingerprint)> {
        (**self).load_fingerprinted(path)
    }

    fn read_text(&self, path: &str) -> Result<Option<String>> {
        (**self).read_text(path)
    }
}

/// Image files below a root directory; logical paths are relative to it.
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// File bytes and a fingerprint of those bytes. The timestamp is taken
    /// first, so a write racing the read shows up as a newer stamp later.
    fn read_fingerprinted(&self, full: &Path) -> Result<(Vec<u8>, AssetFingerprint)> {
        let modified = std::fs::metadata(full)
            .and_then(|m| m.modified())
            .with_context(|| format!("stat {}", full.display()))?;
        let modified = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let bytes = std::fs::read(full).with_context(|| format!("reading {}", full.display()))?;
        let hash = sha256_hex(&bytes);
        Ok((bytes, AssetFingerprint { hash, modified }))
    }
}

fn decode(full: &Path, bytes: &[u8]) -> Result<ImageData> {
    let img = image::load_from_memory(bytes).with_context(|| format!("decoding {}", full.display()))?;
    Ok(ImageData::from_dynamic(img))
}

impl AssetSource for DirAssetSource {
    fn load(&self, path: &str) -> Result<ImageData> {
        let full = self.resolve(path);
        let bytes = std::fs::read(&full).with_context(|| format!("reading {}", full.display()))?;
        decode(&full, &bytes)
    }

    fn fingerprint(&self, path: &str) -> Result<AssetFingerprint> {
        Ok(self.read_fingerprinted(&self.resolve(path))?.1)
    }

    fn load_fingerprinted(&self, path: &str) -> Result<(ImageData, AssetFingerprint)> {
        let full = self.resolve(path);
        let (bytes, fingerprint) = self.read_fingerprinted(&full)?;
        Ok((decode(&full, &bytes)?, fingerprint))
    }

    fn read_text(&self, path: &str) -> Result<Option<String>> {
        let full = self.resolve(path);
        match std::fs::read_to_string(&full) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", full.display())),
        }
    }
}

/// Images held in memory. Every `insert` bumps the recorded modification stamp.
#[derive(Debug, Default)]
pub struct MemoryAssetSource {
    images: HashMap<String, (ImageData, u64)>,
    texts: HashMap<String, String>,
    revision: u64,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, image: ImageData) {
        self.revision += 1;
        self.images.insert(path.into(), (image, self.revision));
    }

    pub fn insert_text(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(path.into(), text.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<ImageData> {
        self.images.remove(path).map(|(img, _)| img)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn entry(&self, path: &str) -> Result<&(ImageData, u64)> {
        self.images
            .get(path)
            .ok_or_else(|| anyhow!("no in-memory asset `{path}`"))
    }
}

impl AssetSource for MemoryAssetSource {
    fn load(&self, path: &str) -> Result<ImageData> {
        Ok(self.entry(path)?.0.clone())
    }

    fn fingerprint(&self, path: &str) -> Result<AssetFingerprint> {
        let (img, revision) = self.entry(path)?;
        let mut hasher = Sha256::new();
        hasher.update(img.width.to_le_bytes());
        hasher.update(img.height.to_le_bytes());
        hasher.update([img.channels]);
        hasher.update(&img.pixels);
        Ok(AssetFingerprint { hash: format!("{:x}", hasher.finalize()), modified: *revision })
    }

    fn read_text(&self, path: &str) -> Result<Option<String>> {
        Ok(self.texts.get(path).cloned())
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_rgba_expands_channels() {
        let grey = ImageData::new(1, 1, 1, vec![7]);
        assert_eq!(grey.to_rgba().unwrap(), vec![7, 7, 7, 255]);

        let grey_alpha = ImageData::new(1, 1, 2, vec![7, 9]);
        assert_eq!(grey_alpha.to_rgba().unwrap(), vec![7, 7, 7, 9]);

        let rgb = ImageData::new(2, 1, 3, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(rgb.to_rgba().unwrap(), vec![1, 2, 3, 255, 4, 5, 6, 255]);

        let rgba = ImageData::solid(1, 1, [1, 2, 3, 4]);
        assert_eq!(rgba.to_rgba().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn to_rgba_rejects_short_buffers() {
        let img = ImageData::new(2, 2, 3, vec![0; 5]);
        assert!(img.to_rgba().is_err());
    }

    #[test]
    fn sha256_hex_matches_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn memory_fingerprint_tracks_content_and_revision() {
        let mut src = MemoryAssetSource::new();
        src.insert("a.png", ImageData::solid(2, 2, [1, 1, 1, 255]));
        let first = src.fingerprint("a.png").unwrap();

        src.insert("a.png", ImageData::solid(2, 2, [1, 1, 1, 255]));
        let same_pixels = src.fingerprint("a.png").unwrap();
        assert_eq!(first.hash, same_pixels.hash);
        assert_ne!(first.modified, same_pixels.modified);

        src.insert("a.png", ImageData::solid(3, 2, [1, 1, 1, 255]));
        assert_ne!(src.fingerprint("a.png").unwrap().hash, first.hash);
        assert!(src.load("missing.png").is_err());
    }

    #[test]
    fn fingerprint_hashes_the_bytes_that_were_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255])).save(&path).unwrap();
        let src = DirAssetSource::new(dir.path());

        let (img, fp) = src.load_fingerprinted("tile.png").unwrap();
        let original = std::fs::read(&path).unwrap();
        assert_eq!(fp.hash, sha256_hex(&original));
        assert_eq!(&img.pixels[..4], &[1, 2, 3, 255]);

        image::RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255])).save(&path).unwrap();
        let (img, fp) = src.load_fingerprinted("tile.png").unwrap();
        assert_eq!(fp.hash, sha256_hex(&std::fs::read(&path).unwrap()));
        assert_ne!(fp.hash, sha256_hex(&original));
        assert_eq!(&img.pixels[..4], &[9, 9, 9, 255]);
    }

    #[test]
    fn dir_source_decodes_png_and_fingerprints_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        img.save(dir.path().join("tile.png")).unwrap();

        let src = DirAssetSource::new(dir.path());
        let data = src.load("tile.png").unwrap();
        assert_eq!((data.width, data.height, data.channels), (3, 2, 3));
        assert_eq!(&data.to_rgba().unwrap()[..4], &[10, 20, 30, 255]);

        let bytes = std::fs::read(dir.path().join("tile.png")).unwrap();
        let fp = src.fingerprint("tile.png").unwrap();
        assert_eq!(fp.hash, sha256_hex(&bytes));
        assert!(fp.modified > 0);
        assert!(src.fingerprint("nope.png").is_err());

        let (decoded, decoded_fp) = src.load_fingerprinted("tile.png").unwrap();
        assert_eq!(decoded, data);
        assert_eq!(decoded_fp, fp);

        std::fs::write(dir.path().join("tile.sprite.json"), "{}").unwrap();
        assert_eq!(src.read_text("tile.sprite.json").unwrap().as_deref(), Some("{}"));
        assert_eq!(src.read_text("other.sprite.json").unwrap(), None);
    }
}
