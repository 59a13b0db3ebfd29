use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::atlas::{AssetSource, AtlasBuilder, AtlasError, TexturesAtlas};
use crate::batch::TextureFactory;

use super::{sprite_config_path, AnimatedTexture, SpriteConfig, SpriteDefinition, Texture};

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("cannot register `{0}`: atlas already built")]
    Frozen(String),

    #[error("`{0}` is already registered")]
    AlreadyRegistered(String),

    #[error("atlas not built yet")]
    NotBuilt,

    #[error("atlas already built")]
    AlreadyBuilt,

    #[error("`{0}` is not registered in the atlas")]
    NotRegistered(String),

    #[error(transparent)]
    Atlas(#[from] AtlasError),

    #[error("failed to load texture `{path}`")]
    Asset {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to upload texture `{path}`")]
    Upload {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

struct AtlasEntry {
    texture: Texture,
    sprite: Option<Arc<SpriteDefinition>>,
}

/// Maps logical paths to drawable textures.
///
/// Paths registered before [`build_atlas`](Self::build_atlas) resolve to
/// atlas regions. Any other path is loaded on first use as a standalone
/// texture and memoised. Registration is frozen once the atlas exists.
pub struct TextureRegistry<A: AssetSource> {
    source: A,
    registered: BTreeSet<String>,
    atlas: Option<TexturesAtlas>,
    entries: HashMap<String, AtlasEntry>,
    singles: HashMap<String, Texture>,
}

impl<A: AssetSource> TextureRegistry<A> {
    pub fn new(source: A) -> Self {
        Self {
            source,
            registered: BTreeSet::new(),
            atlas: None,
            entries: HashMap::new(),
            singles: HashMap::new(),
        }
    }

    #[inline]
    pub fn source(&self) -> &A {
        &self.source
    }

    pub fn register_for_atlas(&mut self, path: impl Into<String>) -> Result<(), RegistryError> {
        let path = path.into();
        if self.atlas.is_some() {
            return Err(RegistryError::Frozen(path));
        }
        if self.registered.contains(&path) {
            return Err(RegistryError::AlreadyRegistered(path));
        }
        self.registered.insert(path);
        Ok(())
    }

    #[inline]
    pub fn is_registered(&self, path: &str) -> bool {
        self.registered.contains(path)
    }

    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.registered.iter().map(String::as_str)
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.atlas.is_some()
    }

    #[inline]
    pub fn atlas(&self) -> Option<&TexturesAtlas> {
        self.atlas.as_ref()
    }

    /// Packs every registered path and freezes registration.
    pub fn build_atlas<F: TextureFactory + ?Sized>(
        &mut self,
        builder: &AtlasBuilder,
        textures: &mut F,
    ) -> Result<(), RegistryError> {
        if self.atlas.is_some() {
            return Err(RegistryError::AlreadyBuilt);
        }

        let (atlas, entries) = self.define_atlas(builder, textures)?;
        log::info!(
            "texture atlas created: {}x{}, textures: {}",
            atlas.width(),
            atlas.height(),
            atlas.len()
        );
        self.atlas = Some(atlas);
        self.entries = entries;
        Ok(())
    }

    /// Builds the atlas again from the registered paths, then releases the
    /// previous atlas texture. Handles obtained before the reload are stale.
    ///
    /// On failure the previous atlas stays in place.
    pub fn reload<F: TextureFactory + ?Sized>(
        &mut self,
        builder: &AtlasBuilder,
        textures: &mut F,
    ) -> Result<(), RegistryError> {
        if self.atlas.is_none() {
            return Err(RegistryError::NotBuilt);
        }

        log::info!("reloading texture atlas");
        let (atlas, entries) = self.define_atlas(builder, textures)?;
        log::info!("texture atlas reloaded: {}x{}, textures: {}", atlas.width(), atlas.height(), atlas.len());

        if let Some(old) = self.atlas.replace(atlas) {
            textures.release_texture(old.texture_id());
        }
        self.entries = entries;
        Ok(())
    }

    fn define_atlas<F: TextureFactory + ?Sized>(
        &self,
        builder: &AtlasBuilder,
        textures: &mut F,
    ) -> Result<(TexturesAtlas, HashMap<String, AtlasEntry>), RegistryError> {
        let atlas = builder.build(&self.source, &self.registered, textures)?;

        let mut entries = HashMap::with_capacity(self.registered.len());
        for path in &self.registered {
            let region = atlas.region(path);
            let texture = Texture::from_region(&atlas, &region);
            let sprite = self
                .sprite_config(path)
                .and_then(|cfg| {
                    SpriteDefinition::for_atlas(path, &atlas, Some(&cfg))
                        .map_err(|e| log::warn!("sprite ignored, drawing static texture: {e}"))
                        .ok()
                })
                .filter(SpriteDefinition::is_animated)
                .map(Arc::new);

            entries.insert(path.clone(), AtlasEntry { texture, sprite });
        }

        Ok((atlas, entries))
    }

    fn sprite_config(&self, path: &str) -> Option<SpriteConfig> {
        let config_path = sprite_config_path(path);
        let text = match self.source.read_text(&config_path) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("failed to read sprite config for {path}: {e:#}");
                return None;
            }
        };

        match SpriteConfig::from_json_str(&text) {
            Ok(cfg) if !cfg.frames.is_empty() => Some(cfg),
            Ok(_) => None,
            Err(e) => {
                log::warn!("failed to parse sprite config for {path}: {e}");
                None
            }
        }
    }

    /// Resolves `path`: its atlas region when registered and built, otherwise
    /// a standalone texture loaded once and memoised.
    pub fn get<F: TextureFactory + ?Sized>(
        &mut self,
        path: &str,
        textures: &mut F,
    ) -> Result<Texture, RegistryError> {
        if self.atlas.is_some() && self.registered.contains(path) {
            return self.get_from_atlas(path);
        }
        self.get_single(path, textures)
    }

    /// Atlas-only lookup; never loads anything.
    pub fn get_from_atlas(&self, path: &str) -> Result<Texture, RegistryError> {
        if self.atlas.is_none() {
            return Err(RegistryError::NotBuilt);
        }
        self.entries
            .get(path)
            .map(|e| e.texture)
            .ok_or_else(|| RegistryError::NotRegistered(path.to_string()))
    }

    fn get_single<F: TextureFactory + ?Sized>(
        &mut self,
        path: &str,
        textures: &mut F,
    ) -> Result<Texture, RegistryError> {
        if let Some(t) = self.singles.get(path) {
            return Ok(*t);
        }

        let image = self.source.load(path).map_err(|source| RegistryError::Asset {
            path: path.to_string(),
            source,
        })?;
        let rgba = image.to_rgba().map_err(|source| RegistryError::Asset {
            path: path.to_string(),
            source,
        })?;
        let id = textures
            .create_texture(image.width, image.height, &rgba)
            .map_err(|source| RegistryError::Upload { path: path.to_string(), source })?;

        log::debug!("loaded standalone texture {path} as {id}");
        let texture = Texture::standalone(id, image.width, image.height);
        self.singles.insert(path.to_string(), texture);
        Ok(texture)
    }

    /// Fresh animation state for a registered sprite sheet, if `path` has one.
    pub fn animation(&self, path: &str) -> Option<AnimatedTexture> {
        let entry = self.entries.get(path)?;
        let def = entry.sprite.as_ref()?;
        Some(AnimatedTexture::new(entry.texture, Arc::clone(def)))
    }

    pub fn sprite(&self, path: &str) -> Option<&SpriteDefinition> {
        self.entries.get(path)?.sprite.as_deref()
    }

    /// The 1×1 white atlas region used for solid geometry.
    pub fn blank(&self) -> Result<Texture, RegistryError> {
        let atlas = self.atlas.as_ref().ok_or(RegistryError::NotBuilt)?;
        Ok(Texture::from_region(atlas, &atlas.blank()))
    }

    /// Releases every GPU texture this registry created. Registered paths are
    /// kept and registration is open again.
    pub fn release_all<F: TextureFactory + ?Sized>(&mut self, textures: &mut F) {
        if let Some(atlas) = self.atlas.take() {
            textures.release_texture(atlas.texture_id());
        }
        for (_, t) in self.singles.drain() {
            textures.release_texture(t.id);
        }
        self.entries.clear();
    }
}
