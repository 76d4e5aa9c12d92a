//! Resource Manager - texture lookup and atlas placement
//!
//! **SEPARATION OF CONCERNS**:
//! - ResourceLoader: resolves a path to a stable handle, caches by path
//! - Renderer backend: uploads pixels and owns the GPU atlas texture
//! - Components: hold handles only, never pixel data
//!
//! The bundled [`ResourceManager`] reads only image headers. It sizes each
//! texture (from a registered size or the file on disk) and reserves its
//! region in the shared atlas so sprites can fill their UV rectangles.

use crate::foundation::collections::{HandleMap, TextureHandle};
use crate::render::atlas::{AtlasAllocator, AtlasRegion};
use crate::render::render_job::UvRect;
use std::collections::HashMap;
use thiserror::Error;

/// Resource loading errors
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The image header could not be read
    #[error("Failed to read image '{path}': {source}")]
    Image {
        /// Requested path
        path: String,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },

    /// No room left in the texture atlas
    #[error("Texture atlas full: cannot place '{path}' ({width}x{height})")]
    AtlasFull {
        /// Requested path
        path: String,
        /// Texture width
        width: u32,
        /// Texture height
        height: u32,
    },
}

/// Metadata for a loaded texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    /// Path the texture was requested with
    pub path: String,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Placement inside the atlas
    pub region: AtlasRegion,
    /// Normalized atlas rectangle
    pub uv_rect: UvRect,
}

/// Resolves resource paths to handles
///
/// The core never interprets file formats; it only asks for a handle and the
/// atlas rectangle the texture ended up in.
pub trait ResourceLoader {
    /// Load (or fetch from cache) the texture at `path`
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, ResourceError>;

    /// Metadata of a loaded texture
    fn texture(&self, handle: TextureHandle) -> Option<&TextureInfo>;
}

/// Default loader: path cache plus shelf-packed atlas
#[derive(Debug)]
pub struct ResourceManager {
    textures: HandleMap<TextureHandle, TextureInfo>,
    by_path: HashMap<String, TextureHandle>,
    registered_sizes: HashMap<String, (u32, u32)>,
    atlas: AtlasAllocator,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new(2048, 2048)
    }
}

impl ResourceManager {
    /// Create a manager with an atlas of the given size
    pub fn new(atlas_width: u32, atlas_height: u32) -> Self {
        Self {
            textures: HandleMap::with_key(),
            by_path: HashMap::new(),
            registered_sizes: HashMap::new(),
            atlas: AtlasAllocator::new(atlas_width, atlas_height),
        }
    }

    /// Declare the size of a texture that is not read from disk
    /// (generated textures, or pixels supplied by the backend)
    pub fn register_texture_size(&mut self, path: impl Into<String>, width: u32, height: u32) {
        self.registered_sizes.insert(path.into(), (width, height));
    }

    /// Number of distinct textures loaded
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// The atlas allocator
    pub fn atlas(&self) -> &AtlasAllocator {
        &self.atlas
    }

    fn texture_size(&self, path: &str) -> Result<(u32, u32), ResourceError> {
        if let Some(size) = self.registered_sizes.get(path) {
            return Ok(*size);
        }

        image::image_dimensions(path).map_err(|source| ResourceError::Image {
            path: path.to_string(),
            source,
        })
    }
}

impl ResourceLoader for ResourceManager {
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, ResourceError> {
        if let Some(handle) = self.by_path.get(path) {
            return Ok(*handle);
        }

        let (width, height) = self.texture_size(path)?;
        let region = self
            .atlas
            .allocate(width, height)
            .ok_or_else(|| ResourceError::AtlasFull {
                path: path.to_string(),
                width,
                height,
            })?;
        let uv_rect = self.atlas.uv_rect(&region);

        let handle = self.textures.insert(TextureInfo {
            path: path.to_string(),
            width,
            height,
            region,
            uv_rect,
        });
        self.by_path.insert(path.to_string(), handle);
        log::debug!("Loaded texture '{}' ({}x{}) at {:?}", path, width, height, region);
        Ok(handle)
    }

    fn texture(&self, handle: TextureHandle) -> Option<&TextureInfo> {
        self.textures.get(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;

    #[test]
    fn test_same_path_returns_cached_handle() {
        let mut manager = ResourceManager::new(128, 128);
        manager.register_texture_size("player.png", 32, 32);

        let first = manager.load_texture("player.png").unwrap();
        let second = manager.load_texture("player.png").unwrap();

        assert_eq!(first, second);
        assert_eq!(manager.texture_count(), 1);
    }

    #[test]
    fn test_textures_get_distinct_regions() {
        let mut manager = ResourceManager::new(128, 64);
        manager.register_texture_size("a.png", 64, 64);
        manager.register_texture_size("b.png", 32, 32);

        let a = manager.load_texture("a.png").unwrap();
        let b = manager.load_texture("b.png").unwrap();

        assert_eq!(manager.texture(a).unwrap().uv_rect.offset, Vec2::new(0.0, 0.0));
        assert_eq!(manager.texture(b).unwrap().uv_rect.offset, Vec2::new(0.5, 0.0));
        assert_eq!(manager.texture(b).unwrap().uv_rect.scale, Vec2::new(0.25, 0.5));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut manager = ResourceManager::default();
        let result = manager.load_texture("does/not/exist.png");
        assert!(matches!(result, Err(ResourceError::Image { .. })));
    }

    #[test]
    fn test_atlas_overflow_is_an_error() {
        let mut manager = ResourceManager::new(16, 16);
        manager.register_texture_size("huge.png", 32, 32);
        let result = manager.load_texture("huge.png");
        assert!(matches!(result, Err(ResourceError::AtlasFull { .. })));
    }
}
