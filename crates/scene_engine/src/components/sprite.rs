//! Sprite component
//!
//! A textured quad. On initialize the texture is resolved through the
//! resource loader and its atlas region is written into the owner's render
//! job. Shutting the sprite down retires that job.

use crate::components::{ComponentContext, ComponentError};
use crate::foundation::collections::TextureHandle;
use crate::foundation::math::Vec2;
use crate::render::UvRect;
use crate::serialization::{ArchiveResult, ArchiveWriter, Scope};

/// Textured quad drawn at the owner's global transform
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    texture_path: String,
    texture: Option<TextureHandle>,
    region: UvRect,
    uv_offset: Vec2,
    uv_scale: Vec2,
    uv_dirty: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            texture_path: String::new(),
            texture: None,
            region: UvRect::full(),
            uv_offset: Vec2::zeros(),
            uv_scale: Vec2::new(1.0, 1.0),
            uv_dirty: false,
        }
    }
}

impl Sprite {
    /// Sprite showing the texture at `texture_path`
    pub fn new(texture_path: impl Into<String>) -> Self {
        Self {
            texture_path: texture_path.into(),
            ..Default::default()
        }
    }

    /// Path of the texture
    pub fn texture_path(&self) -> &str {
        &self.texture_path
    }

    /// Loaded texture, shared by every clone of this sprite
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Atlas region of the whole texture
    pub fn region(&self) -> UvRect {
        self.region
    }

    /// Sample a sub-rectangle of the texture, in the texture's [0, 1] space
    pub fn set_uv_modifications(&mut self, offset: Vec2, scale: Vec2) {
        self.uv_offset = offset;
        self.uv_scale = scale;
        self.uv_dirty = true;
    }

    /// Atlas rectangle after UV modifications
    pub fn uv_rect(&self) -> UvRect {
        self.region.sub_rect(self.uv_offset, self.uv_scale)
    }

    pub(crate) fn initialize(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        if self.texture.is_none() && !self.texture_path.is_empty() {
            self.texture = Some(ctx.resources_mut().load_texture(&self.texture_path)?);
        }

        if let Some(handle) = self.texture {
            if let Some(info) = ctx.world().resources().texture(handle) {
                self.region = info.uv_rect;
            }
        }

        ctx.set_render_uv_rect(self.uv_rect());
        self.uv_dirty = false;
        Ok(())
    }

    pub(crate) fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        if self.uv_dirty {
            ctx.set_render_uv_rect(self.uv_rect());
            self.uv_dirty = false;
        }
    }

    pub(crate) fn shutdown(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.retire_render_job();
    }

    /// Write the texture path
    pub fn serialize(&self, writer: &mut ArchiveWriter) {
        writer.write_variable("texturePath", self.texture_path.as_str());
    }

    /// Read the texture path; the texture loads when the owner initializes
    pub fn deserialize(scope: &Scope) -> ArchiveResult<Self> {
        let path: String = scope.read_variable("texturePath")?;
        Ok(Self::new(path))
    }
}
