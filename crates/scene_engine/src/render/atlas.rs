//! Shelf-packing allocator for the shared texture atlas
//!
//! Textures are placed left to right on horizontal shelves; a new shelf opens
//! below the tallest texture of the current one when a row is full. Regions are
//! never freed individually, the whole atlas is reset instead.

use crate::foundation::math::Vec2;
use crate::render::render_job::UvRect;

/// Texel rectangle inside the atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRegion {
    /// Left edge in texels
    pub x: u32,
    /// Top edge in texels
    pub y: u32,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
}

/// Shelf allocator
#[derive(Debug, Clone)]
pub struct AtlasAllocator {
    width: u32,
    height: u32,
    cursor_x: u32,
    shelf_y: u32,
    shelf_height: u32,
}

impl AtlasAllocator {
    /// Create an empty atlas of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cursor_x: 0,
            shelf_y: 0,
            shelf_height: 0,
        }
    }

    /// Atlas width in texels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Atlas height in texels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reserve space for a `width` x `height` texture
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<AtlasRegion> {
        if width > self.width || height > self.height {
            return None;
        }

        // Placement is computed first and committed only if it fits
        let (x, y, shelf_height) = if self.cursor_x + width > self.width {
            (0, self.shelf_y + self.shelf_height, 0)
        } else {
            (self.cursor_x, self.shelf_y, self.shelf_height)
        };

        if y + height > self.height {
            return None;
        }

        self.cursor_x = x + width;
        self.shelf_y = y;
        self.shelf_height = shelf_height.max(height);
        Some(AtlasRegion { x, y, width, height })
    }

    /// Normalized UV rectangle of a region
    pub fn uv_rect(&self, region: &AtlasRegion) -> UvRect {
        let atlas_width = self.width as f32;
        let atlas_height = self.height as f32;
        UvRect::new(
            Vec2::new(region.x as f32 / atlas_width, region.y as f32 / atlas_height),
            Vec2::new(region.width as f32 / atlas_width, region.height as f32 / atlas_height),
        )
    }

    /// Forget every allocation
    pub fn reset(&mut self) {
        self.cursor_x = 0;
        self.shelf_y = 0;
        self.shelf_height = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_shelf_then_wraps() {
        let mut atlas = AtlasAllocator::new(100, 100);
        let a = atlas.allocate(60, 20).unwrap();
        let b = atlas.allocate(30, 40).unwrap();
        let c = atlas.allocate(50, 10).unwrap();

        assert_eq!((a.x, a.y), (0, 0));
        assert_eq!((b.x, b.y), (60, 0));
        // Next shelf starts below the tallest texture of the first
        assert_eq!((c.x, c.y), (0, 40));
    }

    #[test]
    fn test_rejects_when_full() {
        let mut atlas = AtlasAllocator::new(64, 64);
        assert!(atlas.allocate(65, 1).is_none());
        assert!(atlas.allocate(64, 64).is_some());
        assert!(atlas.allocate(1, 1).is_none());

        atlas.reset();
        assert!(atlas.allocate(1, 1).is_some());
    }

    #[test]
    fn test_failed_wrap_keeps_current_shelf() {
        let mut atlas = AtlasAllocator::new(100, 100);
        atlas.allocate(60, 60).unwrap();

        // Needs a new shelf, which has no room left below
        assert!(atlas.allocate(50, 50).is_none());

        let fits = atlas.allocate(30, 30).unwrap();
        assert_eq!((fits.x, fits.y), (60, 0));
    }

    #[test]
    fn test_uv_rect_is_normalized() {
        let mut atlas = AtlasAllocator::new(256, 128);
        atlas.allocate(64, 32).unwrap();
        let region = atlas.allocate(64, 32).unwrap();
        let uv = atlas.uv_rect(&region);

        assert_eq!(uv.offset, Vec2::new(0.25, 0.0));
        assert_eq!(uv.scale, Vec2::new(0.25, 0.25));
    }
}
