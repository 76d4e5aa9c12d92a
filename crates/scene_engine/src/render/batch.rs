//! # Instance Batch
//!
//! The frame's draw data handed to the renderer backend. All visible objects
//! share one quad and one atlas texture, so a frame is a single instanced draw:
//! the backend uploads [`InstanceBatch::as_bytes`] as the per-instance
//! attribute stream and draws `instance_count()` quads.

use crate::foundation::math::{Mat3, Vec4};
use crate::render::render_job::UvRect;
use bytemuck::{Pod, Zeroable};

/// Errors reported by a renderer backend
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The backend failed to submit the frame
    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend has not been initialized or has lost its context
    #[error("Renderer backend unavailable: {0}")]
    Unavailable(String),
}

/// Per-instance attribute data, laid out for direct upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Global transform, column-major
    pub transform: [[f32; 3]; 3],
    /// `[offset.x, offset.y, scale.x, scale.y]` into the atlas
    pub uv_rect: [f32; 4],
    /// RGBA color multiplied with the sampled texel
    pub tint: [f32; 4],
}

impl InstanceData {
    /// Pack a transform, UV rectangle and tint
    pub fn new(transform: &Mat3, uv_rect: &UvRect, tint: &Vec4) -> Self {
        Self {
            transform: (*transform).into(),
            uv_rect: uv_rect.to_array(),
            tint: [tint.x, tint.y, tint.z, tint.w],
        }
    }
}

/// All instances for one frame plus the camera used to view them
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    camera_matrix: Mat3,
    instances: Vec<InstanceData>,
}

impl InstanceBatch {
    /// Create a batch
    pub fn new(camera_matrix: Mat3, instances: Vec<InstanceData>) -> Self {
        Self {
            camera_matrix,
            instances,
        }
    }

    /// Projection * view of the main camera (identity when there is none)
    pub fn camera_matrix(&self) -> &Mat3 {
        &self.camera_matrix
    }

    /// Per-instance records in draw order
    pub fn instances(&self) -> &[InstanceData] {
        &self.instances
    }

    /// Number of quads to draw
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Raw bytes of the instance stream
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Renderer backend fed by the engine once per frame
///
/// Implementations own the GPU state (buffers, shaders, the atlas texture) and
/// issue one instanced draw for the whole batch.
pub trait RenderBackend {
    /// Draw every instance of the batch
    fn draw_instanced(&mut self, batch: &InstanceBatch) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat3Ext, Vec2, Vec3, Vec4};

    #[test]
    fn test_instance_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 17 * std::mem::size_of::<f32>());
    }

    #[test]
    fn test_instance_data_is_column_major() {
        let transform = Mat3::translation_2d(&Vec3::new(3.0, 4.0, 0.0));
        let uv = UvRect::new(Vec2::new(0.25, 0.5), Vec2::new(0.125, 0.0625));
        let data = InstanceData::new(&transform, &uv, &Vec4::new(1.0, 0.5, 0.25, 0.75));

        assert_eq!(data.transform[2], [3.0, 4.0, 1.0]);
        assert_eq!(data.uv_rect, [0.25, 0.5, 0.125, 0.0625]);
        assert_eq!(data.tint, [1.0, 0.5, 0.25, 0.75]);
    }

    #[test]
    fn test_batch_bytes_cover_all_instances() {
        let data = InstanceData::new(&Mat3::identity(), &UvRect::full(), &Vec4::repeat(1.0));
        let batch = InstanceBatch::new(Mat3::identity(), vec![data; 3]);
        assert_eq!(batch.as_bytes().len(), 3 * std::mem::size_of::<InstanceData>());
    }
}
