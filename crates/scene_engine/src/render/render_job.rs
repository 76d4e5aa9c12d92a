//! Render jobs: the per-object records the renderer backend consumes
//!
//! Every visible object owns one [`RenderJob`] in the [`RenderQueue`]. The
//! object's Transform writes its global matrix into the job each update and the
//! Sprite/Animator write the UV rectangle. Particle emitters own one job per
//! live particle and also set its tint. Retiring a job only clears its
//! matrix; the queue removes retired jobs lazily during the next
//! [`RenderQueue::build_batch`] sweep.

use crate::foundation::collections::{HandleMap, RenderJobId};
use crate::foundation::math::{Mat3, Vec2, Vec4};
use crate::render::batch::{InstanceBatch, InstanceData};

/// Rectangle inside the shared texture atlas, in normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    /// Top-left offset (x, y)
    pub offset: Vec2,
    /// Size (z, w in the packed form)
    pub scale: Vec2,
}

impl Default for UvRect {
    fn default() -> Self {
        Self::full()
    }
}

impl UvRect {
    /// The whole atlas
    pub fn full() -> Self {
        Self {
            offset: Vec2::new(0.0, 0.0),
            scale: Vec2::new(1.0, 1.0),
        }
    }

    /// Create a rectangle from offset and scale
    pub fn new(offset: Vec2, scale: Vec2) -> Self {
        Self { offset, scale }
    }

    /// Sub-rectangle of this one, expressed in this rectangle's local [0, 1] space
    pub fn sub_rect(&self, offset: Vec2, scale: Vec2) -> Self {
        Self {
            offset: self.offset + self.scale.component_mul(&offset),
            scale: self.scale.component_mul(&scale),
        }
    }

    /// Packed `[offset.x, offset.y, scale.x, scale.y]` layout used by the shader
    pub fn to_array(&self) -> [f32; 4] {
        [self.offset.x, self.offset.y, self.scale.x, self.scale.y]
    }
}

/// Per-object draw record
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    /// Global transform snapshot; `None` marks the job as retired
    pub transformation: Option<Mat3>,
    /// Region of the atlas to sample
    pub uv_rect: UvRect,
    /// RGBA color multiplier
    pub tint: Vec4,
}

impl Default for RenderJob {
    fn default() -> Self {
        Self {
            transformation: Some(Mat3::identity()),
            uv_rect: UvRect::full(),
            tint: Vec4::repeat(1.0),
        }
    }
}

impl RenderJob {
    /// Whether the job has been retired
    pub fn is_retired(&self) -> bool {
        self.transformation.is_none()
    }
}

/// Ordered collection of render jobs drained once per frame
#[derive(Debug, Default)]
pub struct RenderQueue {
    jobs: HandleMap<RenderJobId, RenderJob>,
    order: Vec<RenderJobId>,
}

impl RenderQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new job with an identity transform, the full atlas as UV rect
    /// and a white tint
    pub fn acquire(&mut self) -> RenderJobId {
        let id = self.jobs.insert(RenderJob::default());
        self.order.push(id);
        log::trace!("Acquired render job {:?}", id);
        id
    }

    /// Look up a job
    pub fn get(&self, id: RenderJobId) -> Option<&RenderJob> {
        self.jobs.get(id)
    }

    /// Look up a job mutably
    pub fn get_mut(&mut self, id: RenderJobId) -> Option<&mut RenderJob> {
        self.jobs.get_mut(id)
    }

    /// Store a transform snapshot. Retired or swept jobs are left untouched.
    pub fn set_transformation(&mut self, id: RenderJobId, transformation: Mat3) -> bool {
        match self.jobs.get_mut(id) {
            Some(job) if !job.is_retired() => {
                job.transformation = Some(transformation);
                true
            }
            _ => false,
        }
    }

    /// Set the UV rectangle of a job
    pub fn set_uv_rect(&mut self, id: RenderJobId, uv_rect: UvRect) -> bool {
        match self.jobs.get_mut(id) {
            Some(job) => {
                job.uv_rect = uv_rect;
                true
            }
            None => false,
        }
    }

    /// Set the color multiplier of a job
    pub fn set_tint(&mut self, id: RenderJobId, tint: Vec4) -> bool {
        match self.jobs.get_mut(id) {
            Some(job) => {
                job.tint = tint;
                true
            }
            None => false,
        }
    }

    /// Mark a job for removal. The job stays in the queue until the next sweep.
    pub fn retire(&mut self, id: RenderJobId) {
        if let Some(job) = self.jobs.get_mut(id) {
            job.transformation = None;
            log::trace!("Retired render job {:?}", id);
        }
    }

    /// Number of jobs in the queue, retired ones included
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the queue holds no jobs
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of jobs that will be drawn
    pub fn active_count(&self) -> usize {
        self.jobs.values().filter(|job| !job.is_retired()).count()
    }

    /// Sweep retired jobs and collect the remaining ones into an instance batch
    pub fn build_batch(&mut self, camera_matrix: Mat3) -> InstanceBatch {
        let jobs = &mut self.jobs;
        let mut swept = 0usize;
        self.order.retain(|id| {
            let retired = jobs.get(*id).map_or(true, RenderJob::is_retired);
            if retired {
                jobs.remove(*id);
                swept += 1;
            }
            !retired
        });

        if swept > 0 {
            log::debug!("Swept {} retired render jobs", swept);
        }

        let instances = self
            .order
            .iter()
            .filter_map(|id| self.jobs.get(*id))
            .filter_map(|job| {
                job.transformation
                    .as_ref()
                    .map(|matrix| InstanceData::new(matrix, &job.uv_rect, &job.tint))
            })
            .collect();

        InstanceBatch::new(camera_matrix, instances)
    }
}
