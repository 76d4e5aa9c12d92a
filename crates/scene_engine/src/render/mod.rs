//! Render front end
//!
//! The engine never talks to a graphics API directly. Objects publish their
//! global transforms and atlas regions into [`RenderJob`]s; once per frame the
//! [`RenderQueue`] sweeps retired jobs and packs the rest into an
//! [`InstanceBatch`] that a [`RenderBackend`] draws with one instanced call.
//!
//! ```text
//! Transform / Sprite / Animator
//!      ↓  (matrix, UV rect)
//! RenderQueue (RenderJob per object)
//!      ↓  build_batch, once per frame
//! RenderBackend::draw_instanced
//! ```

pub mod atlas;
pub mod batch;
pub mod render_job;

pub use atlas::{AtlasAllocator, AtlasRegion};
pub use batch::{InstanceBatch, InstanceData, RenderBackend, RenderError};
pub use render_job::{RenderJob, RenderQueue, UvRect};
