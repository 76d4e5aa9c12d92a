//! Transform component
//!
//! Holds an object's local pose and a cached local matrix. Setters only record
//! the new value and raise the dirty flag; the matrix is recomposed as
//! `Translation · Rotation · Scale` the next time the owner updates.
//!
//! The global matrix is the parent's global matrix times the local one, with
//! the parent resolved first so a child never composes against a stale
//! parent. An object without a parent, or whose parent has no Transform, has a
//! global matrix equal to its local matrix.

use crate::components::{Camera, ComponentContext};
use crate::foundation::math::{Mat3, Mat3Ext, Vec2, Vec3};
use crate::serialization::{ArchiveResult, ArchiveWriter, Scope};

/// Local pose of a game object
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    translation: Vec3,
    rotation: f32,
    scaling: Vec3,
    local: Mat3,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: 0.0,
            scaling: Vec3::new(1.0, 1.0, 1.0),
            local: Mat3::identity(),
            dirty: false,
        }
    }
}

impl Transform {
    /// Identity transform
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Transform::set_local_translation`]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.set_local_translation(translation);
        self
    }

    /// Builder form of [`Transform::set_local_rotation`]
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.set_local_rotation(rotation);
        self
    }

    /// Builder form of [`Transform::set_local_scaling`]
    pub fn with_scaling(mut self, scaling: Vec3) -> Self {
        self.set_local_scaling(scaling);
        self
    }

    /// Set the local translation. Equal values leave the dirty flag untouched.
    pub fn set_local_translation(&mut self, translation: Vec3) {
        if self.translation != translation {
            self.translation = translation;
            self.dirty = true;
        }
    }

    /// Set the local rotation in radians
    pub fn set_local_rotation(&mut self, rotation: f32) {
        if self.rotation != rotation {
            self.rotation = rotation;
            self.dirty = true;
        }
    }

    /// Set the local scaling. The z component is stored but unused in 2D.
    pub fn set_local_scaling(&mut self, scaling: Vec3) {
        if self.scaling != scaling {
            self.scaling = scaling;
            self.dirty = true;
        }
    }

    /// Local translation
    pub fn local_translation(&self) -> Vec3 {
        self.translation
    }

    /// Local rotation in radians
    pub fn local_rotation(&self) -> f32 {
        self.rotation
    }

    /// Local scaling
    pub fn local_scaling(&self) -> Vec3 {
        self.scaling
    }

    /// Cached local matrix; pending setter changes are not applied
    pub fn local_transformation(&self) -> &Mat3 {
        &self.local
    }

    /// Whether a setter changed the pose since the last recomposition
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Recompose the local matrix if the pose changed
    pub fn reconstruct_transformation(&mut self) {
        if !self.dirty {
            return;
        }

        self.local = Mat3::translation_2d(&self.translation)
            * Mat3::rotation_2d(self.rotation)
            * Mat3::scaling_2d(&self.scaling);
        self.dirty = false;
    }

    /// Global matrix given the parent's global matrix
    pub fn global_transformation_with(&self, parent_global: Option<&Mat3>) -> Mat3 {
        match parent_global {
            Some(parent) => parent * self.local,
            None => self.local,
        }
    }

    /// Reconcile, compose with the parent chain, refresh the sibling camera
    /// and publish the result to the owner's render job
    pub(crate) fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        self.reconstruct_transformation();

        let parent_global = ctx.resolve_parent_global();
        let global = self.global_transformation_with(parent_global.as_ref());

        if let Some(camera) = ctx.siblings_mut().get_mut::<Camera>() {
            camera.update_view(&global);
        }
        ctx.set_render_transformation(global);
    }

    /// Write the local pose
    pub fn serialize(&self, writer: &mut ArchiveWriter) {
        writer.write_variable("localTranslation", self.translation);
        writer.write_variable("localRotation", self.rotation);
        writer.write_variable("localScaling", self.scaling);
    }

    /// Read a local pose; the matrix is recomposed immediately
    pub fn deserialize(scope: &Scope) -> ArchiveResult<Self> {
        let mut transform = Self::new()
            .with_translation(scope.read_variable("localTranslation")?)
            .with_rotation(scope.read_variable("localRotation")?)
            .with_scaling(scope.read_variable("localScaling")?);
        transform.reconstruct_transformation();
        Ok(transform)
    }
}

/// Translation column of a global matrix
pub fn decompose_translation(global: &Mat3) -> Vec2 {
    global.extract_translation()
}

/// Rotation of a global matrix. Lossy: reflections and shears do not survive
/// and the sign of the angle is dropped.
pub fn decompose_rotation(global: &Mat3) -> f32 {
    global.extract_rotation()
}

/// Per-axis scale of a global matrix
pub fn decompose_scaling(global: &Mat3) -> Vec2 {
    global.extract_scale()
}
