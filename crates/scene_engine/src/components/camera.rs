//! Camera component
//!
//! The view matrix follows the owner's global transform: the Transform on the
//! same object refreshes it every time the global matrix is resolved. The
//! camera matrix handed to the renderer is `projection · view`.

use crate::foundation::math::{Mat3, Mat3Ext, Vec3};
use crate::serialization::{ArchiveResult, ArchiveWriter, Scope};

/// How the camera projects the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Identity projection
    #[default]
    None,
    /// Orthographic projection of a `width` x `height` region
    Orthographic,
    /// Accepted for data compatibility; projection stays identity
    Perspective,
}

impl ProjectionMode {
    /// Serialized name
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Orthographic => "Orthographic",
            Self::Perspective => "Perspective",
        }
    }

    /// Parse a serialized name; unknown names map to `None`
    pub fn from_name(name: &str) -> Self {
        match name {
            "Orthographic" => Self::Orthographic,
            "Perspective" => Self::Perspective,
            _ => Self::None,
        }
    }
}

/// View and projection of a scene
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    mode: ProjectionMode,
    width: f32,
    height: f32,
    near_plane: f32,
    far_plane: f32,
    projection: Mat3,
    view: Mat3,
}

impl Default for Camera {
    fn default() -> Self {
        Self::orthographic(1920.0, 1080.0, -5.0, 5.0)
    }
}

impl Camera {
    /// Create a camera with the given projection
    pub fn new(mode: ProjectionMode, width: f32, height: f32, near_plane: f32, far_plane: f32) -> Self {
        let mut camera = Self {
            mode,
            width,
            height,
            near_plane,
            far_plane,
            projection: Mat3::identity(),
            view: Mat3::identity(),
        };
        camera.update_projection(mode, width, height, near_plane, far_plane);
        camera
    }

    /// Orthographic camera
    pub fn orthographic(width: f32, height: f32, near_plane: f32, far_plane: f32) -> Self {
        Self::new(ProjectionMode::Orthographic, width, height, near_plane, far_plane)
    }

    /// Replace the projection parameters and rebuild the projection matrix
    pub fn update_projection(
        &mut self,
        mode: ProjectionMode,
        width: f32,
        height: f32,
        near_plane: f32,
        far_plane: f32,
    ) {
        self.mode = mode;
        self.width = width;
        self.height = height;
        self.near_plane = near_plane;
        self.far_plane = far_plane;

        self.projection = match mode {
            ProjectionMode::Orthographic => Mat3::orthographic_2d(width, height),
            ProjectionMode::Perspective => {
                log::warn!("Perspective projection is not supported; using identity");
                Mat3::identity()
            }
            ProjectionMode::None => Mat3::identity(),
        };
    }

    /// Rebuild the view matrix from the owner's global transform
    ///
    /// The view is `Translation(-t) · Rotation(angle)` with the angle recovered
    /// from the first basis column. A zero x scale leaves the previous view in
    /// place.
    pub fn update_view(&mut self, global: &Mat3) {
        let scale = global.extract_scale();
        if scale.x == 0.0 {
            log::warn!("Camera owner has zero x scale; view matrix left unchanged");
            return;
        }

        let translation = global.extract_translation();
        let angle = global.extract_rotation();
        self.view = Mat3::translation_2d(&Vec3::new(-translation.x, -translation.y, 0.0))
            * Mat3::rotation_2d(angle);
    }

    /// Projection mode
    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    /// Width of the visible region
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Height of the visible region
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Near clip plane
    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    /// Far clip plane
    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    /// Current projection matrix
    pub fn projection(&self) -> &Mat3 {
        &self.projection
    }

    /// Current view matrix
    pub fn view(&self) -> &Mat3 {
        &self.view
    }

    /// `projection · view`
    pub fn camera_matrix(&self) -> Mat3 {
        self.projection * self.view
    }

    /// Write the projection parameters
    pub fn serialize(&self, writer: &mut ArchiveWriter) {
        writer.write_variable("projectionMode", self.mode.name());
        writer.write_variable("cameraWidth", self.width);
        writer.write_variable("cameraHeight", self.height);
        writer.write_variable("nearPlane", self.near_plane);
        writer.write_variable("farPlane", self.far_plane);
    }

    /// Read projection parameters and rebuild the projection
    pub fn deserialize(scope: &Scope) -> ArchiveResult<Self> {
        let mode: String = scope.read_variable("projectionMode")?;
        Ok(Self::new(
            ProjectionMode::from_name(&mode),
            scope.read_variable("cameraWidth")?,
            scope.read_variable("cameraHeight")?,
            scope.read_variable("nearPlane")?,
            scope.read_variable("farPlane")?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_follows_translation() {
        let mut camera = Camera::orthographic(100.0, 50.0, -5.0, 5.0);
        camera.update_view(&Mat3::translation_2d(&Vec3::new(10.0, -4.0, 0.0)));

        let world_point = Vec3::new(10.0, -4.0, 1.0);
        let view_point = camera.view() * world_point;
        assert_relative_eq!(view_point, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_camera_matrix_is_projection_times_view() {
        let mut camera = Camera::orthographic(200.0, 100.0, -5.0, 5.0);
        camera.update_view(&Mat3::translation_2d(&Vec3::new(50.0, 0.0, 0.0)));

        let clip = camera.camera_matrix() * Vec3::new(150.0, 50.0, 1.0);
        assert_relative_eq!(Vec2::new(clip.x, clip.y), Vec2::new(1.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_zero_scale_keeps_previous_view() {
        let mut camera = Camera::default();
        camera.update_view(&Mat3::translation_2d(&Vec3::new(3.0, 0.0, 0.0)));
        let before = *camera.view();

        camera.update_view(&Mat3::scaling_2d(&Vec3::new(0.0, 1.0, 1.0)));
        assert_eq!(*camera.view(), before);
        assert!(camera.view().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_perspective_is_identity() {
        let camera = Camera::new(ProjectionMode::Perspective, 10.0, 10.0, 0.1, 100.0);
        assert_eq!(*camera.projection(), Mat3::identity());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let camera = Camera::orthographic(640.0, 480.0, -1.0, 1.0);
        let mut writer = ArchiveWriter::new();
        camera.serialize(&mut writer);
        let root = writer.finish().unwrap();

        let restored = Camera::deserialize(&root).unwrap();
        assert_eq!(restored.mode(), ProjectionMode::Orthographic);
        assert_eq!(restored.width(), 640.0);
        assert_eq!(*restored.projection(), *camera.projection());
    }
}
