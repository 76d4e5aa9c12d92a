//! Math utilities and types
//!
//! Provides the 2D homogeneous math used by the scene graph. Transforms are
//! 3x3 affine matrices acting on `(x, y, 1)` column vectors, so the translation
//! lives in the third column and the basis vectors in the first two.

pub use nalgebra::{Matrix3, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type, used for RGBA colors
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type (2D homogeneous affine transform)
pub type Mat3 = Matrix3<f32>;

/// Extension trait for Mat3 with 2D affine constructors and decompositions
///
/// The decompositions follow the usual column-length approach: translation is
/// read from the third column, scale is the length of each basis column and
/// rotation is `acos(m00 / x_scale)`. That rotation is lossy: the sign of the
/// angle is lost and reflections or shears produce meaningless angles. A zero
/// x scale yields `NaN`.
pub trait Mat3Ext {
    /// Translation by the x and y components of `translation` (z is ignored)
    fn translation_2d(translation: &Vec3) -> Mat3;

    /// Counter-clockwise rotation by `angle` radians
    fn rotation_2d(angle: f32) -> Mat3;

    /// Non-uniform scale by the x and y components of `scaling`
    fn scaling_2d(scaling: &Vec3) -> Mat3;

    /// Orthographic projection of a `width` x `height` region centered on the origin
    fn orthographic_2d(width: f32, height: f32) -> Mat3;

    /// Translation column of the matrix
    fn extract_translation(&self) -> Vec2;

    /// Lengths of the two basis columns
    fn extract_scale(&self) -> Vec2;

    /// Rotation angle recovered from the first basis column
    fn extract_rotation(&self) -> f32;
}

impl Mat3Ext for Mat3 {
    fn translation_2d(translation: &Vec3) -> Mat3 {
        Mat3::new_translation(&Vec2::new(translation.x, translation.y))
    }

    fn rotation_2d(angle: f32) -> Mat3 {
        Mat3::new_rotation(angle)
    }

    fn scaling_2d(scaling: &Vec3) -> Mat3 {
        Mat3::new_nonuniform_scaling(&Vec2::new(scaling.x, scaling.y))
    }

    fn orthographic_2d(width: f32, height: f32) -> Mat3 {
        // Maps [-w/2, w/2] x [-h/2, h/2] onto clip space with y pointing up
        Mat3::new_nonuniform_scaling(&Vec2::new(2.0 / width, 2.0 / height))
    }

    fn extract_translation(&self) -> Vec2 {
        Vec2::new(self[(0, 2)], self[(1, 2)])
    }

    fn extract_scale(&self) -> Vec2 {
        let x_scale = Vec2::new(self[(0, 0)], self[(1, 0)]).magnitude();
        let y_scale = Vec2::new(self[(0, 1)], self[(1, 1)]).magnitude();
        Vec2::new(x_scale, y_scale)
    }

    fn extract_rotation(&self) -> f32 {
        let x_scale = Vec2::new(self[(0, 0)], self[(1, 0)]).magnitude();
        // Clamp float noise only; 0/0 stays NaN
        (self[(0, 0)] / x_scale).clamp(-1.0, 1.0).acos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trs_decomposition() {
        let matrix = Mat3::translation_2d(&Vec3::new(5.0, -2.0, 0.0))
            * Mat3::rotation_2d(0.3)
            * Mat3::scaling_2d(&Vec3::new(2.0, 3.0, 1.0));

        assert_relative_eq!(matrix.extract_translation(), Vec2::new(5.0, -2.0), epsilon = 1e-5);
        assert_relative_eq!(matrix.extract_scale(), Vec2::new(2.0, 3.0), epsilon = 1e-5);
        assert_relative_eq!(matrix.extract_rotation(), 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_extraction_loses_sign() {
        let matrix = Mat3::rotation_2d(-0.5);
        assert_relative_eq!(matrix.extract_rotation(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_scale_rotation_is_nan() {
        let matrix = Mat3::scaling_2d(&Vec3::new(0.0, 1.0, 1.0));
        assert!(matrix.extract_rotation().is_nan());
    }

    #[test]
    fn test_orthographic_maps_corners_to_clip_space() {
        let projection = Mat3::orthographic_2d(1920.0, 1080.0);
        let corner = projection * Vec3::new(960.0, -540.0, 1.0);
        assert_relative_eq!(corner, Vec3::new(1.0, -1.0, 1.0), epsilon = 1e-6);
    }
}
