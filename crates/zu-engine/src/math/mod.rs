//! Matrix helpers shared by the mirror and the camera path.
//!
//! Host and backend both exchange 4×4 transforms as 16 floats in row-major
//! order (row 0 first). `glam` stores matrices column-major, so every crossing
//! of that boundary goes through this module.

mod camera;

pub use camera::{batch_camera, perspective_for, viewport_camera};

use glam::Mat4;

/// Flattens `m` row by row.
#[inline]
pub fn flatten_row_major(m: &Mat4) -> [f32; 16] {
    m.transpose().to_cols_array()
}

/// Inverse of [`flatten_row_major`].
#[inline]
pub fn from_row_major(values: &[f32; 16]) -> Mat4 {
    Mat4::from_cols_array(values).transpose()
}

/// Copies a slice into a row-major matrix array, checking the length.
pub fn row_major_from_slice(values: &[f32]) -> anyhow::Result<[f32; 16]> {
    <[f32; 16]>::try_from(values)
        .map_err(|_| anyhow::anyhow!("matrix should have 16 elements, got {}", values.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn identity_flattens_to_identity() {
        let flat = flatten_row_major(&Mat4::IDENTITY);
        assert_eq!(flat, Mat4::IDENTITY.to_cols_array());
    }

    #[test]
    fn translation_lands_in_last_column_of_each_row() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let flat = flatten_row_major(&m);
        assert_eq!(flat[3], 1.0);
        assert_eq!(flat[7], 2.0);
        assert_eq!(flat[11], 3.0);
        assert_eq!(flat[15], 1.0);
    }

    #[test]
    fn row_major_conversion_inverts() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 0.5),
            glam::Quat::from_rotation_y(0.3),
            Vec3::new(-1.0, 4.0, 2.0),
        );
        assert_eq!(from_row_major(&flatten_row_major(&m)), m);
    }

    #[test]
    fn slice_with_wrong_length_is_rejected() {
        let err = row_major_from_slice(&[0.0; 12]).unwrap_err();
        assert_eq!(err.to_string(), "matrix should have 16 elements, got 12");
    }
}
