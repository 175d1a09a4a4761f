use glam::Mat4;

use crate::host::{HostCamera, ViewContext};

use super::flatten_row_major;

/// Camera matrix for a final render: projection × inverse(camera world).
pub fn batch_camera(camera: &dyn HostCamera, width: u32, height: u32) -> [f32; 16] {
    let view = camera.world_matrix().inverse();
    let proj = camera.projection_matrix(width, height);
    flatten_row_major(&(proj * view))
}

/// Camera matrix for an interactive draw: the viewport's combined
/// perspective matrix, taken as-is every frame.
pub fn viewport_camera(view: &dyn ViewContext) -> [f32; 16] {
    flatten_row_major(&view.perspective_matrix())
}

/// Builds a right-handed perspective for a vertical field of view, matching
/// the aspect of the output. Used by in-memory cameras.
pub fn perspective_for(fov_y: f32, width: u32, height: u32, near: f32, far: f32) -> Mat4 {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    Mat4::perspective_rh_gl(fov_y, aspect, near, far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::from_row_major;
    use glam::{Vec3, Vec4};

    struct FixedCamera {
        world: Mat4,
    }

    impl HostCamera for FixedCamera {
        fn world_matrix(&self) -> Mat4 {
            self.world
        }

        fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
            perspective_for(std::f32::consts::FRAC_PI_2, width, height, 0.1, 100.0)
        }
    }

    #[test]
    fn batch_camera_projects_point_in_front_of_camera_to_center() {
        let camera = FixedCamera {
            world: Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)),
        };
        let cam = from_row_major(&batch_camera(&camera, 4, 4));
        let clip = cam * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        approx::assert_abs_diff_eq!(ndc.x, 0.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn perspective_uses_output_aspect() {
        let wide = perspective_for(1.0, 200, 100, 0.1, 10.0);
        let square = perspective_for(1.0, 100, 100, 0.1, 10.0);
        approx::assert_abs_diff_eq!(wide.x_axis.x * 2.0, square.x_axis.x, epsilon = 1e-6);
    }
}
