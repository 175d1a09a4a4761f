use anyhow::{Context, Result};

use crate::device::FramebufferTarget;
use crate::gl::{self, GlContext, ViewportRect};

/// Reads the whole color attachment of `target` as flat RGBA floats.
///
/// `target` must be bound for reading.
pub fn read_target(gl: &dyn GlContext, target: &FramebufferTarget) -> Result<Vec<f32>> {
    let (width, height) = target.size();
    let mut pixels = vec![0.0f32; width as usize * height as usize * 4];
    gl.read_pixels_rgba_f32(ViewportRect::sized(width, height), &mut pixels);
    gl::check_error(gl).context("failed to read back offscreen pixels")?;
    Ok(pixels)
}

/// Views a flat RGBA stream as one `[r, g, b, a]` tuple per pixel.
pub fn repack_rgba(flat: &[f32]) -> Result<&[[f32; 4]]> {
    bytemuck::try_cast_slice(flat).map_err(|err| {
        anyhow::anyhow!("pixel stream of {} floats is not RGBA: {err}", flat.len())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repack_groups_channels_per_pixel() {
        let flat = [0.1, 0.2, 0.3, 1.0, 0.5, 0.6, 0.7, 0.0];
        let pixels = repack_rgba(&flat).unwrap();
        assert_eq!(pixels, &[[0.1, 0.2, 0.3, 1.0], [0.5, 0.6, 0.7, 0.0]]);
    }

    #[test]
    fn repack_rejects_partial_pixels() {
        assert!(repack_rgba(&[0.0; 6]).is_err());
    }
}
