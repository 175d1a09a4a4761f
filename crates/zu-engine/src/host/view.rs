use glam::Mat4;

use crate::gl::ViewportRect;

/// Interactive viewport accessors.
pub trait ViewContext {
    /// Region size in pixels.
    fn region_size(&self) -> (u32, u32);

    /// Combined projection × view matrix of the viewport.
    fn perspective_matrix(&self) -> Mat4;
}

/// Pixel rectangle of a render result.
pub type ResultRect = ViewportRect;

/// Render-engine services the host provides to its plugins.
pub trait RenderHost {
    /// Binds the host's color-management (display space) shader.
    fn bind_display_space_shader(&mut self);

    fn unbind_display_space_shader(&mut self);

    /// Writes RGBA pixels (bottom row first) into pass `pass` of the result.
    fn write_result(&mut self, rect: ResultRect, pass: &str, pixels: &[[f32; 4]])
        -> anyhow::Result<()>;
}
