use super::{
    Attachment, Buffer, DepthFormat, Framebuffer, FramebufferBinding, GlError, Primitive, Program,
    Renderbuffer, Texture, TextureFormat, VertexArray, ViewportRect,
};

/// The subset of OpenGL 3.3 core used by the engine.
///
/// Implemented by the host integration on top of its current context. All
/// methods take `&self`: GL state lives in the driver, not in this value.
///
/// `create_*` methods return `Err` when the driver hands back the zero name.
/// Every other call reports failures through [`get_error`](Self::get_error),
/// which callers poll with [`check_error`](super::check_error).
pub trait GlContext {
    fn get_error(&self) -> u32;

    // ── framebuffers ─────────────────────────────────────────────────────

    fn create_framebuffer(&self) -> Result<Framebuffer, GlError>;
    fn delete_framebuffer(&self, framebuffer: Framebuffer);
    fn bind_framebuffer(&self, binding: FramebufferBinding, framebuffer: Framebuffer);
    /// `GL_DRAW_FRAMEBUFFER_BINDING` / `GL_READ_FRAMEBUFFER_BINDING`.
    fn framebuffer_binding(&self, binding: FramebufferBinding) -> Framebuffer;
    /// Attaches to the framebuffer bound for drawing.
    fn framebuffer_texture(&self, attachment: Attachment, texture: Texture);
    /// Attaches to the framebuffer bound for drawing.
    fn framebuffer_renderbuffer(&self, attachment: Attachment, renderbuffer: Renderbuffer);
    /// Raw `glCheckFramebufferStatus`; `0` when the query itself failed.
    fn check_framebuffer_status(&self, binding: FramebufferBinding) -> u32;

    // ── textures ─────────────────────────────────────────────────────────

    fn create_texture(&self) -> Result<Texture, GlError>;
    fn delete_texture(&self, texture: Texture);
    /// Selects texture unit `GL_TEXTURE0 + unit`.
    fn active_texture(&self, unit: u32);
    fn active_texture_unit(&self) -> u32;
    /// Binds to `GL_TEXTURE_2D` on the active unit.
    fn bind_texture(&self, texture: Texture);
    fn texture_binding(&self) -> Texture;
    /// Allocates storage for the bound 2D texture (no initial data).
    fn tex_image_2d(&self, format: TextureFormat, width: u32, height: u32);
    /// Sets min/mag filtering of the bound 2D texture to `GL_NEAREST`.
    fn tex_filter_nearest(&self);

    // ── renderbuffers ────────────────────────────────────────────────────

    fn create_renderbuffer(&self) -> Result<Renderbuffer, GlError>;
    fn delete_renderbuffer(&self, renderbuffer: Renderbuffer);
    fn bind_renderbuffer(&self, renderbuffer: Renderbuffer);
    fn renderbuffer_storage(&self, format: DepthFormat, width: u32, height: u32);

    // ── vertex state ─────────────────────────────────────────────────────

    fn create_buffer(&self) -> Result<Buffer, GlError>;
    fn delete_buffer(&self, buffer: Buffer);
    fn bind_array_buffer(&self, buffer: Buffer);
    fn array_buffer_binding(&self) -> Buffer;
    /// `glBufferData(GL_ARRAY_BUFFER, .., GL_STATIC_DRAW)`.
    fn array_buffer_data(&self, data: &[u8]);

    fn create_vertex_array(&self) -> Result<VertexArray, GlError>;
    fn delete_vertex_array(&self, vertex_array: VertexArray);
    fn bind_vertex_array(&self, vertex_array: VertexArray);
    fn vertex_array_binding(&self) -> VertexArray;
    fn enable_vertex_attrib_array(&self, location: u32);
    /// Tightly packed float attribute sourced from the bound array buffer.
    fn vertex_attrib_pointer_f32(&self, location: u32, components: u32);

    // ── programs ─────────────────────────────────────────────────────────

    /// `GL_CURRENT_PROGRAM`.
    fn current_program(&self) -> Program;
    fn use_program(&self, program: Program);
    fn attrib_location(&self, program: Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Program, name: &str) -> Option<i32>;
    fn uniform_1i(&self, location: i32, value: i32);

    // ── drawing ──────────────────────────────────────────────────────────

    fn viewport(&self, rect: ViewportRect);
    fn viewport_rect(&self) -> ViewportRect;
    /// Clears color and depth of the framebuffer bound for drawing.
    fn clear(&self, color: [f32; 4]);
    fn draw_arrays(&self, mode: Primitive, first: u32, count: u32);
    /// `glReadPixels(.., GL_RGBA, GL_FLOAT, ..)` from the read framebuffer.
    fn read_pixels_rgba_f32(&self, rect: ViewportRect, out: &mut [f32]);
}
