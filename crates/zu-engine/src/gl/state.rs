use super::{
    Buffer, Framebuffer, FramebufferBinding, GlContext, Program, Texture, VertexArray,
    ViewportRect,
};

/// Snapshot of the global GL bindings the engine touches.
///
/// The host keeps issuing its own GL calls right after each entry point
/// returns, so everything captured here must be restored on every exit path.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GlState {
    pub draw_framebuffer: Framebuffer,
    pub read_framebuffer: Framebuffer,
    pub viewport: ViewportRect,
    pub active_texture_unit: u32,
    /// 2D texture binding of texture unit 0.
    pub texture: Texture,
    pub vertex_array: VertexArray,
    pub array_buffer: Buffer,
    pub program: Program,
}

impl GlState {
    pub fn capture(gl: &dyn GlContext) -> Self {
        let active_texture_unit = gl.active_texture_unit();
        gl.active_texture(0);
        let texture = gl.texture_binding();
        gl.active_texture(active_texture_unit);

        Self {
            draw_framebuffer: gl.framebuffer_binding(FramebufferBinding::Draw),
            read_framebuffer: gl.framebuffer_binding(FramebufferBinding::Read),
            viewport: gl.viewport_rect(),
            active_texture_unit,
            texture,
            vertex_array: gl.vertex_array_binding(),
            array_buffer: gl.array_buffer_binding(),
            program: gl.current_program(),
        }
    }

    pub fn restore(&self, gl: &dyn GlContext) {
        gl.bind_framebuffer(FramebufferBinding::Draw, self.draw_framebuffer);
        gl.bind_framebuffer(FramebufferBinding::Read, self.read_framebuffer);
        gl.viewport(self.viewport);
        gl.active_texture(0);
        gl.bind_texture(self.texture);
        gl.active_texture(self.active_texture_unit);
        gl.bind_vertex_array(self.vertex_array);
        gl.bind_array_buffer(self.array_buffer);
        gl.use_program(self.program);
    }

    /// Runs `f` and restores the captured state afterwards, whatever `f` returns.
    pub fn preserve<R>(gl: &dyn GlContext, f: impl FnOnce() -> R) -> R {
        let saved = Self::capture(gl);
        let out = f();
        saved.restore(gl);
        out
    }
}
