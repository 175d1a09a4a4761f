use crate::gl::{
    self, Attachment, Buffer, DepthFormat, Framebuffer, FramebufferBinding, FramebufferStatus,
    GlContext, GlError, GlState, Renderbuffer, Texture, TextureFormat, VertexArray, ViewportRect,
};

use super::FramebufferError;

/// Lifecycle of one target instance.
///
/// `Unallocated → Allocated ⇄ Bound → Destroyed`. `Destroyed` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TargetState {
    Unallocated,
    Allocated,
    Bound,
    Destroyed,
}

/// Vertex state of the compositing quad, owned alongside its target.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct QuadGeometry {
    pub vertex_array: VertexArray,
    pub positions: Buffer,
    pub uvs: Buffer,
}

/// Framebuffer, color texture and depth renderbuffer of one size.
///
/// The three GL objects are allocated and released as a unit; a target is
/// never resized in place.
#[derive(Debug)]
pub struct FramebufferTarget {
    framebuffer: Framebuffer,
    color: Texture,
    depth: Renderbuffer,
    width: u32,
    height: u32,
    quad: Option<QuadGeometry>,
    state: TargetState,
}

impl FramebufferTarget {
    /// Creates and attaches all attachments, then checks completeness.
    ///
    /// On failure everything created so far is released before returning.
    /// The caller's GL bindings are left untouched either way.
    pub fn allocate(
        gl: &dyn GlContext,
        color_format: TextureFormat,
        depth_format: DepthFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, FramebufferError> {
        if width == 0 || height == 0 {
            return Err(FramebufferError::InvalidSize { width, height });
        }

        let mut target = Self {
            framebuffer: Framebuffer::NONE,
            color: Texture::NONE,
            depth: Renderbuffer::NONE,
            width,
            height,
            quad: None,
            state: TargetState::Unallocated,
        };

        let built = GlState::preserve(gl, || target.build(gl, color_format, depth_format));
        match built {
            Ok(()) => {
                target.state = TargetState::Allocated;
                log::debug!(
                    "framebuffer {} allocated ({width}x{height})",
                    target.framebuffer.0
                );
                Ok(target)
            }
            Err(err) => {
                target.release(gl);
                Err(err)
            }
        }
    }

    fn build(
        &mut self,
        gl: &dyn GlContext,
        color_format: TextureFormat,
        depth_format: DepthFormat,
    ) -> Result<(), FramebufferError> {
        self.framebuffer = gl.create_framebuffer()?;
        gl.bind_framebuffer(FramebufferBinding::Draw, self.framebuffer);

        self.color = gl.create_texture()?;
        gl.active_texture(0);
        gl.bind_texture(self.color);
        gl.tex_image_2d(color_format, self.width, self.height);
        gl.tex_filter_nearest();
        gl::check_error(gl)?;
        gl.framebuffer_texture(Attachment::Color0, self.color);

        self.depth = gl.create_renderbuffer()?;
        gl.bind_renderbuffer(self.depth);
        gl.renderbuffer_storage(depth_format, self.width, self.height);
        gl.bind_renderbuffer(Renderbuffer::NONE);
        gl::check_error(gl)?;
        gl.framebuffer_renderbuffer(Attachment::Depth, self.depth);

        check_complete(gl)
    }

    /// Releases every GL object of the target, quad state first.
    ///
    /// Each release is skipped when its object was never created. Calling this
    /// on a destroyed target does nothing.
    pub fn destroy(&mut self, gl: &dyn GlContext) {
        if self.state == TargetState::Destroyed {
            return;
        }
        let framebuffer = self.framebuffer;
        self.release(gl);
        log::debug!("framebuffer {} destroyed", framebuffer.0);
    }

    fn release(&mut self, gl: &dyn GlContext) {
        if let Some(quad) = self.quad.take() {
            if !quad.uvs.is_none() {
                gl.delete_buffer(quad.uvs);
            }
            if !quad.positions.is_none() {
                gl.delete_buffer(quad.positions);
            }
            if !quad.vertex_array.is_none() {
                gl.delete_vertex_array(quad.vertex_array);
            }
        }
        if !self.color.is_none() {
            gl.delete_texture(self.color);
            self.color = Texture::NONE;
        }
        if !self.depth.is_none() {
            gl.delete_renderbuffer(self.depth);
            self.depth = Renderbuffer::NONE;
        }
        if !self.framebuffer.is_none() {
            gl.delete_framebuffer(self.framebuffer);
            self.framebuffer = Framebuffer::NONE;
        }
        self.state = TargetState::Destroyed;
    }

    /// Binds the target for drawing and reading and covers it with the viewport.
    pub fn bind(&mut self, gl: &dyn GlContext) -> anyhow::Result<()> {
        anyhow::ensure!(
            matches!(self.state, TargetState::Allocated | TargetState::Bound),
            "cannot bind framebuffer target in state {:?}",
            self.state
        );
        gl.bind_framebuffer(FramebufferBinding::Draw, self.framebuffer);
        gl.bind_framebuffer(FramebufferBinding::Read, self.framebuffer);
        gl.viewport(ViewportRect::sized(self.width, self.height));
        self.state = TargetState::Bound;
        Ok(())
    }

    /// Rebinds `previous` (the framebuffer that was bound before [`bind`](Self::bind)).
    pub fn unbind(&mut self, gl: &dyn GlContext, previous: Framebuffer) {
        if self.state == TargetState::Bound {
            gl.bind_framebuffer(FramebufferBinding::Draw, previous);
            gl.bind_framebuffer(FramebufferBinding::Read, previous);
            self.state = TargetState::Allocated;
        }
    }

    #[inline]
    pub fn framebuffer(&self) -> Framebuffer {
        self.framebuffer
    }

    #[inline]
    pub fn color_texture(&self) -> Texture {
        self.color
    }

    #[inline]
    pub fn depth_buffer(&self) -> Renderbuffer {
        self.depth
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn state(&self) -> TargetState {
        self.state
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self.state, TargetState::Allocated | TargetState::Bound)
    }

    #[inline]
    pub fn quad(&self) -> Option<QuadGeometry> {
        self.quad
    }

    /// Hands quad vertex state to the target so it is destroyed with it.
    pub fn attach_quad(&mut self, quad: QuadGeometry) {
        debug_assert!(self.quad.is_none(), "quad geometry attached twice");
        self.quad = Some(quad);
    }
}

fn check_complete(gl: &dyn GlContext) -> Result<(), FramebufferError> {
    let raw = gl.check_framebuffer_status(FramebufferBinding::Draw);
    if raw == 0 {
        let err = GlError::from_code(gl.get_error()).unwrap_or(GlError::Unknown(0));
        return Err(FramebufferError::StatusQueryFailed(err));
    }
    let status = FramebufferStatus::from_raw(raw);
    if status.is_complete() {
        Ok(())
    } else {
        Err(FramebufferError::Incomplete(status))
    }
}
