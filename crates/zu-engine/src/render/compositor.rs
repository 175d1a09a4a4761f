use anyhow::{Context, Result};

use crate::device::{FramebufferTarget, QuadGeometry};
use crate::gl::{self, Framebuffer, FramebufferBinding, GlContext, GlState, Primitive};
use crate::host::RenderHost;

/// Attribute and uniform names of the host's display space shader.
const POSITION_ATTRIB: &str = "pos";
const UV_ATTRIB: &str = "texCoord";
const IMAGE_SAMPLER: &str = "image";

const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Presents an offscreen target into the host framebuffer as a textured quad.
///
/// Only used by the interactive path; batch renders read pixels back instead.
pub struct Compositor;

impl Compositor {
    /// Creates the quad vertex state for `target` and hands it to the target.
    ///
    /// Called once per allocation. Whatever was created before a failure is
    /// still attached, so destroying the target cleans it up.
    pub fn prepare(gl: &dyn GlContext, target: &mut FramebufferTarget) -> Result<()> {
        if target.quad().is_some() {
            return Ok(());
        }

        let (width, height) = target.size();
        let positions: [[f32; 2]; 4] = [
            [0.0, 0.0],
            [width as f32, 0.0],
            [width as f32, height as f32],
            [0.0, height as f32],
        ];

        let mut quad = QuadGeometry::default();
        let built = GlState::preserve(gl, || -> Result<()> {
            quad.vertex_array = gl.create_vertex_array()?;
            quad.positions = gl.create_buffer()?;
            gl.bind_array_buffer(quad.positions);
            gl.array_buffer_data(bytemuck::cast_slice(&positions));
            quad.uvs = gl.create_buffer()?;
            gl.bind_array_buffer(quad.uvs);
            gl.array_buffer_data(bytemuck::cast_slice(&QUAD_UVS));
            gl::check_error(gl)?;
            Ok(())
        });
        target.attach_quad(quad);
        built.context("failed to create compositing quad")
    }

    /// Draws `target`'s color texture into `destination` through the host's
    /// display space shader.
    ///
    /// Every GL binding touched here is restored before returning.
    pub fn present(
        gl: &dyn GlContext,
        host: &mut dyn RenderHost,
        target: &FramebufferTarget,
        destination: Framebuffer,
    ) -> Result<()> {
        let quad = target
            .quad()
            .context("compositing quad was not prepared for this target")?;

        GlState::preserve(gl, || {
            host.bind_display_space_shader();
            let drawn = Self::draw_quad(gl, quad, target, destination);
            host.unbind_display_space_shader();
            drawn
        })
    }

    fn draw_quad(
        gl: &dyn GlContext,
        quad: QuadGeometry,
        target: &FramebufferTarget,
        destination: Framebuffer,
    ) -> Result<()> {
        let program = gl.current_program();
        anyhow::ensure!(!program.is_none(), "host did not bind a display space shader");

        let pos = gl
            .attrib_location(program, POSITION_ATTRIB)
            .with_context(|| format!("display shader has no '{POSITION_ATTRIB}' attribute"))?;
        let uv = gl
            .attrib_location(program, UV_ATTRIB)
            .with_context(|| format!("display shader has no '{UV_ATTRIB}' attribute"))?;

        gl.bind_framebuffer(FramebufferBinding::Draw, destination);

        gl.bind_vertex_array(quad.vertex_array);
        gl.bind_array_buffer(quad.positions);
        gl.vertex_attrib_pointer_f32(pos, 2);
        gl.enable_vertex_attrib_array(pos);
        gl.bind_array_buffer(quad.uvs);
        gl.vertex_attrib_pointer_f32(uv, 2);
        gl.enable_vertex_attrib_array(uv);

        gl.active_texture(0);
        gl.bind_texture(target.color_texture());
        if let Some(sampler) = gl.uniform_location(program, IMAGE_SAMPLER) {
            gl.uniform_1i(sampler, 0);
        }

        gl.draw_arrays(Primitive::TriangleFan, 0, 4);
        gl::check_error(gl).context("failed to composite offscreen target")?;
        Ok(())
    }
}
