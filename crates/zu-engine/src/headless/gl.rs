use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::gl::{
    codes, Attachment, Buffer, DepthFormat, Framebuffer, FramebufferBinding, GlContext, GlError,
    Primitive, Program, Renderbuffer, Texture, TextureFormat, VertexArray, ViewportRect,
};

/// Name of the display space shader program the in-memory host binds.
pub const DISPLAY_PROGRAM: Program = Program(1);

const POSITION_LOCATION: u32 = 0;
const UV_LOCATION: u32 = 1;
const IMAGE_UNIFORM: i32 = 0;

/// A call that fails once when armed with [`HeadlessGl::fail_next`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FailPoint {
    CreateFramebuffer,
    CreateTexture,
    /// Texture storage allocation raises `GL_OUT_OF_MEMORY`.
    TexImage,
    CreateRenderbuffer,
    CreateBuffer,
    CreateVertexArray,
    /// The completeness check reports this raw status.
    Status(u32),
    /// The completeness check itself fails (returns 0, raises `GL_INVALID_ENUM`).
    StatusQuery,
}

/// RGBA float image, bottom row first.
#[derive(Debug, Clone, Default)]
pub(crate) struct Surface {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
}

impl Surface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

/// Depth image; cleared to the far plane.
#[derive(Debug, Clone, Default)]
pub(crate) struct DepthSurface {
    pub width: u32,
    pub height: u32,
    pub depth: Vec<f32>,
}

#[derive(Debug, Copy, Clone, Default)]
struct FramebufferObject {
    color: Texture,
    depth: Renderbuffer,
}

#[derive(Debug, Copy, Clone)]
struct AttribPointer {
    buffer: Buffer,
    components: u32,
    enabled: bool,
}

#[derive(Debug, Default)]
struct Memory {
    next_name: u32,
    error: u32,
    fail: Option<FailPoint>,
    double_deletes: u64,

    framebuffers: HashMap<u32, FramebufferObject>,
    textures: HashMap<u32, Surface>,
    renderbuffers: HashMap<u32, DepthSurface>,
    buffers: HashMap<u32, Vec<u8>>,
    vertex_arrays: HashMap<u32, HashMap<u32, AttribPointer>>,

    draw_framebuffer: Framebuffer,
    read_framebuffer: Framebuffer,
    active_unit: u32,
    units: HashMap<u32, Texture>,
    renderbuffer: Renderbuffer,
    array_buffer: Buffer,
    vertex_array: VertexArray,
    program: Program,
    sampler_unit: i32,
    viewport: ViewportRect,

    window: Option<Surface>,
}

impl Memory {
    fn name(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }

    /// GL keeps the first error until it is read.
    fn raise(&mut self, code: u32) {
        if self.error == codes::NO_ERROR {
            self.error = code;
        }
    }

    fn take_fail(&mut self, point: FailPoint) -> bool {
        if self.fail == Some(point) {
            self.fail = None;
            return true;
        }
        false
    }

    fn bound_texture(&self) -> Texture {
        self.units.get(&self.active_unit).copied().unwrap_or_default()
    }

    fn forget(&mut self, existed: bool) {
        if !existed {
            self.double_deletes += 1;
        }
    }

    /// Color surface (and depth, if attached) of `framebuffer`; the window for `NONE`.
    fn surfaces(&mut self, framebuffer: Framebuffer) -> Option<(&mut Surface, Option<&mut DepthSurface>)> {
        if framebuffer.is_none() {
            return self.window.as_mut().map(|window| (window, None));
        }
        let fbo = *self.framebuffers.get(&framebuffer.0)?;
        let color = self.textures.get_mut(&fbo.color.0)?;
        let depth = self.renderbuffers.get_mut(&fbo.depth.0);
        Some((color, depth))
    }

    fn attrib_buffer(&self, location: u32) -> Option<&[u8]> {
        let attribs = self.vertex_arrays.get(&self.vertex_array.0)?;
        let pointer = attribs.get(&location).filter(|p| p.enabled && p.components == 2)?;
        self.buffers.get(&pointer.buffer.0).map(Vec::as_slice)
    }

    /// Textured quad through the display program: nearest-sampled blit of
    /// the sampler's texture onto the quad's pixel rectangle.
    fn blit_quad(&mut self) -> Result<(), u32> {
        if self.program != DISPLAY_PROGRAM {
            return Err(codes::INVALID_OPERATION);
        }
        let positions: Vec<[f32; 2]> = self
            .attrib_buffer(POSITION_LOCATION)
            .map(|bytes| {
                bytes
                    .chunks_exact(std::mem::size_of::<[f32; 2]>())
                    .map(bytemuck::pod_read_unaligned::<[f32; 2]>)
                    .collect()
            })
            .ok_or(codes::INVALID_OPERATION)?;
        if positions.len() < 4 || self.attrib_buffer(UV_LOCATION).is_none() {
            return Err(codes::INVALID_OPERATION);
        }

        let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for [x, y] in &positions[..4] {
            x0 = x0.min(*x);
            y0 = y0.min(*y);
            x1 = x1.max(*x);
            y1 = y1.max(*y);
        }
        if x1 <= x0 || y1 <= y0 {
            return Ok(());
        }

        let unit = u32::try_from(self.sampler_unit).map_err(|_| codes::INVALID_VALUE)?;
        let texture = self.units.get(&unit).copied().unwrap_or_default();
        let source = self
            .textures
            .get(&texture.0)
            .filter(|surface| surface.width > 0)
            .cloned()
            .ok_or(codes::INVALID_OPERATION)?;

        let viewport = self.viewport;
        let destination = self.draw_framebuffer;
        let (target, _) = self
            .surfaces(destination)
            .ok_or(codes::INVALID_FRAMEBUFFER_OPERATION)?;

        for py in y0.floor() as i64..y1.ceil() as i64 {
            for px in x0.floor() as i64..x1.ceil() as i64 {
                let Some(dst) = target.index(i64::from(viewport.x) + px, i64::from(viewport.y) + py)
                else {
                    continue;
                };
                let u = (px as f32 + 0.5 - x0) / (x1 - x0);
                let v = (py as f32 + 0.5 - y0) / (y1 - y0);
                let sx = ((u * source.width as f32) as i64).clamp(0, i64::from(source.width) - 1);
                let sy = ((v * source.height as f32) as i64).clamp(0, i64::from(source.height) - 1);
                if let Some(src) = source.index(sx, sy) {
                    target.pixels[dst] = source.pixels[src];
                }
            }
        }
        Ok(())
    }
}

/// Software GL context keeping every object and binding in memory.
///
/// Clones share the same context, the way every caller of a real driver
/// shares the current context.
#[derive(Debug, Clone, Default)]
pub struct HeadlessGl {
    memory: Rc<RefCell<Memory>>,
}

impl HeadlessGl {
    /// Context without a window framebuffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose default framebuffer is a `width × height` window; the
    /// viewport starts out covering it.
    pub fn with_window(width: u32, height: u32) -> Self {
        let gl = Self::new();
        {
            let mut mem = gl.memory.borrow_mut();
            mem.window = Some(Surface::new(width, height));
            mem.viewport = ViewportRect::sized(width, height);
        }
        gl
    }

    /// Makes the next call matching `point` fail.
    pub fn fail_next(&self, point: FailPoint) {
        self.memory.borrow_mut().fail = Some(point);
    }

    /// Framebuffers, textures, renderbuffers, buffers and vertex arrays alive.
    pub fn live_objects(&self) -> usize {
        let mem = self.memory.borrow();
        mem.framebuffers.len()
            + mem.textures.len()
            + mem.renderbuffers.len()
            + mem.buffers.len()
            + mem.vertex_arrays.len()
    }

    /// Deletes of names that were not alive.
    pub fn double_deletes(&self) -> u64 {
        self.memory.borrow().double_deletes
    }

    pub fn is_live_framebuffer(&self, framebuffer: Framebuffer) -> bool {
        self.memory.borrow().framebuffers.contains_key(&framebuffer.0)
    }

    /// Storage size of `texture`; `None` when it is not alive or has no storage.
    pub fn texture_size(&self, texture: Texture) -> Option<(u32, u32)> {
        let mem = self.memory.borrow();
        let surface = mem.textures.get(&texture.0)?;
        (surface.width > 0).then_some((surface.width, surface.height))
    }

    pub fn renderbuffer_size(&self, renderbuffer: Renderbuffer) -> Option<(u32, u32)> {
        let mem = self.memory.borrow();
        let surface = mem.renderbuffers.get(&renderbuffer.0)?;
        (surface.width > 0).then_some((surface.width, surface.height))
    }

    /// Window pixel at `(x, y)`, counted from the bottom-left corner.
    pub fn window_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        let mem = self.memory.borrow();
        let window = mem.window.as_ref()?;
        let index = window.index(i64::from(x), i64::from(y))?;
        Some(window.pixels[index])
    }

    /// Runs `f` on the color and depth surfaces of `framebuffer`.
    pub(crate) fn with_surfaces<R>(
        &self,
        framebuffer: Framebuffer,
        f: impl FnOnce(&mut Surface, Option<&mut DepthSurface>) -> R,
    ) -> Option<R> {
        let mut mem = self.memory.borrow_mut();
        let (color, depth) = mem.surfaces(framebuffer)?;
        Some(f(color, depth))
    }

    fn create(&self, point: FailPoint, insert: impl FnOnce(&mut Memory, u32)) -> Result<u32, GlError> {
        let mut mem = self.memory.borrow_mut();
        if mem.take_fail(point) {
            return Err(GlError::OutOfMemory);
        }
        let name = mem.name();
        insert(&mut *mem, name);
        Ok(name)
    }
}

impl GlContext for HeadlessGl {
    fn get_error(&self) -> u32 {
        std::mem::take(&mut self.memory.borrow_mut().error)
    }

    // ── framebuffers ─────────────────────────────────────────────────────

    fn create_framebuffer(&self) -> Result<Framebuffer, GlError> {
        self.create(FailPoint::CreateFramebuffer, |mem, name| {
            mem.framebuffers.insert(name, FramebufferObject::default());
        })
        .map(Framebuffer)
    }

    fn delete_framebuffer(&self, framebuffer: Framebuffer) {
        if framebuffer.is_none() {
            return;
        }
        let mut mem = self.memory.borrow_mut();
        let existed = mem.framebuffers.remove(&framebuffer.0).is_some();
        mem.forget(existed);
        if mem.draw_framebuffer == framebuffer {
            mem.draw_framebuffer = Framebuffer::NONE;
        }
        if mem.read_framebuffer == framebuffer {
            mem.read_framebuffer = Framebuffer::NONE;
        }
    }

    fn bind_framebuffer(&self, binding: FramebufferBinding, framebuffer: Framebuffer) {
        let mut mem = self.memory.borrow_mut();
        match binding {
            FramebufferBinding::Draw => mem.draw_framebuffer = framebuffer,
            FramebufferBinding::Read => mem.read_framebuffer = framebuffer,
        }
    }

    fn framebuffer_binding(&self, binding: FramebufferBinding) -> Framebuffer {
        let mem = self.memory.borrow();
        match binding {
            FramebufferBinding::Draw => mem.draw_framebuffer,
            FramebufferBinding::Read => mem.read_framebuffer,
        }
    }

    fn framebuffer_texture(&self, attachment: Attachment, texture: Texture) {
        let mut mem = self.memory.borrow_mut();
        let target = mem.draw_framebuffer;
        let attached = match mem.framebuffers.get_mut(&target.0) {
            Some(fbo) if attachment == Attachment::Color0 => {
                fbo.color = texture;
                true
            }
            _ => false,
        };
        if !attached {
            mem.raise(codes::INVALID_OPERATION);
        }
    }

    fn framebuffer_renderbuffer(&self, attachment: Attachment, renderbuffer: Renderbuffer) {
        let mut mem = self.memory.borrow_mut();
        let target = mem.draw_framebuffer;
        let attached = match mem.framebuffers.get_mut(&target.0) {
            Some(fbo) if attachment == Attachment::Depth => {
                fbo.depth = renderbuffer;
                true
            }
            _ => false,
        };
        if !attached {
            mem.raise(codes::INVALID_OPERATION);
        }
    }

    fn check_framebuffer_status(&self, binding: FramebufferBinding) -> u32 {
        let mut mem = self.memory.borrow_mut();
        let armed = mem.fail;
        match armed {
            Some(FailPoint::Status(raw)) => {
                mem.fail = None;
                return raw;
            }
            Some(FailPoint::StatusQuery) => {
                mem.fail = None;
                mem.raise(codes::INVALID_ENUM);
                return 0;
            }
            _ => {}
        }

        let framebuffer = match binding {
            FramebufferBinding::Draw => mem.draw_framebuffer,
            FramebufferBinding::Read => mem.read_framebuffer,
        };
        if framebuffer.is_none() {
            return if mem.window.is_some() {
                codes::FRAMEBUFFER_COMPLETE
            } else {
                codes::FRAMEBUFFER_UNDEFINED
            };
        }
        let Some(fbo) = mem.framebuffers.get(&framebuffer.0) else {
            mem.raise(codes::INVALID_OPERATION);
            return 0;
        };
        match mem.textures.get(&fbo.color.0) {
            None => codes::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT,
            Some(color) if color.width == 0 => codes::FRAMEBUFFER_INCOMPLETE_ATTACHMENT,
            Some(color) => match mem.renderbuffers.get(&fbo.depth.0) {
                Some(depth) if (depth.width, depth.height) != (color.width, color.height) => {
                    codes::FRAMEBUFFER_INCOMPLETE_ATTACHMENT
                }
                _ => codes::FRAMEBUFFER_COMPLETE,
            },
        }
    }

    // ── textures ─────────────────────────────────────────────────────────

    fn create_texture(&self) -> Result<Texture, GlError> {
        self.create(FailPoint::CreateTexture, |mem, name| {
            mem.textures.insert(name, Surface::default());
        })
        .map(Texture)
    }

    fn delete_texture(&self, texture: Texture) {
        if texture.is_none() {
            return;
        }
        let mut mem = self.memory.borrow_mut();
        let existed = mem.textures.remove(&texture.0).is_some();
        mem.forget(existed);
        for bound in mem.units.values_mut() {
            if *bound == texture {
                *bound = Texture::NONE;
            }
        }
    }

    fn active_texture(&self, unit: u32) {
        self.memory.borrow_mut().active_unit = unit;
    }

    fn active_texture_unit(&self) -> u32 {
        self.memory.borrow().active_unit
    }

    fn bind_texture(&self, texture: Texture) {
        let mut mem = self.memory.borrow_mut();
        let unit = mem.active_unit;
        mem.units.insert(unit, texture);
    }

    fn texture_binding(&self) -> Texture {
        self.memory.borrow().bound_texture()
    }

    fn tex_image_2d(&self, _format: TextureFormat, width: u32, height: u32) {
        let mut mem = self.memory.borrow_mut();
        if mem.take_fail(FailPoint::TexImage) {
            mem.raise(codes::OUT_OF_MEMORY);
            return;
        }
        let texture = mem.bound_texture();
        match mem.textures.get_mut(&texture.0) {
            Some(surface) => *surface = Surface::new(width, height),
            None => mem.raise(codes::INVALID_OPERATION),
        }
    }

    fn tex_filter_nearest(&self) {
        let mut mem = self.memory.borrow_mut();
        let texture = mem.bound_texture();
        if !mem.textures.contains_key(&texture.0) {
            mem.raise(codes::INVALID_OPERATION);
        }
    }

    // ── renderbuffers ────────────────────────────────────────────────────

    fn create_renderbuffer(&self) -> Result<Renderbuffer, GlError> {
        self.create(FailPoint::CreateRenderbuffer, |mem, name| {
            mem.renderbuffers.insert(name, DepthSurface::default());
        })
        .map(Renderbuffer)
    }

    fn delete_renderbuffer(&self, renderbuffer: Renderbuffer) {
        if renderbuffer.is_none() {
            return;
        }
        let mut mem = self.memory.borrow_mut();
        let existed = mem.renderbuffers.remove(&renderbuffer.0).is_some();
        mem.forget(existed);
        if mem.renderbuffer == renderbuffer {
            mem.renderbuffer = Renderbuffer::NONE;
        }
    }

    fn bind_renderbuffer(&self, renderbuffer: Renderbuffer) {
        self.memory.borrow_mut().renderbuffer = renderbuffer;
    }

    fn renderbuffer_storage(&self, _format: DepthFormat, width: u32, height: u32) {
        let mut mem = self.memory.borrow_mut();
        let bound = mem.renderbuffer;
        match mem.renderbuffers.get_mut(&bound.0) {
            Some(surface) => {
                *surface = DepthSurface {
                    width,
                    height,
                    depth: vec![1.0; width as usize * height as usize],
                }
            }
            None => mem.raise(codes::INVALID_OPERATION),
        }
    }

    // ── vertex state ─────────────────────────────────────────────────────

    fn create_buffer(&self) -> Result<Buffer, GlError> {
        self.create(FailPoint::CreateBuffer, |mem, name| {
            mem.buffers.insert(name, Vec::new());
        })
        .map(Buffer)
    }

    fn delete_buffer(&self, buffer: Buffer) {
        if buffer.is_none() {
            return;
        }
        let mut mem = self.memory.borrow_mut();
        let existed = mem.buffers.remove(&buffer.0).is_some();
        mem.forget(existed);
        if mem.array_buffer == buffer {
            mem.array_buffer = Buffer::NONE;
        }
    }

    fn bind_array_buffer(&self, buffer: Buffer) {
        self.memory.borrow_mut().array_buffer = buffer;
    }

    fn array_buffer_binding(&self) -> Buffer {
        self.memory.borrow().array_buffer
    }

    fn array_buffer_data(&self, data: &[u8]) {
        let mut mem = self.memory.borrow_mut();
        let bound = mem.array_buffer;
        match mem.buffers.get_mut(&bound.0) {
            Some(storage) => *storage = data.to_vec(),
            None => mem.raise(codes::INVALID_OPERATION),
        }
    }

    fn create_vertex_array(&self) -> Result<VertexArray, GlError> {
        self.create(FailPoint::CreateVertexArray, |mem, name| {
            mem.vertex_arrays.insert(name, HashMap::new());
        })
        .map(VertexArray)
    }

    fn delete_vertex_array(&self, vertex_array: VertexArray) {
        if vertex_array.is_none() {
            return;
        }
        let mut mem = self.memory.borrow_mut();
        let existed = mem.vertex_arrays.remove(&vertex_array.0).is_some();
        mem.forget(existed);
        if mem.vertex_array == vertex_array {
            mem.vertex_array = VertexArray::NONE;
        }
    }

    fn bind_vertex_array(&self, vertex_array: VertexArray) {
        self.memory.borrow_mut().vertex_array = vertex_array;
    }

    fn vertex_array_binding(&self) -> VertexArray {
        self.memory.borrow().vertex_array
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        let mut mem = self.memory.borrow_mut();
        let bound = mem.vertex_array;
        match mem
            .vertex_arrays
            .get_mut(&bound.0)
            .and_then(|attribs| attribs.get_mut(&location))
        {
            Some(pointer) => pointer.enabled = true,
            None => mem.raise(codes::INVALID_OPERATION),
        }
    }

    fn vertex_attrib_pointer_f32(&self, location: u32, components: u32) {
        let mut mem = self.memory.borrow_mut();
        let (bound, buffer) = (mem.vertex_array, mem.array_buffer);
        if buffer.is_none() {
            mem.raise(codes::INVALID_OPERATION);
            return;
        }
        match mem.vertex_arrays.get_mut(&bound.0) {
            Some(attribs) => {
                let enabled = attribs.get(&location).is_some_and(|p| p.enabled);
                attribs.insert(
                    location,
                    AttribPointer {
                        buffer,
                        components,
                        enabled,
                    },
                );
            }
            None => mem.raise(codes::INVALID_OPERATION),
        }
    }

    // ── programs ─────────────────────────────────────────────────────────

    fn current_program(&self) -> Program {
        self.memory.borrow().program
    }

    fn use_program(&self, program: Program) {
        self.memory.borrow_mut().program = program;
    }

    fn attrib_location(&self, program: Program, name: &str) -> Option<u32> {
        if program != DISPLAY_PROGRAM {
            return None;
        }
        match name {
            "pos" => Some(POSITION_LOCATION),
            "texCoord" => Some(UV_LOCATION),
            _ => None,
        }
    }

    fn uniform_location(&self, program: Program, name: &str) -> Option<i32> {
        (program == DISPLAY_PROGRAM && name == "image").then_some(IMAGE_UNIFORM)
    }

    fn uniform_1i(&self, location: i32, value: i32) {
        let mut mem = self.memory.borrow_mut();
        if mem.program != DISPLAY_PROGRAM || location != IMAGE_UNIFORM {
            mem.raise(codes::INVALID_OPERATION);
            return;
        }
        mem.sampler_unit = value;
    }

    // ── drawing ──────────────────────────────────────────────────────────

    fn viewport(&self, rect: ViewportRect) {
        self.memory.borrow_mut().viewport = rect;
    }

    fn viewport_rect(&self) -> ViewportRect {
        self.memory.borrow().viewport
    }

    fn clear(&self, color: [f32; 4]) {
        let mut mem = self.memory.borrow_mut();
        let target = mem.draw_framebuffer;
        match mem.surfaces(target) {
            Some((surface, depth)) => {
                surface.pixels.fill(color);
                if let Some(depth) = depth {
                    depth.depth.fill(1.0);
                }
            }
            None => mem.raise(codes::INVALID_FRAMEBUFFER_OPERATION),
        }
    }

    fn draw_arrays(&self, mode: Primitive, first: u32, count: u32) {
        let mut mem = self.memory.borrow_mut();
        if mode != Primitive::TriangleFan || first != 0 || count != 4 {
            mem.raise(codes::INVALID_OPERATION);
            return;
        }
        if let Err(code) = mem.blit_quad() {
            mem.raise(code);
        }
    }

    fn read_pixels_rgba_f32(&self, rect: ViewportRect, out: &mut [f32]) {
        let mut mem = self.memory.borrow_mut();
        if out.len() < rect.width as usize * rect.height as usize * 4 {
            mem.raise(codes::INVALID_VALUE);
            return;
        }
        let source = mem.read_framebuffer;
        let Some((surface, _)) = mem.surfaces(source) else {
            mem.raise(codes::INVALID_FRAMEBUFFER_OPERATION);
            return;
        };

        for row in 0..rect.height {
            for col in 0..rect.width {
                let x = i64::from(rect.x) + i64::from(col);
                let y = i64::from(rect.y) + i64::from(row);
                let dst = (row as usize * rect.width as usize + col as usize) * 4;
                let texel = surface
                    .index(x, y)
                    .map(|src| surface.pixels[src])
                    .unwrap_or([0.0; 4]);
                out[dst..dst + 4].copy_from_slice(&texel);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::check_error;

    #[test]
    fn deleting_bound_objects_resets_bindings() {
        let gl = HeadlessGl::new();
        let fb = gl.create_framebuffer().unwrap();
        let tex = gl.create_texture().unwrap();
        gl.bind_framebuffer(FramebufferBinding::Draw, fb);
        gl.bind_texture(tex);

        gl.delete_framebuffer(fb);
        gl.delete_texture(tex);

        assert_eq!(gl.framebuffer_binding(FramebufferBinding::Draw), Framebuffer::NONE);
        assert_eq!(gl.texture_binding(), Texture::NONE);
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn double_delete_is_counted() {
        let gl = HeadlessGl::new();
        let buffer = gl.create_buffer().unwrap();
        gl.delete_buffer(buffer);
        gl.delete_buffer(buffer);
        assert_eq!(gl.double_deletes(), 1);
    }

    #[test]
    fn first_error_sticks_until_read() {
        let gl = HeadlessGl::new();
        gl.tex_filter_nearest();
        gl.fail_next(FailPoint::TexImage);
        gl.tex_image_2d(TextureFormat::Rgba16F, 1, 1);

        assert_eq!(check_error(&gl), Err(GlError::InvalidOperation));
        assert_eq!(check_error(&gl), Ok(()));
    }

    #[test]
    fn clear_and_read_back_window() {
        let gl = HeadlessGl::with_window(2, 2);
        gl.clear([0.5, 0.25, 0.0, 1.0]);

        let mut out = [0.0f32; 16];
        gl.read_pixels_rgba_f32(ViewportRect::sized(2, 2), &mut out);
        assert_eq!(&out[12..], &[0.5, 0.25, 0.0, 1.0]);
        assert_eq!(gl.window_pixel(1, 1), Some([0.5, 0.25, 0.0, 1.0]));
        assert_eq!(gl.window_pixel(2, 0), None);
    }

    #[test]
    fn draw_without_display_program_raises() {
        let gl = HeadlessGl::with_window(2, 2);
        gl.draw_arrays(Primitive::TriangleFan, 0, 4);
        assert_eq!(check_error(&gl), Err(GlError::InvalidOperation));
    }
}
