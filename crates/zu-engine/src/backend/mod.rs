//! Call contract of the Zu rendering backend.
//!
//! The backend owns scene and object handles and performs the actual draw.
//! Its internals are opaque; failures surface as `anyhow::Error`.

mod access;

pub use access::GlAccess;

use anyhow::Result;

use crate::gl::Framebuffer;

/// Backend scene reference.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SceneHandle(pub u64);

/// Backend object reference, valid while its scene is alive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ObjectHandle(pub u64);

/// Zu backend.
///
/// All matrices are 16 floats in row-major order. Calls that touch GL state
/// must happen between [`gl_enable`](Backend::gl_enable) and
/// [`gl_disable`](Backend::gl_disable); use [`GlAccess`] for that.
pub trait Backend {
    fn scene_new(&mut self) -> Result<SceneHandle>;

    /// Releases `scene` and every object created under it.
    fn scene_del(&mut self, scene: SceneHandle);

    fn scene_cam(&mut self, scene: SceneHandle, matrix: &[f32]) -> Result<()>;

    /// Draws `scene` into `framebuffer` using the current viewport.
    fn scene_draw(&mut self, scene: SceneHandle, framebuffer: Framebuffer) -> Result<()>;

    fn obj_new(&mut self, scene: SceneHandle) -> Result<ObjectHandle>;

    /// Sets pending geometry: 3 floats per vertex, 3 vertices per triangle.
    fn obj_geom(&mut self, obj: ObjectHandle, vertices: &[f32]) -> Result<()>;

    /// Sets pending per-vertex colors: 4 floats per vertex of the last geometry.
    fn obj_vert_clr(&mut self, obj: ObjectHandle, colors: &[f32]) -> Result<()>;

    fn obj_transform(&mut self, obj: ObjectHandle, matrix: &[f32]) -> Result<()>;

    fn obj_color(&mut self, obj: ObjectHandle, rgba: &[f32]) -> Result<()>;

    /// Excludes `obj` from subsequent draws. Objects cannot be deleted
    /// individually.
    fn obj_hide(&mut self, obj: ObjectHandle) -> Result<()>;

    /// Commits pending geometry to GPU memory.
    fn obj_upload(&mut self, obj: ObjectHandle) -> Result<()>;

    /// Makes the host GL context current for backend calls.
    fn gl_enable(&mut self);

    fn gl_disable(&mut self);
}
