//! Render-engine integration surface.
//!
//! `RenderEngine` sequences the mirror, the offscreen target and the
//! compositor for the host's four callbacks:
//! - `batch_render`: final render into the host result buffer
//! - `view_enter` / `view_update` / `view_draw`: interactive viewport

mod compositor;
mod engine;
mod pixels;

pub use compositor::Compositor;
pub use engine::{RenderEngine, ViewSession};
pub use pixels::{read_target, repack_rgba};
