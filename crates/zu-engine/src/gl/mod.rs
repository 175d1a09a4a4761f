//! OpenGL call surface used by the offscreen target and the compositor.
//!
//! The host owns the GL context; the engine only ever sees it through
//! [`GlContext`]. Object names are wrapped in typed newtypes so a texture can
//! never be released through the framebuffer path.

mod context;
mod enums;
mod error;
mod names;
mod state;

pub use context::GlContext;
pub use enums::{
    codes, Attachment, DepthFormat, FramebufferBinding, FramebufferStatus, Primitive,
    TextureFormat, ViewportRect,
};
pub use error::{check_error, GlError};
pub use names::{Buffer, Framebuffer, Program, Renderbuffer, Texture, VertexArray};
pub use state::GlState;
