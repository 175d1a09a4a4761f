use crate::gl::{FramebufferStatus, GlError};

/// Offscreen target could not be created.
///
/// Fatal to the current render or viewport draw, never to the process.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FramebufferError {
    #[error("framebuffer incomplete: {0}")]
    Incomplete(FramebufferStatus),
    #[error("framebuffer status query failed: {0}")]
    StatusQueryFailed(GlError),
    #[error("GL error while creating framebuffer: {0}")]
    Gl(#[from] GlError),
    #[error("invalid framebuffer size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}
