//! Offscreen GL render targets.
//!
//! This module is responsible for:
//! - allocating the framebuffer + color texture + depth renderbuffer triple
//! - verifying completeness and decoding failures
//! - tearing everything down again, including after a failed allocation
//! - reallocating on viewport resize

mod error;
mod manager;
mod target;

pub use error::FramebufferError;
pub use manager::{FramebufferManager, ScopedTarget};
pub use target::{FramebufferTarget, QuadGeometry, TargetState};
