use std::ops::{Deref, DerefMut};

use crate::gl::{DepthFormat, GlContext, TextureFormat};

use super::{FramebufferError, FramebufferTarget};

/// Owns at most one live [`FramebufferTarget`] and applies the resize policy.
///
/// Resizing always destroys the current target and allocates a new one; the
/// attachments of a target never disagree about their size.
#[derive(Debug)]
pub struct FramebufferManager {
    color_format: TextureFormat,
    depth_format: DepthFormat,
    target: Option<FramebufferTarget>,
    allocations: u64,
}

impl FramebufferManager {
    pub fn new(color_format: TextureFormat, depth_format: DepthFormat) -> Self {
        Self {
            color_format,
            depth_format,
            target: None,
            allocations: 0,
        }
    }

    /// Replaces the current target (if any) with a fresh `width × height` one.
    pub fn allocate(
        &mut self,
        gl: &dyn GlContext,
        width: u32,
        height: u32,
    ) -> Result<&mut FramebufferTarget, FramebufferError> {
        self.destroy(gl);
        let target =
            FramebufferTarget::allocate(gl, self.color_format, self.depth_format, width, height)?;
        self.allocations += 1;
        Ok(self.target.insert(target))
    }

    /// Makes sure a live target of exactly `width × height` exists.
    ///
    /// Returns `true` when a (re)allocation happened.
    pub fn ensure_size(
        &mut self,
        gl: &dyn GlContext,
        width: u32,
        height: u32,
    ) -> Result<bool, FramebufferError> {
        if let Some(target) = &self.target {
            if target.is_live() && target.size() == (width, height) {
                return Ok(false);
            }
            log::debug!(
                "viewport resized {:?} -> {:?}; reallocating target",
                target.size(),
                (width, height)
            );
        }
        self.allocate(gl, width, height)?;
        Ok(true)
    }

    /// Destroys the current target. Does nothing when there is none.
    pub fn destroy(&mut self, gl: &dyn GlContext) {
        if let Some(mut target) = self.target.take() {
            target.destroy(gl);
        }
    }

    #[inline]
    pub fn target(&self) -> Option<&FramebufferTarget> {
        self.target.as_ref()
    }

    #[inline]
    pub fn target_mut(&mut self) -> Option<&mut FramebufferTarget> {
        self.target.as_mut()
    }

    /// Number of successful allocations over the manager's life.
    #[inline]
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Allocates a target that is destroyed when the returned scope drops.
    pub fn scoped<'gl>(
        gl: &'gl dyn GlContext,
        color_format: TextureFormat,
        depth_format: DepthFormat,
        width: u32,
        height: u32,
    ) -> Result<ScopedTarget<'gl>, FramebufferError> {
        let target = FramebufferTarget::allocate(gl, color_format, depth_format, width, height)?;
        Ok(ScopedTarget { gl, target })
    }
}

impl Drop for FramebufferManager {
    fn drop(&mut self) {
        if let Some(target) = &self.target {
            if target.is_live() {
                log::warn!(
                    "framebuffer {} dropped without destroy; GL objects leaked",
                    target.framebuffer().0
                );
            }
        }
    }
}

/// A target bound to the lifetime of a scope.
pub struct ScopedTarget<'gl> {
    gl: &'gl dyn GlContext,
    target: FramebufferTarget,
}

impl Deref for ScopedTarget<'_> {
    type Target = FramebufferTarget;

    fn deref(&self) -> &FramebufferTarget {
        &self.target
    }
}

impl DerefMut for ScopedTarget<'_> {
    fn deref_mut(&mut self) -> &mut FramebufferTarget {
        &mut self.target
    }
}

impl Drop for ScopedTarget<'_> {
    fn drop(&mut self) {
        self.target.destroy(self.gl);
    }
}
