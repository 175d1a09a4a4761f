use std::ops::{Deref, DerefMut};

use super::Backend;

/// Scoped `gl_enable`/`gl_disable` bracket around backend calls.
///
/// The context is released when the guard drops, including on early `?`
/// returns.
pub struct GlAccess<'a> {
    backend: &'a mut dyn Backend,
}

impl<'a> GlAccess<'a> {
    pub fn enter(backend: &'a mut dyn Backend) -> Self {
        backend.gl_enable();
        Self { backend }
    }
}

impl Drop for GlAccess<'_> {
    fn drop(&mut self) {
        self.backend.gl_disable();
    }
}

impl<'a> Deref for GlAccess<'a> {
    type Target = dyn Backend + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.backend
    }
}

impl<'a> DerefMut for GlAccess<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.backend
    }
}
