macro_rules! gl_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// The reserved zero name (default object / nothing bound).
            pub const NONE: Self = Self(0);

            #[inline]
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }
        }
    };
}

gl_name!(
    /// Framebuffer object name. `Framebuffer::NONE` is the window framebuffer.
    Framebuffer
);
gl_name!(Texture);
gl_name!(Renderbuffer);
gl_name!(Buffer);
gl_name!(VertexArray);
gl_name!(Program);
