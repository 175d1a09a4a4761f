/// Raw GL enum values consumed or produced by [`GlContext`](super::GlContext).
pub mod codes {
    pub const NO_ERROR: u32 = 0;
    pub const INVALID_ENUM: u32 = 0x0500;
    pub const INVALID_VALUE: u32 = 0x0501;
    pub const INVALID_OPERATION: u32 = 0x0502;
    pub const OUT_OF_MEMORY: u32 = 0x0505;
    pub const INVALID_FRAMEBUFFER_OPERATION: u32 = 0x0506;

    pub const FRAMEBUFFER_COMPLETE: u32 = 0x8CD5;
    pub const FRAMEBUFFER_UNDEFINED: u32 = 0x8219;
    pub const FRAMEBUFFER_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;
    pub const FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT: u32 = 0x8CD7;
    pub const FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER: u32 = 0x8CDB;
    pub const FRAMEBUFFER_INCOMPLETE_READ_BUFFER: u32 = 0x8CDC;
    pub const FRAMEBUFFER_UNSUPPORTED: u32 = 0x8CDD;
    pub const FRAMEBUFFER_INCOMPLETE_MULTISAMPLE: u32 = 0x8D56;
    pub const FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS: u32 = 0x8DA8;
}

/// Framebuffer binding point.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FramebufferBinding {
    /// `GL_DRAW_FRAMEBUFFER`
    Draw,
    /// `GL_READ_FRAMEBUFFER`
    Read,
}

/// Framebuffer attachment point.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Attachment {
    Color0,
    Depth,
}

/// Color texture internal format. Pixel transfer is always RGBA/float.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureFormat {
    Rgba16F,
    Rgba32F,
}

/// Depth renderbuffer internal format.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DepthFormat {
    Depth24,
    Depth32F,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Primitive {
    Triangles,
    TriangleFan,
}

/// `glViewport` rectangle in window pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ViewportRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ViewportRect {
    #[inline]
    pub const fn sized(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Decoded result of `glCheckFramebufferStatus`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramebufferStatus {
    Complete,
    Undefined,
    IncompleteAttachment,
    MissingAttachment,
    IncompleteDrawBuffer,
    IncompleteReadBuffer,
    Unsupported,
    IncompleteMultisample,
    IncompleteLayerTargets,
    Unknown(u32),
}

impl FramebufferStatus {
    /// Decodes a raw status. `0` is not a status (the query itself failed)
    /// and must be handled by the caller before decoding.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            codes::FRAMEBUFFER_COMPLETE => Self::Complete,
            codes::FRAMEBUFFER_UNDEFINED => Self::Undefined,
            codes::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => Self::IncompleteAttachment,
            codes::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => Self::MissingAttachment,
            codes::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => Self::IncompleteDrawBuffer,
            codes::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => Self::IncompleteReadBuffer,
            codes::FRAMEBUFFER_UNSUPPORTED => Self::Unsupported,
            codes::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => Self::IncompleteMultisample,
            codes::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => Self::IncompleteLayerTargets,
            other => Self::Unknown(other),
        }
    }

    #[inline]
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

impl std::fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "framebuffer complete"),
            Self::Undefined => write!(f, "framebuffer undefined"),
            Self::IncompleteAttachment => write!(f, "incomplete attachment"),
            Self::MissingAttachment => write!(f, "missing attachment"),
            Self::IncompleteDrawBuffer => write!(f, "incomplete draw buffer"),
            Self::IncompleteReadBuffer => write!(f, "incomplete read buffer"),
            Self::Unsupported => write!(f, "unsupported framebuffer format"),
            Self::IncompleteMultisample => write!(f, "incomplete multisample"),
            Self::IncompleteLayerTargets => write!(f, "incomplete layer targets"),
            Self::Unknown(raw) => write!(f, "unknown framebuffer status 0x{raw:04X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_statuses() {
        assert!(FramebufferStatus::from_raw(codes::FRAMEBUFFER_COMPLETE).is_complete());
        assert_eq!(
            FramebufferStatus::from_raw(codes::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT),
            FramebufferStatus::MissingAttachment
        );
        assert_eq!(
            FramebufferStatus::from_raw(codes::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS),
            FramebufferStatus::IncompleteLayerTargets
        );
    }

    #[test]
    fn unknown_status_is_formatted_in_hex() {
        let status = FramebufferStatus::from_raw(0x1234);
        assert_eq!(status, FramebufferStatus::Unknown(0x1234));
        assert_eq!(status.to_string(), "unknown framebuffer status 0x1234");
    }
}
