use super::GlContext;
use super::codes;

/// A GL error code reported by `glGetError`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum GlError {
    #[error("invalid enum")]
    InvalidEnum,
    #[error("invalid value")]
    InvalidValue,
    #[error("invalid operation")]
    InvalidOperation,
    #[error("invalid framebuffer operation")]
    InvalidFramebufferOperation,
    #[error("out of memory")]
    OutOfMemory,
    #[error("unknown GL error 0x{0:04X}")]
    Unknown(u32),
}

impl GlError {
    /// Decodes a raw error code. Returns `None` for `GL_NO_ERROR`.
    pub fn from_code(code: u32) -> Option<Self> {
        let err = match code {
            codes::NO_ERROR => return None,
            codes::INVALID_ENUM => Self::InvalidEnum,
            codes::INVALID_VALUE => Self::InvalidValue,
            codes::INVALID_OPERATION => Self::InvalidOperation,
            codes::INVALID_FRAMEBUFFER_OPERATION => Self::InvalidFramebufferOperation,
            codes::OUT_OF_MEMORY => Self::OutOfMemory,
            other => Self::Unknown(other),
        };
        Some(err)
    }
}

/// Polls `glGetError` once and converts a pending error into `Err`.
pub fn check_error(gl: &dyn GlContext) -> Result<(), GlError> {
    match GlError::from_code(gl.get_error()) {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_error_decodes_to_none() {
        assert_eq!(GlError::from_code(codes::NO_ERROR), None);
    }

    #[test]
    fn known_codes_have_descriptive_messages() {
        let err = GlError::from_code(codes::INVALID_FRAMEBUFFER_OPERATION).unwrap();
        assert_eq!(err.to_string(), "invalid framebuffer operation");
        let err = GlError::from_code(codes::OUT_OF_MEMORY).unwrap();
        assert_eq!(err.to_string(), "out of memory");
    }

    #[test]
    fn unknown_code_is_formatted_in_hex() {
        let err = GlError::from_code(0x0BAD).unwrap();
        assert_eq!(err.to_string(), "unknown GL error 0x0BAD");
    }
}
