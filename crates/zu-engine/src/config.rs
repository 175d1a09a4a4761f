//! Engine configuration.
//!
//! Keep this structure small. Every field has a default matching what the
//! host integration expects out of the box.

use crate::gl::{DepthFormat, TextureFormat};

/// Identifier/label pair advertised to the host, plus capability flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    /// Stable engine identifier (used for panel registration).
    pub id: String,
    /// Human readable name shown in the host UI.
    pub label: String,
    /// Whether the engine can render material/asset previews.
    pub use_preview: bool,
}

impl Default for EngineInfo {
    fn default() -> Self {
        Self {
            id: "ZU".to_string(),
            label: "Zu".to_string(),
            use_preview: true,
        }
    }
}

/// What happens to mirrored objects that disappear from the host scene.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum StalePolicy {
    /// Records and backend handles stay alive until the session ends.
    #[default]
    Retain,
    /// Objects missing from the active set at `view_update` are hidden in the
    /// backend and dropped from the mirror.
    Hide,
}

/// Engine-wide configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub info: EngineInfo,

    /// Clear color of the offscreen target (straight RGBA).
    pub clear_color: [f32; 4],

    /// Name of the host result pass receiving batch render pixels.
    pub result_pass: String,

    pub stale_objects: StalePolicy,

    /// Internal format of the offscreen color texture.
    pub color_format: TextureFormat,

    /// Internal format of the offscreen depth renderbuffer.
    pub depth_format: DepthFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            info: EngineInfo::default(),
            clear_color: [0.0, 0.0, 0.0, 0.0],
            result_pass: "Combined".to_string(),
            stale_objects: StalePolicy::Retain,
            color_format: TextureFormat::Rgba16F,
            depth_format: DepthFormat::Depth24,
        }
    }
}
