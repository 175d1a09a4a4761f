use glam::Mat4;

use super::HostObject;

/// Host camera accessors.
pub trait HostCamera {
    /// Camera space → world space.
    fn world_matrix(&self) -> Mat4;

    /// Projection for an output of `width × height` pixels.
    fn projection_matrix(&self, width: u32, height: u32) -> Mat4;
}

/// Output resolution settings of a final render.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OutputSettings {
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub resolution_percentage: u32,
}

impl OutputSettings {
    /// Effective output size in pixels. Never zero on either axis.
    pub fn size(&self) -> (u32, u32) {
        let scale = |v: u32| {
            let scaled = u64::from(v) * u64::from(self.resolution_percentage) / 100;
            u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
        };
        (scale(self.resolution_x), scale(self.resolution_y))
    }
}

/// Entity named by a dependency update.
#[derive(Clone, Copy)]
pub enum UpdatedEntity<'a> {
    Object(&'a dyn HostObject),
    /// Anything else the host tracks (materials, worlds, the scene itself).
    Other(&'a str),
}

/// One "what changed" record of the current frame.
#[derive(Clone, Copy)]
pub struct Update<'a> {
    pub entity: UpdatedEntity<'a>,
    pub geometry_changed: bool,
    pub transform_changed: bool,
}

/// Evaluated scene state handed to every entry point.
pub trait SceneState {
    /// Every evaluated object of the scene.
    fn objects(&self) -> Box<dyn Iterator<Item = &dyn HostObject> + '_>;

    /// Changes reported since the previous notification.
    fn updates(&self) -> Box<dyn Iterator<Item = Update<'_>> + '_>;

    /// Active scene camera.
    fn camera(&self) -> Option<&dyn HostCamera>;

    fn output(&self) -> OutputSettings;
}
