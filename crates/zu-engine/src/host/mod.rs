//! Interfaces consumed from the host application.
//!
//! The host owns the scene graph, the dependency-update notifications, the
//! viewport and the result buffer. The engine reads them through these traits
//! and never keeps references past a single entry-point call.

mod object;
mod scene;
mod view;

pub use object::{HostObject, MeshData, ObjectKind};
pub use scene::{HostCamera, OutputSettings, SceneState, Update, UpdatedEntity};
pub use view::{RenderHost, ResultRect, ViewContext};
