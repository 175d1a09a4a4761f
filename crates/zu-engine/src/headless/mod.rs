//! In-process stand-ins for the engine's external collaborators.
//!
//! - `HeadlessGl`: software GL context with failure injection
//! - `RasterBackend`: Zu backend that rasterizes into `HeadlessGl` targets
//! - `MemoryScene`, `MemoryHost`, `MemoryView`, `MemoryPanels`: the host side
//!
//! Used by the test suites and by `zu-studio` to run the engine without a
//! window or a GPU.

mod backend;
mod gl;
mod host;
mod scene;

pub use backend::{DrawRecord, RasterBackend};
pub use gl::{FailPoint, HeadlessGl, DISPLAY_PROGRAM};
pub use host::{MemoryHost, MemoryPanels, MemoryView, RenderResult};
pub use scene::{MemoryCamera, MemoryObject, MemoryScene};
