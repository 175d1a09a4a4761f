//! Zu engine crate.
//!
//! Bridges a host application's live scene graph to the Zu renderer:
//! - mirrors mesh-like host objects into backend scene/object handles
//! - re-uploads only what the host reports as changed
//! - renders into an offscreen GL target and either reads it back (batch
//!   render) or composites it into the host viewport (interactive preview)

pub mod backend;
pub mod config;
pub mod device;
pub mod gl;
pub mod headless;
pub mod host;
pub mod logging;
pub mod math;
pub mod mirror;
pub mod registry;
pub mod render;

pub use config::{EngineConfig, EngineInfo, StalePolicy};
pub use render::RenderEngine;
