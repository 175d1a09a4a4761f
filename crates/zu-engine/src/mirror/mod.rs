//! Scene mirroring.
//!
//! Responsibilities:
//! - flatten host meshes into the backend's triangle-vertex stream (`extract`)
//! - map host object identities to backend object handles (`object`)
//! - own the backend scene and apply full loads / incremental diffs (`scene`)

mod extract;
mod object;
mod scene;

pub use extract::{extract, ExtractError, Geometry};
pub use object::{MirrorStats, ObjectMirror, ObjectRecord};
pub use scene::SceneMirror;
