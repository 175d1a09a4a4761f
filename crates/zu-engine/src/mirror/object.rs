use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::backend::{Backend, ObjectHandle, SceneHandle};

use super::Geometry;

/// Mirrored state of one host object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub handle: ObjectHandle,
    /// Incremented on every geometry upload. `0` = never uploaded.
    pub geometry_version: u64,
    pub transform: Option<[f32; 16]>,
    pub color: Option<[f32; 4]>,
    /// Last generation in which the host reported this object as present.
    pub(crate) seen: u64,
}

/// Counters accumulated over the life of a mirror.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct MirrorStats {
    pub objects_created: u64,
    pub geometry_uploads: u64,
    pub transform_updates: u64,
    pub color_updates: u64,
    /// Updates ignored because they did not name a mesh-like object.
    pub skipped_updates: u64,
    pub hidden: u64,
}

/// Host identity → backend object handle mapping of one backend scene.
///
/// An identity is represented by at most one handle at a time.
#[derive(Debug)]
pub struct ObjectMirror {
    scene: SceneHandle,
    records: HashMap<String, ObjectRecord>,
    stats: MirrorStats,
}

impl ObjectMirror {
    pub fn new(scene: SceneHandle) -> Self {
        Self {
            scene,
            records: HashMap::new(),
            stats: MirrorStats::default(),
        }
    }

    /// Returns the handle for `id`, creating a backend object on first sight.
    pub fn ensure(&mut self, backend: &mut dyn Backend, id: &str) -> Result<ObjectHandle> {
        if let Some(record) = self.records.get(id) {
            return Ok(record.handle);
        }

        let handle = backend
            .obj_new(self.scene)
            .with_context(|| format!("failed to create backend object for '{id}'"))?;
        self.records.insert(
            id.to_string(),
            ObjectRecord {
                handle,
                geometry_version: 0,
                transform: None,
                color: None,
                seen: 0,
            },
        );
        self.stats.objects_created += 1;
        log::trace!("mirror: new object '{id}' -> {handle:?}");
        Ok(handle)
    }

    /// Pushes `geometry` to the object and commits it to the GPU.
    pub fn apply_geometry(
        &mut self,
        backend: &mut dyn Backend,
        id: &str,
        geometry: &Geometry,
    ) -> Result<()> {
        let record = self.record_mut(id)?;
        let handle = record.handle;

        backend
            .obj_geom(handle, &geometry.vertices)
            .with_context(|| format!("failed to set geometry of '{id}'"))?;
        if let Some(colors) = &geometry.colors {
            backend
                .obj_vert_clr(handle, colors)
                .with_context(|| format!("failed to set vertex colors of '{id}'"))?;
        }
        backend
            .obj_upload(handle)
            .with_context(|| format!("failed to upload geometry of '{id}'"))?;

        record.geometry_version += 1;
        self.stats.geometry_uploads += 1;
        Ok(())
    }

    pub fn apply_transform(
        &mut self,
        backend: &mut dyn Backend,
        id: &str,
        matrix: &[f32; 16],
    ) -> Result<()> {
        let record = self.record_mut(id)?;
        backend
            .obj_transform(record.handle, matrix)
            .with_context(|| format!("failed to set transform of '{id}'"))?;
        record.transform = Some(*matrix);
        self.stats.transform_updates += 1;
        Ok(())
    }

    /// Object tint. Not diffed: it is resent every time the object is touched.
    pub fn apply_color(&mut self, backend: &mut dyn Backend, id: &str, rgba: &[f32; 4]) -> Result<()> {
        let record = self.record_mut(id)?;
        backend
            .obj_color(record.handle, rgba)
            .with_context(|| format!("failed to set color of '{id}'"))?;
        record.color = Some(*rgba);
        self.stats.color_updates += 1;
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&ObjectRecord> {
        self.records.get(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObjectRecord)> {
        self.records.iter().map(|(id, rec)| (id.as_str(), rec))
    }

    #[inline]
    pub fn stats(&self) -> MirrorStats {
        self.stats
    }

    pub(crate) fn count_skipped(&mut self) {
        self.stats.skipped_updates += 1;
    }

    /// Stamps `id` as present in `generation`. Unknown ids are ignored.
    pub(crate) fn mark_seen(&mut self, id: &str, generation: u64) {
        if let Some(record) = self.records.get_mut(id) {
            record.seen = generation;
        }
    }

    /// Hides and forgets every record not stamped with `generation`.
    ///
    /// Returns the number of records removed.
    pub(crate) fn hide_unseen(&mut self, backend: &mut dyn Backend, generation: u64) -> Result<usize> {
        let stale: Vec<String> = self
            .records
            .iter()
            .filter(|(_, rec)| rec.seen != generation)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            if let Some(record) = self.records.remove(id) {
                backend
                    .obj_hide(record.handle)
                    .with_context(|| format!("failed to hide stale object '{id}'"))?;
                self.stats.hidden += 1;
                log::debug!("mirror: hid stale object '{id}'");
            }
        }

        Ok(stale.len())
    }

    fn record_mut(&mut self, id: &str) -> Result<&mut ObjectRecord> {
        self.records
            .get_mut(id)
            .with_context(|| format!("object '{id}' is not mirrored"))
    }
}
