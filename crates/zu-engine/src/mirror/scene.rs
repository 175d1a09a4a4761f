use anyhow::{Context, Result};

use crate::backend::{Backend, SceneHandle};
use crate::gl::Framebuffer;
use crate::host::{HostObject, SceneState, UpdatedEntity};
use crate::math::flatten_row_major;

use super::{extract, MirrorStats, ObjectMirror};

/// What to push for an object being loaded.
#[derive(Debug, Copy, Clone)]
struct Dirty {
    geometry: bool,
    transform: bool,
}

impl Dirty {
    const ALL: Self = Self {
        geometry: true,
        transform: true,
    };
}

/// Backend scene plus the object mapping of one logical host scene.
///
/// One mirror lives for one batch render or one interactive session. The
/// backend scene must be released with [`teardown`](Self::teardown).
#[derive(Debug)]
pub struct SceneMirror {
    scene: Option<SceneHandle>,
    objects: ObjectMirror,
    generation: u64,
}

impl SceneMirror {
    pub fn new(backend: &mut dyn Backend) -> Result<Self> {
        let scene = backend.scene_new().context("failed to create backend scene")?;
        log::debug!("mirror: created {scene:?}");
        Ok(Self {
            scene: Some(scene),
            objects: ObjectMirror::new(scene),
            generation: 0,
        })
    }

    /// Mirrors every mesh-like object of `state`, pushing geometry, transform
    /// and color unconditionally.
    pub fn full_load(&mut self, backend: &mut dyn Backend, state: &dyn SceneState) -> Result<()> {
        self.generation += 1;
        let mut loaded = 0usize;

        for object in state.objects() {
            if !object.kind().is_mesh_like() {
                continue;
            }
            self.load_object(backend, object, Dirty::ALL)?;
            self.objects.mark_seen(object.id(), self.generation);
            loaded += 1;
        }

        log::debug!("mirror: full load of {loaded} objects");
        Ok(())
    }

    /// Applies the host's per-object change list.
    ///
    /// Geometry is re-extracted only for objects flagged geometry-changed and
    /// transforms are pushed only for transform-changed ones. Cost is
    /// proportional to the number of reported changes.
    pub fn apply_updates(&mut self, backend: &mut dyn Backend, state: &dyn SceneState) -> Result<()> {
        let mut applied = 0usize;

        for update in state.updates() {
            let UpdatedEntity::Object(object) = update.entity else {
                self.objects.count_skipped();
                continue;
            };
            if !object.kind().is_mesh_like() {
                self.objects.count_skipped();
                continue;
            }

            let dirty = Dirty {
                geometry: update.geometry_changed,
                transform: update.transform_changed,
            };
            self.load_object(backend, object, dirty)?;
            applied += 1;
        }

        if applied > 0 {
            log::debug!("mirror: applied {applied} object updates");
        }
        Ok(())
    }

    /// Hides records whose objects are no longer in the host scene.
    ///
    /// Only identities are walked; no geometry is read.
    pub fn prune_stale(&mut self, backend: &mut dyn Backend, state: &dyn SceneState) -> Result<usize> {
        self.generation += 1;
        for object in state.objects() {
            if object.kind().is_mesh_like() {
                self.objects.mark_seen(object.id(), self.generation);
            }
        }
        self.objects.hide_unseen(backend, self.generation)
    }

    pub fn set_camera(&mut self, backend: &mut dyn Backend, matrix: &[f32; 16]) -> Result<()> {
        let scene = self.scene()?;
        backend
            .scene_cam(scene, matrix)
            .context("failed to set scene camera")
    }

    pub fn draw(&mut self, backend: &mut dyn Backend, framebuffer: Framebuffer) -> Result<()> {
        let scene = self.scene()?;
        backend
            .scene_draw(scene, framebuffer)
            .with_context(|| format!("failed to draw scene into framebuffer {}", framebuffer.0))
    }

    /// Releases the backend scene. Safe to call more than once.
    pub fn teardown(&mut self, backend: &mut dyn Backend) {
        if let Some(scene) = self.scene.take() {
            let stats = self.objects.stats();
            backend.scene_del(scene);
            log::debug!(
                "mirror: released {scene:?} ({} objects, {} geometry uploads)",
                self.objects.len(),
                stats.geometry_uploads
            );
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.scene.is_some()
    }

    #[inline]
    pub fn objects(&self) -> &ObjectMirror {
        &self.objects
    }

    #[inline]
    pub fn stats(&self) -> MirrorStats {
        self.objects.stats()
    }

    fn scene(&self) -> Result<SceneHandle> {
        self.scene.context("scene mirror was already torn down")
    }

    fn load_object(
        &mut self,
        backend: &mut dyn Backend,
        object: &dyn HostObject,
        dirty: Dirty,
    ) -> Result<()> {
        let id = object.id();
        self.objects.ensure(backend, id)?;

        if dirty.geometry {
            match extract(object)? {
                Some(geometry) => {
                    match geometry.triangle_count() {
                        0 => log::debug!("mirror: '{id}' has no triangles"),
                        n => log::trace!("mirror: '{id}' uploading {n} triangles"),
                    }
                    self.objects.apply_geometry(backend, id, &geometry)?;
                }
                None => log::debug!("mirror: '{id}' has no mesh data"),
            }
        }

        if dirty.transform {
            let matrix = flatten_row_major(&object.world_matrix());
            self.objects.apply_transform(backend, id, &matrix)?;
        }

        self.objects.apply_color(backend, id, &object.color())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessGl, MemoryObject, MemoryScene, RasterBackend};
    use glam::{Mat4, Vec3};

    fn scene_with(names: &[&str]) -> MemoryScene {
        let mut scene = MemoryScene::new();
        for (i, name) in names.iter().enumerate() {
            scene.add(
                MemoryObject::triangle(name)
                    .with_transform(Mat4::from_translation(Vec3::new(i as f32, 0.0, 0.0))),
            );
        }
        scene
    }

    fn loaded(scene: &MemoryScene) -> (RasterBackend, SceneMirror) {
        let mut backend = RasterBackend::new(HeadlessGl::new());
        let mut mirror = SceneMirror::new(&mut backend).unwrap();
        mirror.full_load(&mut backend, scene).unwrap();
        scene.clear_updates();
        (backend, mirror)
    }

    fn snapshot(mirror: &SceneMirror) -> Vec<(String, crate::mirror::ObjectRecord)> {
        let mut records: Vec<_> = mirror
            .objects()
            .iter()
            .map(|(id, rec)| (id.to_string(), rec.clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    // ── full load ─────────────────────────────────────────────────────────

    #[test]
    fn full_load_mirrors_only_mesh_like_objects() {
        let mut scene = scene_with(&["A", "B"]);
        scene.add(MemoryObject::triangle("Lamp").with_kind(crate::host::ObjectKind::Light));
        let (backend, mirror) = loaded(&scene);

        assert_eq!(mirror.objects().len(), 2);
        assert!(mirror.objects().get("Lamp").is_none());
        assert_eq!(backend.object_count(), 2);
        assert_eq!(mirror.stats().geometry_uploads, 2);
    }

    #[test]
    fn mesh_without_triangles_is_still_mirrored() {
        let mut scene = scene_with(&["A"]);
        scene.add(MemoryObject::mesh("Empty", crate::host::MeshData::default()));
        let (backend, mirror) = loaded(&scene);

        let handle = mirror.objects().get("Empty").unwrap().handle;
        assert_eq!(backend.upload_count(handle), 1);
        assert_eq!(mirror.stats().geometry_uploads, 2);
    }

    #[test]
    fn no_op_diff_leaves_mirror_identical() {
        let scene = scene_with(&["A", "B", "C"]);
        let (mut backend, mut mirror) = loaded(&scene);
        let before = snapshot(&mirror);
        let uploads_before = backend.total_uploads();

        mirror.apply_updates(&mut backend, &scene).unwrap();

        assert_eq!(snapshot(&mirror), before);
        assert_eq!(backend.total_uploads(), uploads_before);
        assert_eq!(backend.object_count(), 3);
    }

    // ── incremental update ────────────────────────────────────────────────

    #[test]
    fn transform_only_update_does_not_reupload_geometry() {
        let scene = scene_with(&["A", "B"]);
        let (mut backend, mut mirror) = loaded(&scene);
        let handle = mirror.objects().get("A").unwrap().handle;

        let moved = Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0));
        scene.move_object("A", moved);
        mirror.apply_updates(&mut backend, &scene).unwrap();

        assert_eq!(backend.upload_count(handle), 1);
        assert_eq!(mirror.objects().get("A").unwrap().geometry_version, 1);
        assert_eq!(
            mirror.objects().get("A").unwrap().transform,
            Some(flatten_row_major(&moved))
        );
    }

    #[test]
    fn geometry_update_reuploads_once() {
        let scene = scene_with(&["A"]);
        let (mut backend, mut mirror) = loaded(&scene);
        let handle = mirror.objects().get("A").unwrap().handle;

        scene.touch_geometry("A");
        mirror.apply_updates(&mut backend, &scene).unwrap();

        assert_eq!(backend.upload_count(handle), 2);
        assert_eq!(mirror.objects().get("A").unwrap().geometry_version, 2);
    }

    #[test]
    fn new_object_reported_by_update_is_created() {
        let mut scene = scene_with(&["A"]);
        let (mut backend, mut mirror) = loaded(&scene);

        scene.add(MemoryObject::triangle("B"));
        mirror.apply_updates(&mut backend, &scene).unwrap();

        assert_eq!(mirror.objects().len(), 2);
        assert_eq!(mirror.objects().get("B").unwrap().geometry_version, 1);
    }

    #[test]
    fn color_is_resent_on_every_touch() {
        let scene = scene_with(&["A"]);
        let (mut backend, mut mirror) = loaded(&scene);

        scene.move_object("A", Mat4::IDENTITY);
        mirror.apply_updates(&mut backend, &scene).unwrap();
        scene.clear_updates();
        scene.move_object("A", Mat4::IDENTITY);
        mirror.apply_updates(&mut backend, &scene).unwrap();

        assert_eq!(mirror.stats().color_updates, 3);
    }

    #[test]
    fn non_object_updates_are_skipped() {
        let scene = scene_with(&["A"]);
        let (mut backend, mut mirror) = loaded(&scene);

        scene.report_other("Material");
        mirror.apply_updates(&mut backend, &scene).unwrap();

        assert_eq!(mirror.stats().skipped_updates, 1);
        assert_eq!(mirror.stats().color_updates, 1);
    }

    // ── stale objects ─────────────────────────────────────────────────────

    #[test]
    fn removed_object_stays_mirrored_without_pruning() {
        let mut scene = scene_with(&["A", "B"]);
        let (mut backend, mut mirror) = loaded(&scene);
        let handle = mirror.objects().get("B").unwrap().handle;

        scene.remove("B");
        mirror.apply_updates(&mut backend, &scene).unwrap();

        assert!(mirror.objects().get("B").is_some());
        assert!(!backend.is_hidden(handle));
    }

    #[test]
    fn prune_hides_removed_objects() {
        let mut scene = scene_with(&["A", "B"]);
        let (mut backend, mut mirror) = loaded(&scene);
        let handle = mirror.objects().get("B").unwrap().handle;

        scene.remove("B");
        assert_eq!(mirror.prune_stale(&mut backend, &scene).unwrap(), 1);
        assert!(mirror.objects().get("B").is_none());
        assert!(backend.is_hidden(handle));
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn teardown_releases_scene_once() {
        let scene = scene_with(&["A"]);
        let (mut backend, mut mirror) = loaded(&scene);

        mirror.teardown(&mut backend);
        mirror.teardown(&mut backend);

        assert!(!mirror.is_alive());
        assert_eq!(backend.scene_count(), 0);
        assert!(mirror.draw(&mut backend, Framebuffer::NONE).is_err());
    }
}
