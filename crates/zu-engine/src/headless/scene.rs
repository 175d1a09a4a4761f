use std::cell::{Cell, RefCell};

use glam::{Mat4, Vec3};

use crate::host::{
    HostCamera, HostObject, MeshData, ObjectKind, OutputSettings, SceneState, Update, UpdatedEntity,
};
use crate::math::perspective_for;

/// In-memory host object.
#[derive(Debug)]
pub struct MemoryObject {
    id: String,
    kind: ObjectKind,
    transform: Cell<Mat4>,
    color: [f32; 4],
    mesh: Option<MeshData>,
}

impl MemoryObject {
    pub fn mesh(id: &str, mesh: MeshData) -> Self {
        Self {
            id: id.to_string(),
            kind: ObjectKind::Mesh,
            transform: Cell::new(Mat4::IDENTITY),
            color: [1.0; 4],
            mesh: Some(mesh),
        }
    }

    /// Object with no mesh data (cameras, lights, empties).
    pub fn empty(id: &str, kind: ObjectKind) -> Self {
        Self {
            mesh: None,
            ..Self::mesh(id, MeshData::default()).with_kind(kind)
        }
    }

    /// Unit right triangle in the xy plane.
    pub fn triangle(id: &str) -> Self {
        Self::mesh(
            id,
            MeshData {
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                loop_vertices: vec![0, 1, 2],
                loop_triangles: vec![[0, 1, 2]],
                loop_colors: None,
            },
        )
    }

    /// Axis-aligned square of side `size` in the xz plane, centered on the origin.
    pub fn ground(id: &str, size: f32) -> Self {
        let h = size * 0.5;
        Self::mesh(
            id,
            MeshData {
                positions: vec![[-h, 0.0, -h], [h, 0.0, -h], [h, 0.0, h], [-h, 0.0, h]],
                loop_vertices: vec![0, 1, 2, 3],
                loop_triangles: vec![[0, 1, 2], [0, 2, 3]],
                loop_colors: None,
            },
        )
    }

    pub fn with_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_transform(self, transform: Mat4) -> Self {
        self.transform.set(transform);
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

impl HostObject for MemoryObject {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn world_matrix(&self) -> Mat4 {
        self.transform.get()
    }

    fn color(&self) -> [f32; 4] {
        self.color
    }

    fn to_mesh(&self) -> Option<MeshData> {
        self.mesh.clone()
    }
}

/// Perspective camera placed with a look-at.
#[derive(Debug, Copy, Clone)]
pub struct MemoryCamera {
    pub world: Mat4,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl MemoryCamera {
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        Self {
            world: Mat4::look_at_rh(eye, target, Vec3::Y).inverse(),
            fov_y: std::f32::consts::FRAC_PI_4,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl HostCamera for MemoryCamera {
    fn world_matrix(&self) -> Mat4 {
        self.world
    }

    fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        perspective_for(self.fov_y, width, height, self.near, self.far)
    }
}

#[derive(Debug)]
enum Pending {
    Object {
        id: String,
        geometry: bool,
        transform: bool,
    },
    Other(&'static str),
}

/// In-memory host scene with a dependency-update list.
///
/// Updates accumulate until [`clear_updates`](Self::clear_updates), the way a
/// host rebuilds its change list once per notification.
#[derive(Debug)]
pub struct MemoryScene {
    objects: Vec<MemoryObject>,
    pending: RefCell<Vec<Pending>>,
    camera: Option<MemoryCamera>,
    output: OutputSettings,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            pending: RefCell::new(Vec::new()),
            camera: None,
            output: OutputSettings {
                resolution_x: 1920,
                resolution_y: 1080,
                resolution_percentage: 100,
            },
        }
    }

    pub fn with_camera(mut self, camera: MemoryCamera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_output(mut self, width: u32, height: u32, percentage: u32) -> Self {
        self.output = OutputSettings {
            resolution_x: width,
            resolution_y: height,
            resolution_percentage: percentage,
        };
        self
    }

    /// Adds `object` and reports it as new (geometry and transform changed).
    pub fn add(&mut self, object: MemoryObject) {
        self.push(Pending::Object {
            id: object.id.clone(),
            geometry: true,
            transform: true,
        });
        self.objects.push(object);
    }

    /// Removes the object without reporting anything; hosts do not list
    /// deleted objects in their change list.
    pub fn remove(&mut self, id: &str) -> Option<MemoryObject> {
        let index = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(index))
    }

    pub fn object(&self, id: &str) -> Option<&MemoryObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Sets the world matrix of `id` and reports a transform change.
    pub fn move_object(&self, id: &str, transform: Mat4) {
        if let Some(object) = self.object(id) {
            object.transform.set(transform);
            self.push(Pending::Object {
                id: id.to_string(),
                geometry: false,
                transform: true,
            });
        }
    }

    /// Reports a geometry change of `id` (e.g. an edit-mode change).
    pub fn touch_geometry(&self, id: &str) {
        self.push(Pending::Object {
            id: id.to_string(),
            geometry: true,
            transform: false,
        });
    }

    /// Reports a change of something that is not an object.
    pub fn report_other(&self, name: &'static str) {
        self.push(Pending::Other(name));
    }

    pub fn clear_updates(&self) {
        self.pending.borrow_mut().clear();
    }

    pub fn pending_updates(&self) -> usize {
        self.pending.borrow().len()
    }

    fn push(&self, update: Pending) {
        self.pending.borrow_mut().push(update);
    }
}

impl SceneState for MemoryScene {
    fn objects(&self) -> Box<dyn Iterator<Item = &dyn HostObject> + '_> {
        Box::new(self.objects.iter().map(|o| o as &dyn HostObject))
    }

    fn updates(&self) -> Box<dyn Iterator<Item = Update<'_>> + '_> {
        let pending = self.pending.borrow();
        let updates: Vec<Update<'_>> = pending
            .iter()
            .filter_map(|update| match update {
                Pending::Object {
                    id,
                    geometry,
                    transform,
                } => self.object(id).map(|object| Update {
                    entity: UpdatedEntity::Object(object),
                    geometry_changed: *geometry,
                    transform_changed: *transform,
                }),
                Pending::Other(name) => Some(Update {
                    entity: UpdatedEntity::Other(*name),
                    geometry_changed: false,
                    transform_changed: false,
                }),
            })
            .collect();
        Box::new(updates.into_iter())
    }

    fn camera(&self) -> Option<&dyn HostCamera> {
        self.camera.as_ref().map(|c| c as &dyn HostCamera)
    }

    fn output(&self) -> OutputSettings {
        self.output
    }
}
