use glam::Mat4;

/// Host object type tag.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ObjectKind {
    Mesh,
    Curve,
    Surface,
    Meta,
    Font,
    Volume,
    Camera,
    Light,
    Empty,
    Armature,
    Other,
}

impl ObjectKind {
    /// Types the host can turn into a triangle mesh. Only these are mirrored.
    #[inline]
    pub fn is_mesh_like(self) -> bool {
        matches!(
            self,
            Self::Mesh | Self::Curve | Self::Surface | Self::Meta | Self::Font | Self::Volume
        )
    }
}

/// A tessellated host mesh.
///
/// Mirrors the host's loop-based layout: each face corner ("loop") points at a
/// vertex, and each triangle names three loops. Per-corner attributes such as
/// vertex colors are stored per loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    /// Vertex index of every loop.
    pub loop_vertices: Vec<u32>,
    /// Loop indices of every triangle.
    pub loop_triangles: Vec<[u32; 3]>,
    /// Active per-loop color layer, if any (straight RGBA).
    pub loop_colors: Option<Vec<[f32; 4]>>,
}

/// A host scene object.
pub trait HostObject {
    /// Stable identity, unique within the scene (full name including library).
    fn id(&self) -> &str;

    fn kind(&self) -> ObjectKind;

    /// Object space → world space.
    fn world_matrix(&self) -> Mat4;

    /// Object tint color (straight RGBA).
    fn color(&self) -> [f32; 4];

    /// Evaluated, triangulated mesh. `None` for objects without geometry.
    fn to_mesh(&self) -> Option<MeshData>;
}
