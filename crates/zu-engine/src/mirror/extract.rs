use crate::host::{HostObject, MeshData};

/// Flat triangle-vertex stream of one object.
///
/// Every triangle contributes three independent vertices; there is no shared
/// index buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    /// `x, y, z` per vertex.
    pub vertices: Vec<f32>,
    /// `r, g, b, a` per vertex, present when the mesh has an active color layer.
    pub colors: Option<Vec<f32>>,
}

impl Geometry {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }
}

/// Host mesh data that cannot be flattened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("object '{object}': triangle {triangle} references missing loop {loop_index}")]
    MissingLoop {
        object: String,
        triangle: usize,
        loop_index: u32,
    },
    #[error("object '{object}': loop {loop_index} references missing vertex {vertex}")]
    MissingVertex {
        object: String,
        loop_index: u32,
        vertex: u32,
    },
    #[error("object '{object}': color layer has {got} entries, mesh has {expected} loops")]
    ColorLayerLength {
        object: String,
        expected: usize,
        got: usize,
    },
}

/// Reads the triangulated geometry of `object`.
///
/// Returns `Ok(None)` for objects that are not mesh-like or have no mesh.
pub fn extract(object: &dyn HostObject) -> Result<Option<Geometry>, ExtractError> {
    if !object.kind().is_mesh_like() {
        return Ok(None);
    }
    let Some(mesh) = object.to_mesh() else {
        return Ok(None);
    };
    flatten(object.id(), &mesh).map(Some)
}

fn flatten(id: &str, mesh: &MeshData) -> Result<Geometry, ExtractError> {
    if let Some(colors) = &mesh.loop_colors {
        if colors.len() != mesh.loop_vertices.len() {
            return Err(ExtractError::ColorLayerLength {
                object: id.to_string(),
                expected: mesh.loop_vertices.len(),
                got: colors.len(),
            });
        }
    }

    let corners = mesh.loop_triangles.len() * 3;
    let mut vertices: Vec<f32> = Vec::with_capacity(corners * 3);
    let mut colors: Option<Vec<f32>> = mesh.loop_colors.as_ref().map(|_| Vec::with_capacity(corners * 4));

    for (triangle, loops) in mesh.loop_triangles.iter().enumerate() {
        for &loop_index in loops {
            let vertex = *mesh.loop_vertices.get(loop_index as usize).ok_or_else(|| {
                ExtractError::MissingLoop {
                    object: id.to_string(),
                    triangle,
                    loop_index,
                }
            })?;
            let position = mesh.positions.get(vertex as usize).ok_or_else(|| {
                ExtractError::MissingVertex {
                    object: id.to_string(),
                    loop_index,
                    vertex,
                }
            })?;
            vertices.extend_from_slice(position);

            if let (Some(out), Some(layer)) = (colors.as_mut(), mesh.loop_colors.as_ref()) {
                out.extend_from_slice(&layer[loop_index as usize]);
            }
        }
    }

    Ok(Geometry { vertices, colors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::MemoryObject;
    use crate::host::ObjectKind;

    fn quad() -> MeshData {
        MeshData {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            loop_vertices: vec![0, 1, 2, 3],
            loop_triangles: vec![[0, 1, 2], [0, 2, 3]],
            loop_colors: None,
        }
    }

    // ── flattening ────────────────────────────────────────────────────────

    #[test]
    fn every_triangle_corner_becomes_a_vertex() {
        let obj = MemoryObject::mesh("Quad", quad());
        let geom = extract(&obj).unwrap().unwrap();
        assert_eq!(geom.vertex_count(), 6);
        assert_eq!(geom.triangle_count(), 2);
        // Second triangle starts again at vertex 0.
        assert_eq!(&geom.vertices[9..12], &[0.0, 0.0, 0.0]);
        assert_eq!(&geom.vertices[15..18], &[0.0, 1.0, 0.0]);
        assert!(geom.colors.is_none());
    }

    #[test]
    fn color_layer_is_expanded_in_parallel() {
        let mut mesh = quad();
        mesh.loop_colors = Some(vec![
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
        ]);
        let obj = MemoryObject::mesh("Quad", mesh);
        let geom = extract(&obj).unwrap().unwrap();
        let colors = geom.colors.as_ref().unwrap();
        assert_eq!(colors.len(), geom.vertex_count() * 4);
        assert_eq!(&colors[12..16], &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&colors[20..24], &[1.0, 1.0, 1.0, 1.0]);
    }

    // ── filtering ─────────────────────────────────────────────────────────

    #[test]
    fn non_mesh_like_objects_are_excluded() {
        let obj = MemoryObject::mesh("Lamp", quad()).with_kind(ObjectKind::Light);
        assert_eq!(extract(&obj).unwrap(), None);
    }

    #[test]
    fn curve_objects_are_mirrored() {
        let obj = MemoryObject::mesh("Text", quad()).with_kind(ObjectKind::Font);
        assert!(extract(&obj).unwrap().is_some());
    }

    // ── malformed input ───────────────────────────────────────────────────

    #[test]
    fn dangling_loop_index_is_reported() {
        let mut mesh = quad();
        mesh.loop_triangles.push([0, 1, 7]);
        let obj = MemoryObject::mesh("Broken", mesh);
        let err = extract(&obj).unwrap_err();
        assert_eq!(
            err,
            ExtractError::MissingLoop {
                object: "Broken".to_string(),
                triangle: 2,
                loop_index: 7,
            }
        );
    }

    #[test]
    fn short_color_layer_is_reported() {
        let mut mesh = quad();
        mesh.loop_colors = Some(vec![[1.0; 4]; 3]);
        let obj = MemoryObject::mesh("Broken", mesh);
        assert!(matches!(
            extract(&obj),
            Err(ExtractError::ColorLayerLength { expected: 4, got: 3, .. })
        ));
    }
}
