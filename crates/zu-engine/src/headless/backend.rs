use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use glam::{Mat4, Vec3, Vec4};

use crate::backend::{Backend, ObjectHandle, SceneHandle};
use crate::gl::{Framebuffer, GlContext, ViewportRect};
use crate::math::{from_row_major, row_major_from_slice};

use super::gl::{DepthSurface, HeadlessGl, Surface};

/// One `scene_draw` call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawRecord {
    pub scene: SceneHandle,
    pub framebuffer: Framebuffer,
    /// Triangles that produced at least one fragment.
    pub triangles: usize,
}

#[derive(Debug, Default)]
struct SceneData {
    camera: Option<Mat4>,
}

#[derive(Debug, Clone, Default)]
struct Mesh {
    vertices: Vec<f32>,
    colors: Option<Vec<f32>>,
}

#[derive(Debug)]
struct ObjectData {
    scene: SceneHandle,
    pending: Option<Mesh>,
    uploaded: Option<Mesh>,
    transform: Option<[f32; 16]>,
    color: [f32; 4],
    hidden: bool,
    uploads: u64,
}

/// Software Zu backend drawing into [`HeadlessGl`] framebuffers.
///
/// Triangles are rasterized at pixel centers with a depth test against the
/// target's depth attachment. Fragment color is the object color times the
/// interpolated vertex color.
#[derive(Debug)]
pub struct RasterBackend {
    gl: HeadlessGl,
    next_handle: u64,
    scenes: HashMap<SceneHandle, SceneData>,
    objects: HashMap<ObjectHandle, ObjectData>,
    gl_depth: u32,
    unguarded_calls: u64,
    draws: Vec<DrawRecord>,
}

impl RasterBackend {
    pub fn new(gl: HeadlessGl) -> Self {
        Self {
            gl,
            next_handle: 0,
            scenes: HashMap::new(),
            objects: HashMap::new(),
            gl_depth: 0,
            unguarded_calls: 0,
            draws: Vec::new(),
        }
    }

    #[inline]
    pub fn gl(&self) -> &HeadlessGl {
        &self.gl
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn upload_count(&self, obj: ObjectHandle) -> u64 {
        self.objects.get(&obj).map_or(0, |o| o.uploads)
    }

    pub fn total_uploads(&self) -> u64 {
        self.objects.values().map(|o| o.uploads).sum()
    }

    /// Row-major transform last set on `obj`.
    pub fn object_transform(&self, obj: ObjectHandle) -> Option<[f32; 16]> {
        self.objects.get(&obj).and_then(|o| o.transform)
    }

    pub fn is_hidden(&self, obj: ObjectHandle) -> bool {
        self.objects.get(&obj).is_some_and(|o| o.hidden)
    }

    #[inline]
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Current `gl_enable` nesting depth. Zero between entry points.
    #[inline]
    pub fn gl_depth(&self) -> u32 {
        self.gl_depth
    }

    /// GPU-touching calls (uploads, draws) made outside `gl_enable`/`gl_disable`.
    #[inline]
    pub fn unguarded_calls(&self) -> u64 {
        self.unguarded_calls
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn note_gpu_call(&mut self, what: &str) {
        if self.gl_depth == 0 {
            self.unguarded_calls += 1;
            log::warn!("raster backend: {what} outside gl_enable/gl_disable");
        }
    }

    fn object_mut(&mut self, obj: ObjectHandle) -> Result<&mut ObjectData> {
        self.objects
            .get_mut(&obj)
            .with_context(|| format!("unknown backend object {}", obj.0))
    }
}

impl Backend for RasterBackend {
    fn scene_new(&mut self) -> Result<SceneHandle> {
        let scene = SceneHandle(self.next());
        self.scenes.insert(scene, SceneData::default());
        Ok(scene)
    }

    fn scene_del(&mut self, scene: SceneHandle) {
        if self.scenes.remove(&scene).is_none() {
            log::warn!("raster backend: scene {} released twice", scene.0);
            return;
        }
        self.objects.retain(|_, o| o.scene != scene);
    }

    fn scene_cam(&mut self, scene: SceneHandle, matrix: &[f32]) -> Result<()> {
        let matrix = from_row_major(&row_major_from_slice(matrix)?);
        let data = self
            .scenes
            .get_mut(&scene)
            .with_context(|| format!("unknown backend scene {}", scene.0))?;
        data.camera = Some(matrix);
        Ok(())
    }

    fn scene_draw(&mut self, scene: SceneHandle, framebuffer: Framebuffer) -> Result<()> {
        self.note_gpu_call("scene_draw");
        let camera = self
            .scenes
            .get(&scene)
            .with_context(|| format!("unknown backend scene {}", scene.0))?
            .camera
            .unwrap_or(Mat4::IDENTITY);

        let viewport = self.gl.viewport_rect();
        let objects: Vec<&ObjectData> = self
            .objects
            .values()
            .filter(|o| o.scene == scene && !o.hidden)
            .collect();

        let triangles = self
            .gl
            .with_surfaces(framebuffer, |color, depth| {
                let mut raster = Raster {
                    viewport,
                    color,
                    depth,
                };
                objects
                    .iter()
                    .map(|object| raster.draw_object(camera, object))
                    .sum::<usize>()
            })
            .with_context(|| format!("framebuffer {} has no color attachment", framebuffer.0))?;

        log::trace!("raster backend: scene {} drew {triangles} triangles", scene.0);
        self.draws.push(DrawRecord {
            scene,
            framebuffer,
            triangles,
        });
        Ok(())
    }

    fn obj_new(&mut self, scene: SceneHandle) -> Result<ObjectHandle> {
        if !self.scenes.contains_key(&scene) {
            bail!("unknown backend scene {}", scene.0);
        }
        let obj = ObjectHandle(self.next());
        self.objects.insert(
            obj,
            ObjectData {
                scene,
                pending: None,
                uploaded: None,
                transform: None,
                color: [1.0; 4],
                hidden: false,
                uploads: 0,
            },
        );
        Ok(obj)
    }

    fn obj_geom(&mut self, obj: ObjectHandle, vertices: &[f32]) -> Result<()> {
        if vertices.len() % 9 != 0 {
            bail!(
                "vertex stream of {} floats is not a whole number of triangles",
                vertices.len()
            );
        }
        self.object_mut(obj)?.pending = Some(Mesh {
            vertices: vertices.to_vec(),
            colors: None,
        });
        Ok(())
    }

    fn obj_vert_clr(&mut self, obj: ObjectHandle, colors: &[f32]) -> Result<()> {
        let pending = self
            .object_mut(obj)?
            .pending
            .as_mut()
            .context("vertex colors set before geometry")?;
        let expected = pending.vertices.len() / 3 * 4;
        if colors.len() != expected {
            bail!("expected {expected} vertex color floats, got {}", colors.len());
        }
        pending.colors = Some(colors.to_vec());
        Ok(())
    }

    fn obj_transform(&mut self, obj: ObjectHandle, matrix: &[f32]) -> Result<()> {
        let matrix = row_major_from_slice(matrix)?;
        self.object_mut(obj)?.transform = Some(matrix);
        Ok(())
    }

    fn obj_color(&mut self, obj: ObjectHandle, rgba: &[f32]) -> Result<()> {
        let color: [f32; 4] = rgba
            .try_into()
            .map_err(|_| anyhow::anyhow!("color should have 4 elements, got {}", rgba.len()))?;
        self.object_mut(obj)?.color = color;
        Ok(())
    }

    fn obj_hide(&mut self, obj: ObjectHandle) -> Result<()> {
        self.object_mut(obj)?.hidden = true;
        Ok(())
    }

    fn obj_upload(&mut self, obj: ObjectHandle) -> Result<()> {
        self.note_gpu_call("obj_upload");
        let object = self.object_mut(obj)?;
        let mesh = object.pending.take().context("no pending geometry to upload")?;
        object.uploaded = Some(mesh);
        object.uploads += 1;
        Ok(())
    }

    fn gl_enable(&mut self) {
        self.gl_depth += 1;
    }

    fn gl_disable(&mut self) {
        match self.gl_depth.checked_sub(1) {
            Some(depth) => self.gl_depth = depth,
            None => log::warn!("raster backend: gl_disable without gl_enable"),
        }
    }
}

struct Raster<'a> {
    viewport: ViewportRect,
    color: &'a mut Surface,
    depth: Option<&'a mut DepthSurface>,
}

/// Window-space vertex: pixel x/y, depth in `[0, 1]`.
#[derive(Copy, Clone)]
struct Projected {
    position: Vec3,
    color: Vec4,
}

impl Raster<'_> {
    fn draw_object(&mut self, camera: Mat4, object: &ObjectData) -> usize {
        let Some(mesh) = &object.uploaded else {
            return 0;
        };
        let model = object.transform.as_ref().map_or(Mat4::IDENTITY, from_row_major);
        let mvp = camera * model;
        let tint = Vec4::from_array(object.color);

        let mut drawn = 0;
        for (i, triangle) in mesh.vertices.chunks_exact(9).enumerate() {
            let mut corners = [None; 3];
            for (corner, slot) in corners.iter_mut().enumerate() {
                let p = &triangle[corner * 3..corner * 3 + 3];
                let color = mesh
                    .colors
                    .as_ref()
                    .map_or(Vec4::ONE, |c| Vec4::from_slice(&c[(i * 3 + corner) * 4..]));
                *slot = self.project(mvp, Vec3::new(p[0], p[1], p[2]), tint * color);
            }
            if let [Some(a), Some(b), Some(c)] = corners {
                if self.fill(a, b, c) {
                    drawn += 1;
                }
            }
        }
        drawn
    }

    /// Vertices behind the eye are dropped rather than clipped.
    fn project(&self, mvp: Mat4, position: Vec3, color: Vec4) -> Option<Projected> {
        let clip = mvp * position.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let vp = self.viewport;
        Some(Projected {
            position: Vec3::new(
                vp.x as f32 + (ndc.x + 1.0) * 0.5 * vp.width as f32,
                vp.y as f32 + (ndc.y + 1.0) * 0.5 * vp.height as f32,
                (ndc.z + 1.0) * 0.5,
            ),
            color,
        })
    }

    fn fill(&mut self, a: Projected, b: Projected, c: Projected) -> bool {
        let (pa, pb, pc) = (a.position, b.position, c.position);
        let area = edge(pa, pb, pc);
        if area.abs() <= f32::EPSILON {
            return false;
        }

        let vp = self.viewport;
        let min_x = pa.x.min(pb.x).min(pc.x).floor().max(vp.x as f32) as i64;
        let min_y = pa.y.min(pb.y).min(pc.y).floor().max(vp.y as f32) as i64;
        let max_x = pa.x.max(pb.x).max(pc.x).ceil().min((vp.x as f32) + vp.width as f32) as i64;
        let max_y = pa.y.max(pb.y).max(pc.y).ceil().min((vp.y as f32) + vp.height as f32) as i64;

        let mut touched = false;
        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let wa = edge(pb, pc, p) / area;
                let wb = edge(pc, pa, p) / area;
                let wc = edge(pa, pb, p) / area;
                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }
                let z = wa * pa.z + wb * pb.z + wc * pc.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                let Some(index) = self.color.index(x, y) else {
                    continue;
                };
                if let Some(depth) = self.depth.as_deref_mut() {
                    match depth.depth.get_mut(index) {
                        Some(stored) if z < *stored => *stored = z,
                        _ => continue,
                    }
                }
                let color = a.color * wa + b.color * wb + c.color * wc;
                self.color.pixels[index] = color.to_array();
                touched = true;
            }
        }
        touched
    }
}

/// Twice the signed area of `(a, b, c)` in the xy plane.
#[inline]
fn edge(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}
