use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::{ensure, Result};
use glam::{Mat4, Vec3};

use crate::gl::{GlContext, Program};
use crate::host::{RenderHost, ResultRect, ViewContext};
use crate::math::perspective_for;
use crate::registry::PanelRegistry;

use super::gl::{HeadlessGl, DISPLAY_PROGRAM};

/// Pixels written into one result pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub rect: ResultRect,
    /// Bottom row first.
    pub pixels: Vec<[f32; 4]>,
}

impl RenderResult {
    /// Pixel at `(x, y)` counted from the bottom-left corner.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.rect.width || y >= self.rect.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.rect.width as usize + x as usize)
            .copied()
    }
}

/// In-memory render host: result buffer plus display space shader.
#[derive(Debug, Default)]
pub struct MemoryHost {
    gl: Option<HeadlessGl>,
    previous_program: Program,
    shader_bound: bool,
    shader_binds: u32,
    results: HashMap<String, RenderResult>,
}

impl MemoryHost {
    /// Host whose display space shader is bound through `gl`.
    pub fn new(gl: &HeadlessGl) -> Self {
        Self {
            gl: Some(gl.clone()),
            ..Self::default()
        }
    }

    /// Host whose shader binding silently binds nothing.
    pub fn without_display_shader() -> Self {
        Self::default()
    }

    pub fn shader_binds(&self) -> u32 {
        self.shader_binds
    }

    pub fn shader_bound(&self) -> bool {
        self.shader_bound
    }

    pub fn result(&self, pass: &str) -> Option<&RenderResult> {
        self.results.get(pass)
    }
}

impl RenderHost for MemoryHost {
    fn bind_display_space_shader(&mut self) {
        if let Some(gl) = &self.gl {
            self.previous_program = gl.current_program();
            gl.use_program(DISPLAY_PROGRAM);
        }
        self.shader_bound = true;
        self.shader_binds += 1;
    }

    fn unbind_display_space_shader(&mut self) {
        if let Some(gl) = &self.gl {
            gl.use_program(self.previous_program);
        }
        self.shader_bound = false;
    }

    fn write_result(&mut self, rect: ResultRect, pass: &str, pixels: &[[f32; 4]]) -> Result<()> {
        let expected = rect.width as usize * rect.height as usize;
        ensure!(
            pixels.len() == expected,
            "result rect {}x{} needs {expected} pixels, got {}",
            rect.width,
            rect.height,
            pixels.len()
        );
        self.results.insert(
            pass.to_string(),
            RenderResult {
                rect,
                pixels: pixels.to_vec(),
            },
        );
        Ok(())
    }
}

/// In-memory panel table: panel name → compatible engine ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryPanels {
    panels: BTreeMap<String, BTreeSet<String>>,
}

impl MemoryPanels {
    /// Sets the compatible engines of `panel`.
    pub fn insert(&mut self, panel: &str, engines: &[&str]) {
        self.panels.insert(
            panel.to_string(),
            engines.iter().map(|e| e.to_string()).collect(),
        );
    }

    pub fn engines(&self, panel: &str) -> BTreeSet<String> {
        self.panels.get(panel).cloned().unwrap_or_default()
    }
}

impl PanelRegistry for MemoryPanels {
    fn panels_for(&self, engine: &str) -> Vec<String> {
        self.panels
            .iter()
            .filter(|(_, engines)| engines.contains(engine))
            .map(|(panel, _)| panel.clone())
            .collect()
    }

    fn add_engine(&mut self, panel: &str, engine: &str) {
        if let Some(engines) = self.panels.get_mut(panel) {
            engines.insert(engine.to_string());
        }
    }

    fn remove_engine(&mut self, panel: &str, engine: &str) {
        if let Some(engines) = self.panels.get_mut(panel) {
            engines.remove(engine);
        }
    }
}

/// Interactive viewport with a look-at view and a perspective lens.
#[derive(Debug, Copy, Clone)]
pub struct MemoryView {
    width: u32,
    height: u32,
    view: Mat4,
    fov_y: f32,
}

impl MemoryView {
    pub fn looking_at(width: u32, height: u32, eye: Vec3, target: Vec3) -> Self {
        Self {
            width,
            height,
            view: Mat4::look_at_rh(eye, target, Vec3::Y),
            fov_y: std::f32::consts::FRAC_PI_4,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Rotates the view about the world y axis.
    pub fn orbit(&mut self, angle: f32) {
        self.view *= Mat4::from_rotation_y(angle);
    }
}

impl ViewContext for MemoryView {
    fn region_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn perspective_matrix(&self) -> Mat4 {
        perspective_for(self.fov_y, self.width, self.height, 0.1, 100.0) * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::ViewportRect;

    #[test]
    fn shader_binding_restores_previous_program() {
        let gl = HeadlessGl::new();
        gl.use_program(Program(7));
        let mut host = MemoryHost::new(&gl);

        host.bind_display_space_shader();
        assert_eq!(gl.current_program(), DISPLAY_PROGRAM);
        host.unbind_display_space_shader();
        assert_eq!(gl.current_program(), Program(7));
    }

    #[test]
    fn write_result_checks_pixel_count() {
        let mut host = MemoryHost::without_display_shader();
        let rect = ViewportRect::sized(2, 1);
        assert!(host.write_result(rect, "Combined", &[[0.0; 4]]).is_err());

        host.write_result(rect, "Combined", &[[0.0; 4], [1.0; 4]]).unwrap();
        assert_eq!(host.result("Combined").unwrap().pixel(1, 0), Some([1.0; 4]));
    }
}
