use anyhow::{Context, Result};

use crate::backend::{Backend, GlAccess};
use crate::config::{EngineConfig, EngineInfo, StalePolicy};
use crate::device::{FramebufferManager, FramebufferTarget};
use crate::gl::{FramebufferBinding, GlContext, GlState, ViewportRect};
use crate::host::{RenderHost, SceneState, ViewContext};
use crate::math;
use crate::mirror::SceneMirror;

use super::{read_target, repack_rgba, Compositor};

/// State of one interactive viewport session.
#[derive(Debug)]
pub struct ViewSession {
    mirror: SceneMirror,
    targets: FramebufferManager,
    draws: u64,
}

impl ViewSession {
    #[inline]
    pub fn mirror(&self) -> &SceneMirror {
        &self.mirror
    }

    #[inline]
    pub fn target(&self) -> Option<&FramebufferTarget> {
        self.targets.target()
    }

    /// Offscreen target allocations of this session (1 + number of resizes).
    #[inline]
    pub fn allocations(&self) -> u64 {
        self.targets.allocations()
    }

    #[inline]
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

/// Zu render engine: the host's render-engine plugin.
///
/// Every entry point is synchronous and leaves the host's GL bindings as it
/// found them, on success and on failure. The engine keeps the host's GL
/// context so an interactive session can be released even when the engine is
/// dropped without [`end_session`](Self::end_session).
pub struct RenderEngine<B: Backend, G: GlContext> {
    backend: B,
    gl: G,
    config: EngineConfig,
    session: Option<ViewSession>,
}

impl<B: Backend, G: GlContext> RenderEngine<B, G> {
    pub fn new(backend: B, gl: G, config: EngineConfig) -> Self {
        Self {
            backend,
            gl,
            config,
            session: None,
        }
    }

    #[inline]
    pub fn info(&self) -> &EngineInfo {
        &self.config.info
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn gl(&self) -> &G {
        &self.gl
    }

    #[inline]
    pub fn session(&self) -> Option<&ViewSession> {
        self.session.as_ref()
    }

    /// Final render of `state` into the host's result buffer.
    ///
    /// The scene mirror and the offscreen target exist only for the duration
    /// of this call and are released whether or not the render succeeds.
    pub fn batch_render(&mut self, host: &mut dyn RenderHost, state: &dyn SceneState) -> Result<()> {
        let Self {
            backend,
            gl,
            config,
            ..
        } = self;
        let gl: &dyn GlContext = gl;

        let result = GlState::preserve(gl, || render_to_result(gl, backend, config, host, state));
        if let Err(err) = &result {
            log::error!("batch render failed: {err:#}");
        }
        result
    }

    /// Starts an interactive session: full scene load plus a viewport-sized
    /// target with its compositing quad. Ends any previous session first.
    pub fn view_enter(&mut self, view: &dyn ViewContext, state: &dyn SceneState) -> Result<()> {
        self.end_session();

        let (width, height) = view.region_size();
        let Self {
            backend,
            gl,
            config,
            ..
        } = &mut *self;
        let gl: &dyn GlContext = gl;

        let session = GlState::preserve(gl, || -> Result<ViewSession> {
            let mut backend = GlAccess::enter(backend);
            let mut mirror = SceneMirror::new(&mut *backend)?;
            let mut targets = FramebufferManager::new(config.color_format, config.depth_format);

            let setup = (|| -> Result<()> {
                mirror.full_load(&mut *backend, state)?;
                allocate_view_target(gl, &mut targets, width, height)
            })();
            if let Err(err) = setup {
                targets.destroy(gl);
                mirror.teardown(&mut *backend);
                return Err(err);
            }

            Ok(ViewSession {
                mirror,
                targets,
                draws: 0,
            })
        });

        match session {
            Ok(session) => {
                log::info!(
                    "viewport session started ({} objects, {width}x{height})",
                    session.mirror.objects().len()
                );
                self.session = Some(session);
                Ok(())
            }
            Err(err) => {
                log::error!("viewport session failed to start: {err:#}");
                Err(err)
            }
        }
    }

    /// Applies the host's change list and redraws.
    ///
    /// Starts a session when none is active.
    pub fn view_update(
        &mut self,
        host: &mut dyn RenderHost,
        view: &dyn ViewContext,
        state: &dyn SceneState,
    ) -> Result<()> {
        if self.session.is_none() {
            self.view_enter(view, state)?;
            return self.view_draw(host, view, state);
        }

        let prune = self.config.stale_objects == StalePolicy::Hide;
        let Self {
            backend, session, ..
        } = &mut *self;
        if let Some(session) = session.as_mut() {
            let mut backend = GlAccess::enter(backend);
            let applied = (|| -> Result<()> {
                session.mirror.apply_updates(&mut *backend, state)?;
                if prune {
                    let hidden = session.mirror.prune_stale(&mut *backend, state)?;
                    if hidden > 0 {
                        log::debug!("hid {hidden} stale objects");
                    }
                }
                Ok(())
            })();
            if let Err(err) = applied {
                log::error!("viewport update failed: {err:#}");
                return Err(err);
            }
        }

        self.view_draw(host, view, state)
    }

    /// Redraws the viewport: camera, resize check, backend draw into the
    /// offscreen target, then composite into the host's bound framebuffer.
    pub fn view_draw(
        &mut self,
        host: &mut dyn RenderHost,
        view: &dyn ViewContext,
        state: &dyn SceneState,
    ) -> Result<()> {
        if self.session.is_none() {
            self.view_enter(view, state)?;
        }
        let Self {
            backend,
            gl,
            config,
            session,
        } = &mut *self;
        let gl: &dyn GlContext = gl;
        let session = session
            .as_mut()
            .context("view_draw called without an active session")?;

        let (width, height) = view.region_size();
        let cam = math::viewport_camera(view);
        let destination = gl.framebuffer_binding(FramebufferBinding::Draw);
        let host_viewport = gl.viewport_rect();

        let drawn = GlState::preserve(gl, || -> Result<()> {
            let mut backend = GlAccess::enter(backend);

            let resized = session
                .targets
                .ensure_size(gl, width, height)
                .context("failed to resize viewport target")?;
            let target = session
                .targets
                .target_mut()
                .context("viewport target missing after allocation")?;
            if resized {
                Compositor::prepare(gl, target)?;
            }

            session.mirror.set_camera(&mut *backend, &cam)?;

            target.bind(gl)?;
            gl.clear(config.clear_color);
            let drawn = session.mirror.draw(&mut *backend, target.framebuffer());
            target.unbind(gl, destination);
            drawn?;

            gl.viewport(host_viewport);
            Compositor::present(gl, host, target, destination)?;
            session.draws += 1;
            Ok(())
        });

        if let Err(err) = &drawn {
            log::error!("viewport draw failed: {err:#}");
        }
        drawn
    }

    /// Releases the interactive session's backend scene and GL objects.
    pub fn end_session(&mut self) {
        let Self {
            backend,
            gl,
            session,
            ..
        } = self;
        let Some(mut session) = session.take() else {
            return;
        };
        let gl: &dyn GlContext = gl;

        GlState::preserve(gl, || {
            let mut backend = GlAccess::enter(backend);
            session.mirror.teardown(&mut *backend);
            session.targets.destroy(gl);
        });

        let stats = session.mirror.stats();
        log::info!(
            "viewport session ended: {} draws, {} allocations, {} objects, {} geometry uploads, {} transform updates",
            session.draws,
            session.targets.allocations(),
            session.mirror.objects().len(),
            stats.geometry_uploads,
            stats.transform_updates
        );
    }
}

impl<B: Backend, G: GlContext> Drop for RenderEngine<B, G> {
    fn drop(&mut self) {
        if self.session.is_some() {
            log::warn!("render engine dropped with an active viewport session; releasing it");
            self.end_session();
        }
    }
}

fn render_to_result(
    gl: &dyn GlContext,
    backend: &mut dyn Backend,
    config: &EngineConfig,
    host: &mut dyn RenderHost,
    state: &dyn SceneState,
) -> Result<()> {
    let (width, height) = state.output().size();
    let camera = state.camera().context("scene has no active camera")?;
    let cam = math::batch_camera(camera, width, height);

    let mut backend = GlAccess::enter(backend);
    let mut target =
        FramebufferManager::scoped(gl, config.color_format, config.depth_format, width, height)
            .context("failed to create offscreen render target")?;

    let mut mirror = SceneMirror::new(&mut *backend)?;
    let rendered = (|| -> Result<Vec<f32>> {
        let previous = gl.framebuffer_binding(FramebufferBinding::Draw);
        target.bind(gl)?;
        gl.clear(config.clear_color);
        mirror.full_load(&mut *backend, state)?;
        mirror.set_camera(&mut *backend, &cam)?;
        mirror.draw(&mut *backend, target.framebuffer())?;
        let pixels = read_target(gl, &target);
        target.unbind(gl, previous);
        pixels
    })();
    mirror.teardown(&mut *backend);
    let pixels = rendered?;

    let rect = ViewportRect::sized(width, height);
    host.write_result(rect, &config.result_pass, repack_rgba(&pixels)?)
        .context("failed to write render result")?;
    log::info!("batch render complete ({width}x{height})");
    Ok(())
}

fn allocate_view_target(
    gl: &dyn GlContext,
    targets: &mut FramebufferManager,
    width: u32,
    height: u32,
) -> Result<()> {
    let target = targets
        .allocate(gl, width, height)
        .context("failed to create viewport render target")?;
    Compositor::prepare(gl, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::Program;
    use crate::headless::{
        FailPoint, HeadlessGl, MemoryCamera, MemoryHost, MemoryObject, MemoryScene, MemoryView,
        RasterBackend,
    };
    use crate::host::MeshData;
    use crate::math::flatten_row_major;
    use crate::mirror::ExtractError;
    use glam::{Mat4, Vec3};

    const EYE: Vec3 = Vec3::new(0.3, 0.3, 1.5);
    const LOOK: Vec3 = Vec3::new(0.3, 0.3, 0.0);
    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    fn engine(gl: &HeadlessGl) -> RenderEngine<RasterBackend, HeadlessGl> {
        RenderEngine::new(RasterBackend::new(gl.clone()), gl.clone(), EngineConfig::default())
    }

    fn triangle_scene(width: u32, height: u32) -> MemoryScene {
        let mut scene = MemoryScene::new()
            .with_camera(MemoryCamera::looking_at(EYE, LOOK))
            .with_output(width, height, 100);
        scene.add(MemoryObject::triangle("Tri").with_color(RED));
        scene
    }

    fn view(width: u32, height: u32) -> MemoryView {
        MemoryView::looking_at(width, height, EYE, LOOK)
    }

    fn assert_color(actual: [f32; 4], expected: [f32; 4]) {
        for (a, e) in actual.into_iter().zip(expected) {
            approx::assert_abs_diff_eq!(a, e, epsilon = 1e-5);
        }
    }

    fn assert_released(gl: &HeadlessGl, engine: &RenderEngine<RasterBackend, HeadlessGl>) {
        assert_eq!(gl.live_objects(), 0);
        assert_eq!(gl.double_deletes(), 0);
        assert_eq!(engine.backend().scene_count(), 0);
        assert_eq!(engine.backend().gl_depth(), 0);
    }

    // ── batch render ──────────────────────────────────────────────────────

    #[test]
    fn batch_render_writes_full_result() {
        let gl = HeadlessGl::new();
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);

        engine
            .batch_render(&mut host, &triangle_scene(4, 4))
            .unwrap();

        let result = host.result("Combined").unwrap();
        assert_eq!(result.rect, ViewportRect::sized(4, 4));
        assert_eq!(result.pixels.len(), 16);
        assert!(result.pixels.iter().flatten().all(|c| c.is_finite()));
        assert_color(result.pixel(1, 1).unwrap(), RED);
        assert_eq!(result.pixel(3, 3), Some([0.0; 4]));

        assert_released(&gl, &engine);
        assert_eq!(engine.backend().unguarded_calls(), 0);
        assert!(engine.session().is_none());
    }

    #[test]
    fn batch_render_applies_resolution_percentage() {
        let gl = HeadlessGl::new();
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let scene = triangle_scene(8, 6).with_output(8, 6, 50);

        engine.batch_render(&mut host, &scene).unwrap();
        assert_eq!(host.result("Combined").unwrap().rect, ViewportRect::sized(4, 3));
    }

    #[test]
    fn batch_render_without_camera_fails_cleanly() {
        let gl = HeadlessGl::new();
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let mut scene = MemoryScene::new().with_output(4, 4, 100);
        scene.add(MemoryObject::triangle("Tri"));

        let err = engine.batch_render(&mut host, &scene).unwrap_err();
        assert_eq!(err.to_string(), "scene has no active camera");
        assert!(host.result("Combined").is_none());
        assert_released(&gl, &engine);
    }

    #[test]
    fn batch_render_gl_failures_leak_nothing_and_restore_state() {
        for point in [
            FailPoint::CreateFramebuffer,
            FailPoint::CreateTexture,
            FailPoint::TexImage,
            FailPoint::CreateRenderbuffer,
            FailPoint::StatusQuery,
        ] {
            let gl = HeadlessGl::with_window(4, 4);
            gl.viewport(ViewportRect {
                x: 1,
                y: 1,
                width: 2,
                height: 2,
            });
            gl.active_texture(2);
            let before = GlState::capture(&gl);
            let mut engine = engine(&gl);
            let mut host = MemoryHost::new(&gl);

            gl.fail_next(point);
            assert!(
                engine.batch_render(&mut host, &triangle_scene(4, 4)).is_err(),
                "{point:?} should fail"
            );
            assert_eq!(GlState::capture(&gl), before, "{point:?} left GL state behind");
            assert_released(&gl, &engine);
        }
    }

    #[test]
    fn batch_render_backend_failure_releases_scene_and_target() {
        let gl = HeadlessGl::new();
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let mut scene = triangle_scene(4, 4);
        scene.add(MemoryObject::mesh(
            "Broken",
            MeshData {
                positions: vec![[0.0; 3]],
                loop_vertices: vec![0],
                loop_triangles: vec![[0, 1, 2]],
                loop_colors: None,
            },
        ));

        let err = engine.batch_render(&mut host, &scene).unwrap_err();
        assert!(err.downcast_ref::<ExtractError>().is_some());
        assert_released(&gl, &engine);
    }

    // ── interactive session ───────────────────────────────────────────────

    #[test]
    fn view_enter_loads_scene_and_allocates_target() {
        let gl = HeadlessGl::with_window(8, 8);
        let mut engine = engine(&gl);

        engine.view_enter(&view(8, 8), &triangle_scene(8, 8)).unwrap();

        let session = engine.session().unwrap();
        assert_eq!(session.mirror().objects().len(), 1);
        assert_eq!(session.allocations(), 1);
        assert_eq!(session.target().unwrap().size(), (8, 8));
        assert_eq!(gl.live_objects(), 6);
        assert_eq!(engine.backend().gl_depth(), 0);
    }

    #[test]
    fn view_draw_composites_into_host_framebuffer() {
        let gl = HeadlessGl::with_window(4, 4);
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let scene = triangle_scene(4, 4);
        let view = view(4, 4);

        engine.view_enter(&view, &scene).unwrap();
        engine.view_draw(&mut host, &view, &scene).unwrap();

        assert_color(gl.window_pixel(1, 1).unwrap(), RED);
        assert_eq!(gl.window_pixel(3, 3), Some([0.0; 4]));
        assert_eq!(engine.session().unwrap().draws(), 1);
        assert_eq!(host.shader_binds(), 1);
        assert!(!host.shader_bound());
        assert_eq!(engine.backend().unguarded_calls(), 0);
    }

    #[test]
    fn view_calls_restore_host_gl_state() {
        let gl = HeadlessGl::with_window(8, 8);
        let buffer = gl.create_buffer().unwrap();
        gl.bind_array_buffer(buffer);
        gl.active_texture(3);
        gl.use_program(Program(9));
        let before = GlState::capture(&gl);

        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let scene = triangle_scene(8, 8);
        let view = view(8, 8);

        engine.view_update(&mut host, &view, &scene).unwrap();
        assert_eq!(GlState::capture(&gl), before);
        engine.view_draw(&mut host, &view, &scene).unwrap();
        assert_eq!(GlState::capture(&gl), before);
        engine.end_session();
        assert_eq!(GlState::capture(&gl), before);
    }

    #[test]
    fn resize_reallocates_once_and_never_draws_stale_target() {
        let gl = HeadlessGl::with_window(8, 8);
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let scene = triangle_scene(4, 4);
        let mut view = view(4, 4);

        engine.view_enter(&view, &scene).unwrap();
        engine.view_draw(&mut host, &view, &scene).unwrap();
        let old = engine.session().unwrap().target().unwrap().framebuffer();

        view.resize(8, 6);
        engine.view_draw(&mut host, &view, &scene).unwrap();
        engine.view_draw(&mut host, &view, &scene).unwrap();

        let session = engine.session().unwrap();
        let target = session.target().unwrap();
        assert_ne!(target.framebuffer(), old);
        assert_eq!(target.size(), (8, 6));
        assert_eq!(session.allocations(), 2);
        assert!(!gl.is_live_framebuffer(old));
        assert_eq!(gl.live_objects(), 6);

        let draws = engine.backend().draws();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].framebuffer, old);
        assert!(draws[1..].iter().all(|d| d.framebuffer == target.framebuffer()));
    }

    #[test]
    fn view_update_pushes_only_reported_changes() {
        let gl = HeadlessGl::with_window(4, 4);
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let scene = triangle_scene(4, 4);
        let view = view(4, 4);

        engine.view_enter(&view, &scene).unwrap();
        scene.clear_updates();
        let handle = engine.session().unwrap().mirror().objects().get("Tri").unwrap().handle;

        let moved = Mat4::from_translation(Vec3::new(0.1, 0.0, 0.0));
        scene.move_object("Tri", moved);
        engine.view_update(&mut host, &view, &scene).unwrap();

        assert_eq!(engine.backend().upload_count(handle), 1);
        assert_eq!(
            engine.backend().object_transform(handle),
            Some(flatten_row_major(&moved))
        );
        assert_eq!(engine.session().unwrap().draws(), 1);
    }

    #[test]
    fn view_update_without_session_starts_one() {
        let gl = HeadlessGl::with_window(4, 4);
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);

        engine
            .view_update(&mut host, &view(4, 4), &triangle_scene(4, 4))
            .unwrap();

        let session = engine.session().unwrap();
        assert_eq!(session.draws(), 1);
        assert_eq!(session.mirror().stats().geometry_uploads, 1);
    }

    #[test]
    fn removed_objects_are_retained_by_default() {
        let gl = HeadlessGl::with_window(4, 4);
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let mut scene = triangle_scene(4, 4);
        scene.add(MemoryObject::triangle("Gone"));
        let view = view(4, 4);

        engine.view_enter(&view, &scene).unwrap();
        scene.clear_updates();
        let handle = engine.session().unwrap().mirror().objects().get("Gone").unwrap().handle;

        scene.remove("Gone");
        engine.view_update(&mut host, &view, &scene).unwrap();

        assert!(engine.session().unwrap().mirror().objects().get("Gone").is_some());
        assert!(!engine.backend().is_hidden(handle));
    }

    #[test]
    fn hide_policy_hides_removed_objects() {
        let gl = HeadlessGl::with_window(4, 4);
        let config = EngineConfig {
            stale_objects: StalePolicy::Hide,
            ..EngineConfig::default()
        };
        let mut engine = RenderEngine::new(RasterBackend::new(gl.clone()), gl.clone(), config);
        let mut host = MemoryHost::new(&gl);
        let mut scene = triangle_scene(4, 4);
        scene.add(MemoryObject::triangle("Gone"));
        let view = view(4, 4);

        engine.view_enter(&view, &scene).unwrap();
        scene.clear_updates();
        let handle = engine.session().unwrap().mirror().objects().get("Gone").unwrap().handle;

        scene.remove("Gone");
        engine.view_update(&mut host, &view, &scene).unwrap();

        let mirror = engine.session().unwrap().mirror();
        assert!(mirror.objects().get("Gone").is_none());
        assert!(mirror.objects().get("Tri").is_some());
        assert!(engine.backend().is_hidden(handle));
    }

    // ── session lifecycle ─────────────────────────────────────────────────

    #[test]
    fn end_session_releases_everything() {
        let gl = HeadlessGl::with_window(4, 4);
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let scene = triangle_scene(4, 4);
        let view = view(4, 4);

        engine.view_enter(&view, &scene).unwrap();
        engine.view_draw(&mut host, &view, &scene).unwrap();
        engine.end_session();
        engine.end_session();

        assert!(engine.session().is_none());
        assert_released(&gl, &engine);
    }

    #[test]
    fn view_enter_replaces_previous_session() {
        let gl = HeadlessGl::with_window(4, 4);
        let mut engine = engine(&gl);
        let scene = triangle_scene(4, 4);

        engine.view_enter(&view(4, 4), &scene).unwrap();
        engine.view_enter(&view(4, 4), &scene).unwrap();

        assert_eq!(engine.backend().scene_count(), 1);
        assert_eq!(engine.session().unwrap().allocations(), 1);
        assert_eq!(gl.live_objects(), 6);
    }

    #[test]
    fn view_enter_failure_leaks_nothing() {
        for point in [FailPoint::CreateTexture, FailPoint::CreateVertexArray, FailPoint::CreateBuffer] {
            let gl = HeadlessGl::with_window(4, 4);
            let mut engine = engine(&gl);

            gl.fail_next(point);
            assert!(engine.view_enter(&view(4, 4), &triangle_scene(4, 4)).is_err());

            assert!(engine.session().is_none());
            assert_released(&gl, &engine);
        }
    }

    #[test]
    fn dropping_engine_releases_active_session() {
        let gl = HeadlessGl::with_window(4, 4);
        let mut engine = engine(&gl);
        let mut host = MemoryHost::new(&gl);
        let scene = triangle_scene(4, 4);
        let view = view(4, 4);
        engine.view_enter(&view, &scene).unwrap();
        engine.view_draw(&mut host, &view, &scene).unwrap();
        assert!(gl.live_objects() > 0);

        let before = GlState::capture(&gl);
        drop(engine);

        assert_eq!(gl.live_objects(), 0);
        assert_eq!(gl.double_deletes(), 0);
        assert_eq!(GlState::capture(&gl), before);
    }

    #[test]
    fn view_draw_without_display_shader_fails_and_restores_state() {
        let gl = HeadlessGl::with_window(4, 4);
        let mut engine = engine(&gl);
        let mut host = MemoryHost::without_display_shader();
        let scene = triangle_scene(4, 4);
        let view = view(4, 4);
        engine.view_enter(&view, &scene).unwrap();

        let before = GlState::capture(&gl);
        assert!(engine.view_draw(&mut host, &view, &scene).is_err());
        assert_eq!(GlState::capture(&gl), before);
        assert_eq!(engine.backend().gl_depth(), 0);
        assert_eq!(engine.session().unwrap().draws(), 0);
    }

    #[test]
    fn advertises_engine_info() {
        let engine = engine(&HeadlessGl::new());
        assert_eq!(engine.info().id, "ZU");
        assert_eq!(engine.info().label, "Zu");
        assert!(engine.info().use_preview);
    }
}
