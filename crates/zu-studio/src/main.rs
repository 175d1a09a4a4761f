use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use glam::{Mat4, Vec3};
use zu_engine::headless::{
    HeadlessGl, MemoryCamera, MemoryHost, MemoryObject, MemoryPanels, MemoryScene, MemoryView,
    RasterBackend,
};
use zu_engine::host::{MeshData, ObjectKind};
use zu_engine::logging::{init_logging, LoggingConfig};
use zu_engine::registry::{self, BUILTIN_ENGINE};
use zu_engine::{EngineConfig, RenderEngine};

const DEFAULT_SIZE: (u32, u32) = (320, 240);
const SESSION_FRAMES: u32 = 12;

/// Headless Zu render: one batch render to PNG, then a simulated viewport session.
#[derive(Parser, Debug)]
#[command(name = "zu-studio")]
#[command(about = "Headless Zu render and viewport session")]
struct Cli {
    /// PNG file receiving the batch render
    #[arg(default_value = "zu-render.png")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(requires = "height", value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(requires = "width", value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,
}

impl Cli {
    fn size(&self) -> (u32, u32) {
        match (self.width, self.height) {
            (Some(width), Some(height)) => (width, height),
            _ => DEFAULT_SIZE,
        }
    }
}

fn demo_scene(width: u32, height: u32) -> MemoryScene {
    let eye = Vec3::new(0.0, 2.0, 4.0);
    let mut scene = MemoryScene::new()
        .with_camera(MemoryCamera::looking_at(eye, Vec3::new(0.0, 0.5, 0.0)))
        .with_output(width, height, 100);

    scene.add(MemoryObject::ground("Ground", 4.0).with_color([0.35, 0.55, 0.35, 1.0]));
    scene.add(
        MemoryObject::mesh(
            "Triangle",
            MeshData {
                positions: vec![[-0.8, 0.0, 0.0], [0.8, 0.0, 0.0], [0.0, 1.4, 0.0]],
                loop_vertices: vec![0, 1, 2],
                loop_triangles: vec![[0, 1, 2]],
                loop_colors: Some(vec![
                    [1.0, 0.2, 0.2, 1.0],
                    [0.2, 1.0, 0.2, 1.0],
                    [0.2, 0.2, 1.0, 1.0],
                ]),
            },
        )
        .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.1, 0.0))),
    );
    scene.add(MemoryObject::empty("Camera", ObjectKind::Camera));
    scene.add(MemoryObject::empty("Light", ObjectKind::Light));
    scene
}

fn write_png(host: &MemoryHost, pass: &str, path: &Path) -> Result<()> {
    let result = host
        .result(pass)
        .with_context(|| format!("render produced no '{pass}' pass"))?;
    let (width, height) = (result.rect.width, result.rect.height);

    // Results are stored bottom row first; PNG rows run top to bottom.
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        let rgba = result.pixel(x, height - 1 - y).unwrap_or([0.0; 4]);
        image::Rgba(rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
    });
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("wrote {}x{} render to {}", width, height, path.display());
    Ok(())
}

fn simulate_session(
    engine: &mut RenderEngine<RasterBackend, HeadlessGl>,
    host: &mut MemoryHost,
    scene: &MemoryScene,
    width: u32,
    height: u32,
) -> Result<()> {
    let mut view = MemoryView::looking_at(width, height, Vec3::new(0.0, 2.0, 4.0), Vec3::ZERO);

    engine.view_enter(&view, scene)?;
    scene.clear_updates();

    for frame in 0..SESSION_FRAMES {
        let spin = Mat4::from_rotation_y(frame as f32 * 0.2);
        scene.move_object("Triangle", spin * Mat4::from_translation(Vec3::new(0.0, 0.1, 0.0)));
        if frame == SESSION_FRAMES / 2 {
            scene.touch_geometry("Triangle");
            view.resize((width / 2).max(1), (height / 2).max(1));
        }

        engine.view_update(host, &view, scene)?;
        scene.clear_updates();

        view.orbit(0.05);
        engine.view_draw(host, &view, scene)?;
    }

    if let Some(session) = engine.session() {
        let stats = session.mirror().stats();
        log::info!(
            "session: {} draws, {} target allocations, {} objects created, {} color updates",
            session.draws(),
            session.allocations(),
            stats.objects_created,
            stats.color_updates
        );
    }
    engine.end_session();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::default());
    let (width, height) = cli.size();

    println!();
    println!("  zu studio · headless render");
    println!("  output {}  ({width}x{height})", cli.output.display());
    println!();

    let config = EngineConfig::default();
    let mut panels = MemoryPanels::default();
    panels.insert("RENDER_PT_dimensions", &[BUILTIN_ENGINE]);
    panels.insert("RENDER_PT_output", &[BUILTIN_ENGINE]);
    let registration = registry::register(&mut panels, &config.info, &[]);

    let gl = HeadlessGl::with_window(width, height);
    let mut engine = RenderEngine::new(RasterBackend::new(gl.clone()), gl.clone(), config);
    let mut host = MemoryHost::new(&gl);
    let scene = demo_scene(width, height);

    engine
        .batch_render(&mut host, &scene)
        .context("batch render failed")?;
    write_png(&host, &engine.config().result_pass, &cli.output)?;

    simulate_session(&mut engine, &mut host, &scene, width, height)
        .context("interactive session failed")?;

    registration.unregister(&mut panels);

    let backend = engine.backend();
    log::info!(
        "backend: {} draws, {} uploads, {} live scenes",
        backend.draws().len(),
        backend.total_uploads(),
        backend.scene_count()
    );
    let live = gl.live_objects();
    log::info!("GL: {live} live objects, {} double deletes", gl.double_deletes());
    if live != 0 || backend.scene_count() != 0 {
        bail!("resources leaked: {live} GL objects, {} scenes", backend.scene_count());
    }
    Ok(())
}
