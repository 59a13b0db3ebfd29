use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use sprite_batch::atlas::{AtlasBuilder, DirAssetSource};
use sprite_batch::batch::BatchEngine;
use sprite_batch::canvas::{Canvas, DrawStyle};
use sprite_batch::command::{TextEffect, ZIndex};
use sprite_batch::config::{AtlasConfig, EngineConfig};
use sprite_batch::coords::{Color, Rect};
use sprite_batch::core::{App, AppControl, FrameCtx};
use sprite_batch::device::{Gpu, GpuInit};
use sprite_batch::logging::{init_logging, LoggingConfig};
use sprite_batch::render::WgpuSink;
use sprite_batch::text::{BitmapFont, HorAlign, HorPosition, TextParams, VerAlign, VerPosition};
use sprite_batch::texture::{AnimatedTexture, TextureRegistry};
use sprite_batch::window::{Runtime, RuntimeConfig};

const FONT_SIZE: u32 = 16;
const METRICS_INTERVAL: Duration = Duration::from_secs(2);

const FONT_FALLBACKS: [&str; 4] = [
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
];

#[derive(Parser, Debug)]
#[command(name = "sprite-batch-demo")]
#[command(about = "Packs a directory of PNGs into an atlas and draws sprites, shapes and text")]
struct Args {
    /// Directory holding the PNG sprites
    assets: PathBuf,

    /// TrueType font for the HUD (default: first system DejaVu/Noto found)
    #[arg(short, long)]
    font: Option<PathBuf>,

    /// Engine configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// GPU-backed state, created once the device exists.
struct Scene {
    engine: BatchEngine<WgpuSink>,
    registry: TextureRegistry<DirAssetSource>,
    font: Option<BitmapFont>,
    sprites: Vec<AnimatedTexture>,
    elapsed: Duration,
    since_report: Duration,
}

struct DemoApp {
    args: Args,
    config: EngineConfig,
    scene: Option<Scene>,
}

impl DemoApp {
    fn setup(&self, gpu: &Gpu<'_>) -> Result<Scene> {
        let sink = WgpuSink::new(gpu.device(), gpu.queue());
        let mut engine = BatchEngine::new(sink, self.config.max_commands);

        let mut registry = TextureRegistry::new(DirAssetSource::new(&self.args.assets));
        let paths = png_paths(&self.args.assets)?;
        for path in &paths {
            registry.register_for_atlas(path.as_str())?;
        }

        let atlas_config = fit_to_device(self.config.atlas.clone(), gpu.max_texture_side());
        let builder = AtlasBuilder::new(atlas_config);
        registry.build_atlas(&builder, engine.sink_mut())?;

        let sprites = paths.iter().filter_map(|p| registry.animation(p)).collect();
        let font = load_font(self.args.font.as_deref(), engine.sink_mut());

        Ok(Scene {
            engine,
            registry,
            font,
            sprites,
            elapsed: Duration::ZERO,
            since_report: Duration::ZERO,
        })
    }
}

impl Scene {
    fn update(&mut self, dt: Duration) {
        self.elapsed += dt;
        self.since_report += dt;
        for sprite in &mut self.sprites {
            sprite.advance(dt);
        }

        let t = self.elapsed.as_secs_f32();
        self.engine.set_camera_offset((t * 0.7).sin() * 40.0, (t * 0.5).cos() * 20.0);
        self.engine.set_camera_scale(1.0 + (t * 0.3).sin() * 0.25);
    }

    fn draw(&mut self, width: f32, height: f32) -> Result<()> {
        let stats = self.engine.metrics().to_string();
        self.engine.begin_frame();
        let t = self.elapsed.as_secs_f32();

        let mut canvas = Canvas::from_registry(&mut self.engine, &self.registry)?;

        // world: a grid of every packed sprite
        let cell = 72.0;
        let cols = ((width / cell) as usize).max(1);
        for (i, sprite) in self.sprites.iter().enumerate() {
            let rect = Rect::new((i % cols) as f32 * cell + 8.0, (i / cols) as f32 * cell + 48.0, 64.0, 64.0);
            let style = DrawStyle::at(ZIndex::WORLD_ENTITIES)
                .world()
                .with_rotation(if i % 2 == 0 { t * 0.5 } else { 0.0 });
            canvas.animated(sprite, rect, style)?;
        }

        // world geometry
        let ground = DrawStyle::at(ZIndex::WORLD_BLOCKS).world();
        canvas.fill_rect(Rect::new(0.0, height - 64.0, width, 64.0), ground.with_color(Color::DARK_GREEN))?;
        canvas.line(0.0, height - 64.0, width, height - 64.0, 3.0, ground.with_color(Color::GREEN))?;

        // HUD: clipped panel
        let panel = Rect::new(width - 260.0, 16.0, 244.0, 120.0);
        let hud = DrawStyle::at(ZIndex::HUD).screen();
        canvas.fill_rect(panel, hud.with_color(Color::BLACK.with_alpha(160)))?;
        canvas.hollow_rect(panel, 2.0, DrawStyle::at(ZIndex::HUD.offset(1)).screen().with_color(Color::GOLD))?;
        canvas.clipped(panel, |c| {
            let x = panel.x + (t * 60.0) % panel.w;
            c.line(x, panel.y, x - 40.0, panel.bottom(), 2.0, DrawStyle::at(ZIndex::HUD.offset(2)).screen().with_color(Color::AQUA))
        })?;

        if let Some(font) = self.font.as_ref() {
            let params = TextParams::new(&stats, panel.x + 8.0, panel.y + 8.0, FONT_SIZE)
                .with_z(ZIndex::HUD_TEXT)
                .aligned(HorAlign::Left, VerAlign::Bottom)
                .positioned(HorPosition::Left, VerPosition::Up);
            canvas.text(font, &params)?;

            let title = TextParams::new("sprite-batch", width / 2.0, 12.0, FONT_SIZE * 2)
                .with_z(ZIndex::UI_TEXT)
                .with_effect(TextEffect::Rainbow)
                .positioned(HorPosition::Center, VerPosition::Up);
            canvas.text(font, &title)?;
        }

        self.engine.flush()
    }

    fn report(&mut self) {
        if self.since_report < METRICS_INTERVAL {
            return;
        }
        self.since_report = Duration::ZERO;
        log::info!("frame metrics:\n{}", self.engine.metrics());
    }
}

impl App for DemoApp {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        self.scene = Some(self.setup(gpu)?);
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Exit;
        };

        scene.update(ctx.time.dt);
        let viewport = ctx.viewport();
        if let Err(err) = scene.draw(viewport.width, viewport.height) {
            log::error!("draw failed: {err:#}");
            return AppControl::Exit;
        }

        let control = ctx.render(Color::rgb(24, 26, 32), scene.engine.sink_mut());
        scene.report();

        control.unwrap_or_else(|err| {
            log::error!("render failed: {err:#}");
            AppControl::Exit
        })
    }
}

impl Drop for DemoApp {
    fn drop(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            scene.registry.release_all(scene.engine.sink_mut());
        }
    }
}

/// Caps the atlas side at the largest texture the device accepts.
fn fit_to_device(mut config: AtlasConfig, device_max: u32) -> AtlasConfig {
    if config.max_side > device_max {
        log::warn!("atlas side capped at {device_max}px by the GPU (configured {})", config.max_side);
        config.max_side = device_max;
    }
    config
}

/// `*.png` files directly under `dir`, as paths relative to it, sorted.
fn png_paths(dir: &Path) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("png")) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                paths.push(name.to_string());
            }
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_font(explicit: Option<&Path>, sink: &mut WgpuSink) -> Option<BitmapFont> {
    let bytes = match explicit {
        Some(p) => std::fs::read(p).map_err(|e| log::warn!("font {}: {e}", p.display())).ok()?,
        None => FONT_FALLBACKS.iter().find_map(|p| std::fs::read(p).ok())?,
    };
    BitmapFont::load(&bytes, FONT_SIZE, sink)
        .map_err(|e| log::warn!("font unavailable, text disabled: {e}"))
        .ok()
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args = Args::parse();
    let config = match args.config.as_deref() {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let app = DemoApp { args, config, scene: None };
    Runtime::run(RuntimeConfig::default(), GpuInit::default(), app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_flag_is_not_an_assets_dir() {
        let err = Args::try_parse_from(["sprite-batch-demo", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn font_and_config_are_named_options() {
        let args = Args::try_parse_from(["sprite-batch-demo", "assets", "--config", "demo.toml"]).unwrap();
        assert_eq!(args.assets, PathBuf::from("assets"));
        assert_eq!(args.config, Some(PathBuf::from("demo.toml")));
        assert!(args.font.is_none());

        assert!(Args::try_parse_from(["sprite-batch-demo"]).is_err());
    }

    #[test]
    fn atlas_side_is_capped_by_device() {
        let config = AtlasConfig { max_side: 8192, ..AtlasConfig::default() };
        assert_eq!(fit_to_device(config.clone(), 4096).max_side, 4096);
        assert_eq!(fit_to_device(config, 16384).max_side, 8192);
    }
}
