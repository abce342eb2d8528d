//! Renders one frame against the headless backend and prints the GL trace.
//!
//! Usage: `glint-studio [TEXT] [OUT.png]`. With an output path the text
//! bitmap the font uploaded is also written as a PNG.

use anyhow::{Context, Result};
use glint_engine::context::GlCall;
use glint_engine::logging::{init_logging, LoggingConfig};
use glint_engine::{Engine, EngineConfig, FontOptions, HeadlessContext};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let text = args.next().unwrap_or_else(|| "Hello, glint".to_string());
    let out = args.next();

    let font_data = load_font().context("no system TrueType font found (DejaVu Sans / Noto Sans)")?;

    let mut engine = Engine::new(HeadlessContext::new(), EngineConfig::default());
    let font = engine
        .create_font(&font_data, FontOptions::default())
        .context("building font pipeline")?;
    engine.update_viewport(1280, 720);

    let setup = engine.gl().take_calls();
    log::info!("font setup issued {} GL calls", setup.len());

    engine.start_render();
    font.draw(engine.gl(), 20.0, 20.0, &text).context("drawing text")?;

    let (w, h) = font.measure(&text);
    println!("frame: {text:?} as a {w}x{h} quad");
    for (i, call) in engine.gl().take_calls().iter().enumerate() {
        match call {
            GlCall::DrawTriangles(draw) => println!("  {i:>3}  draw {} indices {draw:?}", draw.count),
            other => println!("  {i:>3}  {other:?}"),
        }
    }

    for error in engine.gl().errors() {
        log::warn!("gl error: {error}");
    }

    if let Some(path) = out {
        if let Some(bitmap) = font.rasterize(&text) {
            bitmap.save(&path).with_context(|| format!("writing {path}"))?;
            log::info!("bitmap written to {path}");
        }
    }

    font.release(&mut engine);
    log::info!("{} native objects left alive", engine.gl().live_objects());
    Ok(())
}

fn load_font() -> Option<Vec<u8>> {
    [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok())
}
