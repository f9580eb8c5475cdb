//! Graphics Demo - Entry Point
//!
//! Builds the graphics banks from an optional JSON config, fills them with a
//! small demo scene and runs frames. With the `viewer` feature the frames
//! are shown in an SDL2 window, otherwise a fixed number of frames is
//! composited headless.

use std::env;
use std::process;

use log::{error, info};

use pv8_gfx::config::GraphicsConfig;
use pv8_gfx::engine::{DrawMode, GraphicsEngine};
use pv8_gfx::error::Result;

const DEMO_COLORS: [&str; 8] = [
    "#000000", "#1D2B53", "#7E2553", "#008751", "#AB5236", "#5F574F", "#C2C3C7", "#FFF1E8",
];

/// Frames run when no window is available
#[cfg(not(feature = "viewer"))]
const HEADLESS_FRAMES: u64 = 120;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [config.json]", args[0]);
        process::exit(1);
    }

    let config = match args.get(1) {
        Some(path) => GraphicsConfig::from_file(path),
        None => Ok(GraphicsConfig::default()),
    };

    let result = config.and_then(|config| {
        let mut engine = GraphicsEngine::new(&config)?;
        build_scene(&mut engine)?;
        run(&mut engine)
    });

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Graphics demo failed: {}", e);
        process::exit(1);
    }
}

/// Palette, two sprites and a checkerboard tile map
fn build_scene(engine: &mut GraphicsEngine) -> Result<()> {
    for (i, hex) in DEMO_COLORS.iter().enumerate() {
        engine.palette.update_color_at(i as i32, hex);
    }
    engine.palette.set_background_color(1);

    let (width, height) = (engine.sprites.width(), engine.sprites.height());
    let size = (width * height) as usize;

    // Sprite 0: solid floor tile, sprite 1: a framed block with a hole
    let floor = vec![2; size];
    let block: Vec<i32> = (0..size as i32)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                6
            } else if x == width / 2 && y == height / 2 {
                -1
            } else {
                4
            }
        })
        .collect();
    engine.update_sprite(0, &floor);
    engine.update_sprite(1, &block);

    for row in 0..engine.tiles.rows() {
        for column in 0..engine.tiles.columns() {
            let id = if (column + row) % 2 == 0 { 0 } else { -1 };
            engine.tiles.update_tile(column, row, id, -1, 0);
        }
    }
    info!("demo scene ready");
    Ok(())
}

/// Advance the demo by one frame
fn draw_frame(engine: &mut GraphicsEngine, frame: u64) {
    let t = frame as i32;
    engine.scroll_position(t, t / 2);
    engine.redraw_display();

    let x = (t * 2) % engine.display.width();
    engine.draw_sprite(1, x, 16, false, false, DrawMode::Sprite, 0);
    engine.draw_sprite(1, x, 32, true, true, DrawMode::SpriteAbove, 1);
    engine.draw_rect(0, 0, engine.display.width(), 8, 0, DrawMode::UI);
    engine.end_frame();
}

#[cfg(feature = "viewer")]
fn run(engine: &mut GraphicsEngine) -> Result<()> {
    use pv8_gfx::error::Error;
    use pv8_gfx::ui::Ui;

    let mut ui = Ui::new(engine.display.width() as u32, engine.display.height() as u32).map_err(Error::Io)?;
    ui.run(engine, draw_frame).map_err(Error::Io)
}

#[cfg(not(feature = "viewer"))]
fn run(engine: &mut GraphicsEngine) -> Result<()> {
    for frame in 0..HEADLESS_FRAMES {
        draw_frame(engine, frame);
    }
    let argb = engine.frame_argb();
    let first = argb.first().copied().unwrap_or_default();
    let lit = argb.iter().filter(|&&p| p != first).count();
    info!("{} frames composited, {} pixels differ from the first", HEADLESS_FRAMES, lit);
    println!("Composited {} frames ({} x {})", HEADLESS_FRAMES, engine.display.width(), engine.display.height());
    Ok(())
}
