//! SDL2 Viewer
//!
//! This module presents the composited frame buffer in an SDL2 window.
//! Space pauses the frame loop; Escape quits.

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;
use std::time::{Duration, Instant};

use crate::engine::GraphicsEngine;

/// Scale factor for the window
pub const SCALE: u32 = 3;

/// SDL2 UI wrapper
pub struct Ui {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    texture_creator: TextureCreator<WindowContext>,
    width: u32,
    height: u32,
}

impl Ui {
    /// Open a window for a `width x height` display
    pub fn new(width: u32, height: u32) -> Result<Self, String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let window = video_subsystem
            .window("pv8-gfx", width * SCALE, height * SCALE)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let canvas = window
            .into_canvas()
            .software()
            .build()
            .map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;

        Ok(Self {
            canvas,
            event_pump,
            texture_creator,
            width,
            height,
        })
    }

    /// Run `draw_frame` once per frame at 60 Hz until the window closes
    pub fn run<F>(&mut self, engine: &mut GraphicsEngine, mut draw_frame: F) -> Result<(), String>
    where
        F: FnMut(&mut GraphicsEngine, u64),
    {
        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::ARGB8888, self.width, self.height)
            .map_err(|e| e.to_string())?;

        let frame_duration = Duration::from_secs_f64(1.0 / 60.0);
        let mut bytes = Vec::with_capacity((self.width * self.height * 4) as usize);
        let mut paused = false;

        'running: loop {
            let frame_start = Instant::now();

            for event in self.event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => break 'running,
                    Event::KeyDown { keycode: Some(key), .. } => {
                        if key == Keycode::Escape {
                            break 'running;
                        }
                        if key == Keycode::Space {
                            paused = !paused;
                        }
                    }
                    _ => {}
                }
            }

            if !paused {
                let frame = engine.ctx.frames;
                draw_frame(engine, frame);
            }

            // ARGB8888 is stored as little-endian u32
            bytes.clear();
            bytes.extend(engine.frame_argb().iter().flat_map(|pixel| pixel.to_le_bytes()));
            texture
                .update(None, &bytes, self.width as usize * 4)
                .map_err(|e| e.to_string())?;

            self.canvas.clear();
            self.canvas.copy(&texture, None, None)?;
            self.canvas.present();

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }

        Ok(())
    }
}
