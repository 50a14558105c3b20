use crate::config::WindowConfig;
use crate::error::AppError;
use crate::lessons::Lesson;
use crate::render_loop::RenderLoop;
use crate::window::GlutinWindow;
use gl_thin::gl_helper::GlApi;
use log::{error, info};

pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod lessons;
pub mod render_loop;
pub mod window;

/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Open a window for `L`, run it until the user closes it, then tear everything down.
pub fn run_lesson<L: Lesson<GlApi>>(config: WindowConfig) -> Result<(), AppError> {
    let window = GlutinWindow::open(&config).map_err(|e| {
        error!("{}", e);
        e
    })?;
    let api = window.gl_api();
    let mut render_loop = RenderLoop::new(window, api);

    let mut lesson = L::new(&api, render_loop.gpu_state(), &config)?;
    let frames = render_loop.run(&mut lesson)?;
    info!("closed after {} frames", frames);

    // GL objects are released while the context is still alive
    drop(lesson);
    drop(render_loop);
    Ok(())
}
