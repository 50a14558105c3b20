use crate::config::WindowConfig;
use gl_thin::api::GraphicsApi;
use gl_thin::gl_fancy::GPUState;
use gl_thin::gl_helper::GLErrorWrapper;
use log::warn;

pub mod hello_rectangle;
pub mod hello_triangle;
pub mod hello_window_clear;
pub mod shaders_uniform;

/// the dark teal every lesson clears to
pub const BACKGROUND: [f32; 4] = [0.2, 0.3, 0.3, 1.0];

/// One tutorial program: its GPU resources and how it draws a frame.
pub trait Lesson<G: GraphicsApi>: Sized {
    /// Compile shaders and upload geometry. Runs once, with the context current.
    fn new(
        api: &G,
        gpu_state: &mut GPUState,
        config: &WindowConfig,
    ) -> Result<Self, GLErrorWrapper>;

    /// `seconds` is the time since the window opened.
    fn render(&mut self, gpu_state: &mut GPUState, seconds: f64) -> Result<(), GLErrorWrapper>;
}

pub fn clear_background<G: GraphicsApi>(api: &G) -> Result<(), GLErrorWrapper> {
    api.clear_color(BACKGROUND)?;
    api.clear(gl::COLOR_BUFFER_BIT)
}

pub fn apply_polygon_mode<G: GraphicsApi>(
    api: &G,
    config: &WindowConfig,
) -> Result<(), GLErrorWrapper> {
    if config.wireframe {
        api.polygon_mode(gl::FRONT_AND_BACK, gl::LINE)
    } else {
        Ok(())
    }
}

/// A lesson whose program failed to build still clears every frame, but draws nothing.
#[derive(Debug, Default)]
pub struct DrawGate {
    warned: bool,
}

impl DrawGate {
    pub fn allows(&mut self, usable: bool, lesson: &str) -> bool {
        if !usable && !self.warned {
            warn!("{}: shader program is not usable, skipping draws", lesson);
            self.warned = true;
        }
        usable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_thin::recording::{Call, RecordingApi};

    #[test]
    fn wireframe_only_when_asked() {
        let api = RecordingApi::new();
        apply_polygon_mode(&api, &WindowConfig::DEFAULT).unwrap();
        assert!(api.calls().is_empty());

        apply_polygon_mode(&api, &WindowConfig::DEFAULT.with_wireframe(true)).unwrap();
        assert_eq!(
            api.calls(),
            vec![Call::PolygonMode {
                face: gl::FRONT_AND_BACK,
                mode: gl::LINE
            }]
        );
    }

    #[test]
    fn gate_warns_once() {
        let mut gate = DrawGate::default();
        assert!(gate.allows(true, "test"));
        assert!(!gate.warned);
        assert!(!gate.allows(false, "test"));
        assert!(gate.warned);
        assert!(!gate.allows(false, "test"));
    }
}
