use super::{clear_background, Lesson};
use crate::config::WindowConfig;
use gl_thin::api::GraphicsApi;
use gl_thin::gl_fancy::GPUState;
use gl_thin::gl_helper::GLErrorWrapper;

/// An empty window that clears to the background color.
pub struct HelloWindowClear<G: GraphicsApi> {
    api: G,
}

impl<G: GraphicsApi> Lesson<G> for HelloWindowClear<G> {
    fn new(
        api: &G,
        _gpu_state: &mut GPUState,
        _config: &WindowConfig,
    ) -> Result<Self, GLErrorWrapper> {
        Ok(Self { api: api.clone() })
    }

    fn render(&mut self, _gpu_state: &mut GPUState, _seconds: f64) -> Result<(), GLErrorWrapper> {
        clear_background(&self.api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lessons::BACKGROUND;
    use gl_thin::recording::{Call, RecordingApi};

    #[test]
    fn clears_and_nothing_else() {
        let api = RecordingApi::new();
        let mut gpu_state = GPUState::new();
        let mut lesson =
            HelloWindowClear::new(&api, &mut gpu_state, &WindowConfig::DEFAULT).unwrap();
        lesson.render(&mut gpu_state, 0.0).unwrap();
        assert_eq!(
            api.calls(),
            vec![
                Call::ClearColor(BACKGROUND),
                Call::Clear(gl::COLOR_BUFFER_BIT)
            ]
        );
    }
}
