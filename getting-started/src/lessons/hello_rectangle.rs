use super::{apply_polygon_mode, clear_background, DrawGate, Lesson};
use crate::config::WindowConfig;
use crate::geometry::{upload_positions, QUAD, QUAD_INDICES};
use gl::types::GLsizei;
use gl_thin::api::GraphicsApi;
use gl_thin::gl_fancy::{GPUState, VertexBufferBundle};
use gl_thin::gl_helper::GLErrorWrapper;
use lesson_shaders::solid_color_shader::SolidColorShader;

/// Two triangles sharing four vertices through an index buffer.
pub struct HelloRectangle<G: GraphicsApi> {
    api: G,
    shader: SolidColorShader<G>,
    geometry: VertexBufferBundle<G, f32, u32>,
    gate: DrawGate,
}

impl<G: GraphicsApi> Lesson<G> for HelloRectangle<G> {
    fn new(
        api: &G,
        gpu_state: &mut GPUState,
        config: &WindowConfig,
    ) -> Result<Self, GLErrorWrapper> {
        let shader = SolidColorShader::new(api)?;
        let geometry = upload_positions(api, gpu_state, &QUAD, Some(&QUAD_INDICES))?;
        apply_polygon_mode(api, config)?;
        Ok(Self {
            api: api.clone(),
            shader,
            geometry,
            gate: DrawGate::default(),
        })
    }

    fn render(&mut self, gpu_state: &mut GPUState, _seconds: f64) -> Result<(), GLErrorWrapper> {
        clear_background(&self.api)?;
        if !self.gate.allows(self.shader.is_usable(), "hello_rectangle") {
            return Ok(());
        }
        self.shader.program.use_()?;
        let n_indices = self.geometry.index_count() as GLsizei;
        let bound = self.geometry.bind(gpu_state)?;
        bound.draw_elements(gl::TRIANGLES, n_indices, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_thin::recording::{Call, RecordingApi};

    #[test]
    fn draws_both_triangles_through_the_indices() {
        let api = RecordingApi::new();
        let mut gpu_state = GPUState::new();
        let mut lesson =
            HelloRectangle::new(&api, &mut gpu_state, &WindowConfig::DEFAULT).unwrap();
        lesson.render(&mut gpu_state, 0.0).unwrap();

        let draw = api.last_draw().unwrap();
        assert_eq!(draw.triangles(), vec![[0, 1, 3], [1, 2, 3]]);
        assert!(api
            .calls()
            .iter()
            .all(|c| !matches!(c, Call::PolygonMode { .. })));
    }

    #[test]
    fn wireframe_switches_to_outlines() {
        let api = RecordingApi::new();
        let mut gpu_state = GPUState::new();
        let config = WindowConfig::DEFAULT.with_wireframe(true);
        let mut lesson = HelloRectangle::new(&api, &mut gpu_state, &config).unwrap();
        lesson.render(&mut gpu_state, 0.0).unwrap();

        assert!(api.calls().contains(&Call::PolygonMode {
            face: gl::FRONT_AND_BACK,
            mode: gl::LINE
        }));
        assert_eq!(api.draws().len(), 1);
    }
}
