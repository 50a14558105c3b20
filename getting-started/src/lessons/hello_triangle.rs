use super::{apply_polygon_mode, clear_background, DrawGate, Lesson};
use crate::config::WindowConfig;
use crate::geometry::{upload_positions, TRIANGLE};
use gl_thin::api::GraphicsApi;
use gl_thin::gl_fancy::{GPUState, VertexBufferBundle};
use gl_thin::gl_helper::GLErrorWrapper;
use lesson_shaders::solid_color_shader::SolidColorShader;

/// One orange triangle drawn straight from the vertex buffer.
pub struct HelloTriangle<G: GraphicsApi> {
    api: G,
    shader: SolidColorShader<G>,
    geometry: VertexBufferBundle<G, f32, u32>,
    gate: DrawGate,
}

impl<G: GraphicsApi> Lesson<G> for HelloTriangle<G> {
    fn new(
        api: &G,
        gpu_state: &mut GPUState,
        config: &WindowConfig,
    ) -> Result<Self, GLErrorWrapper> {
        let shader = SolidColorShader::new(api)?;
        let geometry = upload_positions(api, gpu_state, &TRIANGLE, None)?;
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
        if !self.gate.allows(self.shader.is_usable(), "hello_triangle") {
            return Ok(());
        }
        self.shader.program.use_()?;
        let bound = self.geometry.bind(gpu_state)?;
        bound.draw_arrays(gl::TRIANGLES, 0, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_thin::recording::RecordingApi;

    #[test]
    fn draws_three_vertices_in_order() {
        let api = RecordingApi::new();
        let mut gpu_state = GPUState::new();
        let mut lesson = HelloTriangle::new(&api, &mut gpu_state, &WindowConfig::DEFAULT).unwrap();
        lesson.render(&mut gpu_state, 0.0).unwrap();

        let draw = api.last_draw().unwrap();
        assert_eq!(draw.mode, gl::TRIANGLES);
        assert_eq!(draw.program, lesson.shader.program.borrow());
        assert_eq!(draw.triangles(), vec![[0, 1, 2]]);
        // unbound once the frame is done
        assert_eq!(api.bound_vertex_array(), 0);
    }
}
