use super::{apply_polygon_mode, clear_background, DrawGate, Lesson};
use crate::config::WindowConfig;
use crate::geometry::{upload_positions, UNIFORM_TRIANGLE};
use gl_thin::api::GraphicsApi;
use gl_thin::gl_fancy::{GPUState, VertexBufferBundle};
use gl_thin::gl_helper::GLErrorWrapper;
use lesson_shaders::uniform_color_shader::UniformColorShader;

/// Green channel pulsing between 0 and 1 with the clock.
pub fn green_value(seconds: f64) -> f32 {
    (seconds.sin() / 2.0 + 0.5) as f32
}

pub fn our_color(seconds: f64) -> [f32; 4] {
    [0.0, green_value(seconds), 0.0, 1.0]
}

/// A triangle whose color is pushed through a uniform every frame.
pub struct ShadersUniform<G: GraphicsApi> {
    api: G,
    shader: UniformColorShader<G>,
    geometry: VertexBufferBundle<G, f32, u32>,
    gate: DrawGate,
}

impl<G: GraphicsApi> Lesson<G> for ShadersUniform<G> {
    fn new(
        api: &G,
        gpu_state: &mut GPUState,
        config: &WindowConfig,
    ) -> Result<Self, GLErrorWrapper> {
        let shader = UniformColorShader::new(api)?;
        let geometry = upload_positions(api, gpu_state, &UNIFORM_TRIANGLE, None)?;
        apply_polygon_mode(api, config)?;
        Ok(Self {
            api: api.clone(),
            shader,
            geometry,
            gate: DrawGate::default(),
        })
    }

    fn render(&mut self, gpu_state: &mut GPUState, seconds: f64) -> Result<(), GLErrorWrapper> {
        clear_background(&self.api)?;
        if !self.gate.allows(self.shader.is_usable(), "shaders_uniform") {
            return Ok(());
        }
        // the uniform lands on the current program
        self.shader.program.use_()?;
        self.shader.set_params(&our_color(seconds))?;
        let bound = self.geometry.bind(gpu_state)?;
        bound.draw_arrays(gl::TRIANGLES, 0, 3)
    }
}
