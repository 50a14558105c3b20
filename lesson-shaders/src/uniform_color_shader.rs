use gl::types::GLint;
use gl_thin::api::GraphicsApi;
use gl_thin::gl_helper::{GLErrorWrapper, Program};

pub const VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
   gl_Position = vec4(aPos, 1.0);
}
";

pub const FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;
uniform vec4 ourColor;
void main()
{
   FragColor = ourColor;
}
";

/// Every fragment takes the color of the `ourColor` uniform.
pub struct UniformColorShader<G: GraphicsApi> {
    pub program: Program<G>,
    /// `None` while the program failed to link
    pub sul_our_color: Option<GLint>,
}

impl<G: GraphicsApi> UniformColorShader<G> {
    pub fn new(api: &G) -> Result<Self, GLErrorWrapper> {
        let build = Program::build(api, VERTEX_SHADER, FRAGMENT_SHADER)?;
        let program = build.program;
        let sul_our_color = if program.is_linked() {
            Some(program.get_uniform_location("ourColor")?)
        } else {
            None
        };
        log::debug!("ourColor uniform location {:?}", sul_our_color);
        Ok(Self {
            program,
            sul_our_color,
        })
    }

    pub fn is_usable(&self) -> bool {
        self.sul_our_color.is_some()
    }

    /// `use_()` the program before calling this
    pub fn set_params(&self, color: &[f32; 4]) -> Result<(), GLErrorWrapper> {
        match self.sul_our_color {
            Some(location) => {
                self.program
                    .set_uniform_4f(location, color[0], color[1], color[2], color[3])
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_thin::recording::{Call, RecordingApi};

    #[test]
    fn finds_our_color() {
        let api = RecordingApi::new();
        let shader = UniformColorShader::new(&api).unwrap();
        assert!(shader.is_usable());

        shader.program.use_().unwrap();
        shader.set_params(&[0.0, 0.25, 0.0, 1.0]).unwrap();
        assert_eq!(
            api.calls().last(),
            Some(&Call::Uniform4f {
                location: shader.sul_our_color.unwrap(),
                value: [0.0, 0.25, 0.0, 1.0],
            })
        );
    }
}
