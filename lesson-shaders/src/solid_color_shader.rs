use gl_thin::api::GraphicsApi;
use gl_thin::gl_helper::{GLErrorWrapper, Program};

pub const VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
   gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
";

pub const FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;
void main()
{
   FragColor = vec4(1.0f, 0.5f, 0.2f, 1.0f);
}
";

/// Positions straight through, every fragment orange.
pub struct SolidColorShader<G: GraphicsApi> {
    pub program: Program<G>,
}

impl<G: GraphicsApi> SolidColorShader<G> {
    /// Compile failures are logged, not returned; check [Self::is_usable] before drawing.
    pub fn new(api: &G) -> Result<Self, GLErrorWrapper> {
        let build = Program::build(api, VERTEX_SHADER, FRAGMENT_SHADER)?;
        Ok(Self {
            program: build.program,
        })
    }

    pub fn is_usable(&self) -> bool {
        self.program.is_linked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_thin::recording::RecordingApi;

    #[test]
    fn links() {
        let api = RecordingApi::new();
        let shader = SolidColorShader::new(&api).unwrap();
        assert!(shader.is_usable());
        assert_eq!(api.live_shaders(), 0);
    }
}
