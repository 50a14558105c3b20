use gl::types::GLuint;

pub mod solid_color_shader;
pub mod uniform_color_shader;

/// Every lesson shader reads its position from `layout (location = 0) in vec3 aPos`.
pub const POSITION_LOCATION: GLuint = 0;
