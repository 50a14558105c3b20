//! The set of GL entry points the wrappers in [crate::gl_helper] and [crate::gl_fancy] rely on.
//!
//! [crate::gl_helper::GlApi] forwards every call to the loaded `gl` function pointers.
//! [crate::recording::RecordingApi] executes nothing and just remembers what was asked of it.

use crate::gl_helper::{GLBufferType, GLErrorWrapper};
use gl::types::{GLbitfield, GLenum, GLint, GLsizei, GLuint};
use std::fmt::{Display, Formatter};
use std::mem::size_of;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

//

/// How the bytes of the currently bound array buffer feed one vertex shader input.
/// `stride` and `offset` are in bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AttributeBinding {
    pub location: GLuint,
    pub components: GLint,
    pub component_type: GLenum,
    pub normalized: bool,
    pub stride: GLsizei,
    pub offset: usize,
}

impl AttributeBinding {
    /// # Arguments
    /// * `location` - the `layout (location = N)` of the shader input
    /// * `attribute_array_width` - would be 3 for a vec3 or 2 for a vec2
    /// * `stride` - how many `T` are in a row.  XYZUV data would have stride 5.
    /// * `offset` - how many `T` sit between the beginning of the row and this attribute.
    pub fn new<T: GLBufferType>(
        location: GLuint,
        attribute_array_width: GLint,
        stride: GLsizei,
        offset: GLsizei,
    ) -> Self {
        Self {
            location,
            components: attribute_array_width,
            component_type: T::TYPE_CODE,
            normalized: false,
            stride: stride * size_of::<T>() as GLsizei,
            offset: offset as usize * size_of::<T>(),
        }
    }
}

//

pub trait GraphicsApi: Clone {
    fn create_shader(&self, stage: ShaderStage) -> Result<GLuint, GLErrorWrapper>;
    fn shader_source(&self, shader: GLuint, source: &str) -> Result<(), GLErrorWrapper>;
    fn compile_shader(&self, shader: GLuint) -> Result<(), GLErrorWrapper>;
    fn compile_status(&self, shader: GLuint) -> Result<bool, GLErrorWrapper>;
    fn shader_info_log(&self, shader: GLuint) -> String;
    fn delete_shader(&self, shader: GLuint);

    fn create_program(&self) -> Result<GLuint, GLErrorWrapper>;
    fn attach_shader(&self, program: GLuint, shader: GLuint) -> Result<(), GLErrorWrapper>;
    fn detach_shader(&self, program: GLuint, shader: GLuint);
    fn link_program(&self, program: GLuint) -> Result<(), GLErrorWrapper>;
    fn link_status(&self, program: GLuint) -> Result<bool, GLErrorWrapper>;
    fn program_info_log(&self, program: GLuint) -> String;
    fn use_program(&self, program: GLuint) -> Result<(), GLErrorWrapper>;
    fn delete_program(&self, program: GLuint);

    /// `Ok(None)` when the program has no active uniform of that name
    fn uniform_location(&self, program: GLuint, name: &str)
        -> Result<Option<GLint>, GLErrorWrapper>;
    fn uniform_4f(&self, location: GLint, value: [f32; 4]) -> Result<(), GLErrorWrapper>;

    fn gen_vertex_array(&self) -> Result<GLuint, GLErrorWrapper>;
    fn bind_vertex_array(&self, vertex_array: GLuint) -> Result<(), GLErrorWrapper>;
    fn delete_vertex_array(&self, vertex_array: GLuint);

    fn gen_buffer(&self) -> Result<GLuint, GLErrorWrapper>;
    fn bind_buffer(&self, target: GLenum, buffer: GLuint) -> Result<(), GLErrorWrapper>;
    /// upload to whatever is bound to `target`, with `STATIC_DRAW` usage
    fn buffer_data(&self, target: GLenum, data: &[u8]) -> Result<(), GLErrorWrapper>;
    fn delete_buffer(&self, buffer: GLuint);

    fn vertex_attrib_pointer(&self, binding: &AttributeBinding) -> Result<(), GLErrorWrapper>;
    fn enable_vertex_attrib_array(&self, location: GLuint) -> Result<(), GLErrorWrapper>;

    fn clear_color(&self, rgba: [f32; 4]) -> Result<(), GLErrorWrapper>;
    fn clear(&self, mask: GLbitfield) -> Result<(), GLErrorWrapper>;
    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei)
        -> Result<(), GLErrorWrapper>;
    /// `offset` is a byte offset into the element buffer recorded by the bound vertex array
    fn draw_elements(
        &self,
        mode: GLenum,
        count: GLsizei,
        index_type: GLenum,
        offset: usize,
    ) -> Result<(), GLErrorWrapper>;
    fn viewport(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
    ) -> Result<(), GLErrorWrapper>;
    fn polygon_mode(&self, face: GLenum, mode: GLenum) -> Result<(), GLErrorWrapper>;
}
