use crate::api::{AttributeBinding, GraphicsApi, ShaderStage};
use crate::errors::PipelineError;
use bytemuck::Pod;
use gl::types::{GLbitfield, GLchar, GLenum, GLfloat, GLint, GLsizei, GLsizeiptr, GLuint, GLushort};
use std::ffi::{c_void, CString};
use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;
use std::mem::{size_of, MaybeUninit};

pub fn explode_if_gl_error() -> Result<(), GLErrorWrapper> {
    let mut last_err = None;
    loop {
        let err = unsafe { gl::GetError() };
        if err == gl::NO_ERROR {
            break;
        } else {
            last_err = Some(err);
        }
    }

    match last_err {
        Some(e) => Err(GLErrorWrapper::new(e)),
        None => Ok(()),
    }
}

//

#[derive(Clone)]
pub enum MessageForError {
    None,
    Str(String),
}

#[derive(Clone)]
pub struct GLErrorWrapper {
    pub code: GLenum,
    pub message: MessageForError,
}

impl GLErrorWrapper {
    pub fn with_message2(msg: String) -> Self {
        Self {
            code: 0,
            message: MessageForError::Str(msg),
        }
    }

    pub fn new(code: GLenum) -> Self {
        Self {
            code,
            message: MessageForError::None,
        }
    }
}

impl Debug for GLErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            MessageForError::Str(msg) => write!(f, "{:?}", msg),
            MessageForError::None => write!(f, "0x{:x}", self.code),
        }
    }
}

impl Display for GLErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <Self as Debug>::fmt(self, f)
    }
}

impl std::error::Error for GLErrorWrapper {}

//

/// [GraphicsApi] backed by the `gl` crate's global function pointers.
/// Only usable after [GlApi::load_with] ran against a current context.
#[derive(Copy, Clone, Debug)]
pub struct GlApi {
    _loaded: (),
}

impl GlApi {
    /// Fails when `loader` left any entry point the wrappers call unresolved.
    pub fn load_with<F>(loader: F) -> Result<Self, GLErrorWrapper>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        let missing = missing_functions();
        if missing.is_empty() {
            Ok(Self { _loaded: () })
        } else {
            Err(GLErrorWrapper::with_message2(format!(
                "failed to load OpenGL functions: {}",
                missing.join(", ")
            )))
        }
    }
}

fn missing_functions() -> Vec<&'static str> {
    [
        ("glGetError", gl::GetError::is_loaded()),
        ("glCreateShader", gl::CreateShader::is_loaded()),
        ("glShaderSource", gl::ShaderSource::is_loaded()),
        ("glCompileShader", gl::CompileShader::is_loaded()),
        ("glGetShaderiv", gl::GetShaderiv::is_loaded()),
        ("glGetShaderInfoLog", gl::GetShaderInfoLog::is_loaded()),
        ("glDeleteShader", gl::DeleteShader::is_loaded()),
        ("glCreateProgram", gl::CreateProgram::is_loaded()),
        ("glAttachShader", gl::AttachShader::is_loaded()),
        ("glDetachShader", gl::DetachShader::is_loaded()),
        ("glLinkProgram", gl::LinkProgram::is_loaded()),
        ("glGetProgramiv", gl::GetProgramiv::is_loaded()),
        ("glGetProgramInfoLog", gl::GetProgramInfoLog::is_loaded()),
        ("glUseProgram", gl::UseProgram::is_loaded()),
        ("glDeleteProgram", gl::DeleteProgram::is_loaded()),
        ("glGetUniformLocation", gl::GetUniformLocation::is_loaded()),
        ("glUniform4f", gl::Uniform4f::is_loaded()),
        ("glGenVertexArrays", gl::GenVertexArrays::is_loaded()),
        ("glBindVertexArray", gl::BindVertexArray::is_loaded()),
        ("glDeleteVertexArrays", gl::DeleteVertexArrays::is_loaded()),
        ("glGenBuffers", gl::GenBuffers::is_loaded()),
        ("glBindBuffer", gl::BindBuffer::is_loaded()),
        ("glBufferData", gl::BufferData::is_loaded()),
        ("glDeleteBuffers", gl::DeleteBuffers::is_loaded()),
        ("glVertexAttribPointer", gl::VertexAttribPointer::is_loaded()),
        ("glEnableVertexAttribArray", gl::EnableVertexAttribArray::is_loaded()),
        ("glClearColor", gl::ClearColor::is_loaded()),
        ("glClear", gl::Clear::is_loaded()),
        ("glDrawArrays", gl::DrawArrays::is_loaded()),
        ("glDrawElements", gl::DrawElements::is_loaded()),
        ("glViewport", gl::Viewport::is_loaded()),
        ("glPolygonMode", gl::PolygonMode::is_loaded()),
    ]
    .into_iter()
    .filter(|(_, loaded)| !loaded)
    .map(|(name, _)| name)
    .collect()
}

impl GraphicsApi for GlApi {
    fn create_shader(&self, stage: ShaderStage) -> Result<GLuint, GLErrorWrapper> {
        let rval = unsafe { gl::CreateShader(stage.gl_enum()) };
        explode_if_gl_error()?;
        Ok(rval)
    }

    fn shader_source(&self, shader: GLuint, source: &str) -> Result<(), GLErrorWrapper> {
        let bytes = source.as_bytes();
        let strings = [bytes.as_ptr() as *const GLchar];
        let lengths = [bytes.len() as GLint];
        unsafe { gl::ShaderSource(shader, 1, strings.as_ptr(), lengths.as_ptr()) };
        explode_if_gl_error()
    }

    fn compile_shader(&self, shader: GLuint) -> Result<(), GLErrorWrapper> {
        unsafe { gl::CompileShader(shader) };
        explode_if_gl_error()
    }

    fn compile_status(&self, shader: GLuint) -> Result<bool, GLErrorWrapper> {
        let mut is_compiled = 0;
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut is_compiled) };
        explode_if_gl_error()?;
        Ok(is_compiled != 0)
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let mut max_length = 0;
        unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut max_length) };
        let mut error_log = vec![0u8; max_length.max(0) as usize];
        let mut written = 0;
        unsafe {
            gl::GetShaderInfoLog(
                shader,
                max_length,
                &mut written,
                error_log.as_mut_ptr() as *mut GLchar,
            )
        };
        error_log.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&error_log).into_owned()
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> Result<GLuint, GLErrorWrapper> {
        let rval = unsafe { gl::CreateProgram() };
        explode_if_gl_error()?;
        Ok(rval)
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) -> Result<(), GLErrorWrapper> {
        unsafe { gl::AttachShader(program, shader) };
        explode_if_gl_error()
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) };
    }

    fn link_program(&self, program: GLuint) -> Result<(), GLErrorWrapper> {
        unsafe { gl::LinkProgram(program) };
        explode_if_gl_error()
    }

    fn link_status(&self, program: GLuint) -> Result<bool, GLErrorWrapper> {
        let mut link_status = 0;
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut link_status) };
        explode_if_gl_error()?;
        Ok(link_status != 0)
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut max_length = 0;
        unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut max_length) };
        let mut error_log = vec![0u8; max_length.max(0) as usize];
        let mut written = 0;
        unsafe {
            gl::GetProgramInfoLog(
                program,
                max_length,
                &mut written,
                error_log.as_mut_ptr() as *mut GLchar,
            )
        };
        error_log.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&error_log).into_owned()
    }

    fn use_program(&self, program: GLuint) -> Result<(), GLErrorWrapper> {
        unsafe { gl::UseProgram(program) }
        explode_if_gl_error()
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn uniform_location(
        &self,
        program: GLuint,
        name: &str,
    ) -> Result<Option<GLint>, GLErrorWrapper> {
        let c_name = CString::new(name)
            .map_err(|e| GLErrorWrapper::with_message2(format!("bad uniform name {name:?}: {e}")))?;
        let rval = unsafe { gl::GetUniformLocation(program, c_name.as_ptr() as *const GLchar) };
        explode_if_gl_error()?;
        Ok((rval >= 0).then_some(rval))
    }

    fn uniform_4f(&self, location: GLint, value: [f32; 4]) -> Result<(), GLErrorWrapper> {
        let [x, y, z, a] = value;
        unsafe { gl::Uniform4f(location, x, y, z, a) }
        explode_if_gl_error()
    }

    fn gen_vertex_array(&self) -> Result<GLuint, GLErrorWrapper> {
        let mut rval = MaybeUninit::uninit();
        unsafe { gl::GenVertexArrays(1, rval.as_mut_ptr()) };
        explode_if_gl_error()?;
        Ok(unsafe { rval.assume_init() })
    }

    fn bind_vertex_array(&self, vertex_array: GLuint) -> Result<(), GLErrorWrapper> {
        unsafe { gl::BindVertexArray(vertex_array) }
        explode_if_gl_error()
    }

    fn delete_vertex_array(&self, vertex_array: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, &vertex_array) }
    }

    fn gen_buffer(&self) -> Result<GLuint, GLErrorWrapper> {
        let mut rval = MaybeUninit::uninit();
        unsafe { gl::GenBuffers(1, rval.as_mut_ptr()) };
        explode_if_gl_error()?;
        Ok(unsafe { rval.assume_init() })
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) -> Result<(), GLErrorWrapper> {
        unsafe { gl::BindBuffer(target, buffer) };
        explode_if_gl_error()
    }

    fn buffer_data(&self, target: GLenum, data: &[u8]) -> Result<(), GLErrorWrapper> {
        unsafe {
            gl::BufferData(
                target,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            )
        }
        explode_if_gl_error()
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) }
    }

    fn vertex_attrib_pointer(&self, binding: &AttributeBinding) -> Result<(), GLErrorWrapper> {
        unsafe {
            gl::VertexAttribPointer(
                binding.location,
                binding.components,
                binding.component_type,
                if binding.normalized { gl::TRUE } else { gl::FALSE },
                binding.stride,
                // not a real pointer, a byte offset into the bound array buffer
                binding.offset as *const c_void,
            );
        }
        explode_if_gl_error()
    }

    fn enable_vertex_attrib_array(&self, location: GLuint) -> Result<(), GLErrorWrapper> {
        unsafe { gl::EnableVertexAttribArray(location) };
        explode_if_gl_error()
    }

    fn clear_color(&self, rgba: [f32; 4]) -> Result<(), GLErrorWrapper> {
        let [r, g, b, a] = rgba;
        unsafe { gl::ClearColor(r, g, b, a) };
        explode_if_gl_error()
    }

    fn clear(&self, mask: GLbitfield) -> Result<(), GLErrorWrapper> {
        unsafe { gl::Clear(mask) };
        explode_if_gl_error()
    }

    fn draw_arrays(
        &self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
    ) -> Result<(), GLErrorWrapper> {
        unsafe { gl::DrawArrays(mode, first, count) };
        explode_if_gl_error()
    }

    fn draw_elements(
        &self,
        mode: GLenum,
        count: GLsizei,
        index_type: GLenum,
        offset: usize,
    ) -> Result<(), GLErrorWrapper> {
        unsafe { gl::DrawElements(mode, count, index_type, offset as *const c_void) };
        explode_if_gl_error()
    }

    fn viewport(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
    ) -> Result<(), GLErrorWrapper> {
        unsafe { gl::Viewport(x, y, width, height) };
        explode_if_gl_error()
    }

    fn polygon_mode(&self, face: GLenum, mode: GLenum) -> Result<(), GLErrorWrapper> {
        unsafe { gl::PolygonMode(face, mode) };
        explode_if_gl_error()
    }
}

//

pub trait BufferTarget {
    const TARGET: GLenum;
}

pub struct ArrayBufferType {}
impl BufferTarget for ArrayBufferType {
    const TARGET: GLenum = gl::ARRAY_BUFFER;
}

pub struct ElementArrayBufferType {}
impl BufferTarget for ElementArrayBufferType {
    const TARGET: GLenum = gl::ELEMENT_ARRAY_BUFFER;
}

//

pub struct VertexArray<G: GraphicsApi> {
    pub(crate) api: G,
    handle: GLuint,
}

impl<G: GraphicsApi> VertexArray<G> {
    pub fn new(api: &G) -> Result<Self, GLErrorWrapper> {
        let handle = api.gen_vertex_array()?;
        Ok(Self {
            api: api.clone(),
            handle,
        })
    }

    pub fn bind(&self) -> Result<(), GLErrorWrapper> {
        self.api.bind_vertex_array(self.handle)
    }

    pub fn borrow_raw(&self) -> GLuint {
        self.handle
    }
}

impl<G: GraphicsApi> Drop for VertexArray<G> {
    fn drop(&mut self) {
        self.api.delete_vertex_array(self.handle)
    }
}

//

/// A GL buffer object holding `len()` elements of `T`.
pub struct Buffer<G: GraphicsApi, B, T> {
    api: G,
    handle: GLuint,
    len: usize,
    phantom_data: PhantomData<(B, T)>,
}

impl<G: GraphicsApi, B, T> Buffer<G, B, T> {
    pub fn new(api: &G) -> Result<Self, GLErrorWrapper> {
        let handle = api.gen_buffer()?;
        Ok(Buffer {
            api: api.clone(),
            handle,
            len: 0,
            phantom_data: Default::default(),
        })
    }

    /// how many `T` were last uploaded
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn borrow_raw(&self) -> GLuint {
        self.handle
    }
}

impl<G: GraphicsApi, B, T> Drop for Buffer<G, B, T> {
    fn drop(&mut self) {
        self.api.delete_buffer(self.handle)
    }
}

impl<G: GraphicsApi, B: BufferTarget, T: Pod> Buffer<G, B, T> {
    /// Binds the buffer to its target and replaces its contents.
    /// For an element buffer, bind the owning vertex array first so it records this buffer.
    pub fn load(&mut self, values: &[T]) -> Result<(), GLErrorWrapper> {
        self.bind()?;
        self.api
            .buffer_data(B::TARGET, bytemuck::cast_slice(values))?;
        self.len = values.len();
        Ok(())
    }

    pub fn bind(&self) -> Result<(), GLErrorWrapper> {
        self.api.bind_buffer(B::TARGET, self.handle)
    }
}

//

pub trait ShaderFlavor {
    const STAGE: ShaderStage;
}

pub struct VertexShader {}
impl ShaderFlavor for VertexShader {
    const STAGE: ShaderStage = ShaderStage::Vertex;
}

pub struct FragmentShader {}
impl ShaderFlavor for FragmentShader {
    const STAGE: ShaderStage = ShaderStage::Fragment;
}

//

/// One compiled stage.  Deleted on drop, which is fine once it has been linked into a [Program].
pub struct Shader<G: GraphicsApi, F> {
    api: G,
    handle: Option<GLuint>,
    phantom_data: PhantomData<F>,
}

impl<G: GraphicsApi, F: ShaderFlavor> Shader<G, F> {
    pub fn new_raw(api: &G) -> Result<Self, GLErrorWrapper> {
        let rval = api.create_shader(F::STAGE)?;
        Ok(Self {
            api: api.clone(),
            handle: Some(rval),
            phantom_data: Default::default(),
        })
    }

    /// upload and compile, without looking at the compile status
    pub fn compile_unchecked(api: &G, source: impl AsRef<str>) -> Result<Self, GLErrorWrapper> {
        let rval = Self::new_raw(api)?;
        api.shader_source(rval.borrow(), source.as_ref())?;
        api.compile_shader(rval.borrow())?;
        Ok(rval)
    }

    pub fn compile(api: &G, source: impl AsRef<str>) -> Result<Self, PipelineError> {
        let rval = Self::compile_unchecked(api, source)?;
        rval.check()?;
        Ok(rval)
    }

    pub fn check(&self) -> Result<(), PipelineError> {
        if self.api.compile_status(self.borrow())? {
            Ok(())
        } else {
            Err(PipelineError::compile_failed(
                F::STAGE,
                self.get_shader_info_log(),
            ))
        }
    }
}

impl<G: GraphicsApi, F> Shader<G, F> {
    /// get access to the GL handle in case you need to call some low-level stuff
    pub fn borrow(&self) -> GLuint {
        // only `unmanage` takes the handle, and it consumes self
        self.handle.unwrap_or_default()
    }

    #[must_use]
    /// take ownership of the GL handle inside this object.  You are now responsible for calling gl::DeleteShader
    pub fn unmanage(mut self) -> GLuint {
        self.handle.take().unwrap_or_default()
    }

    pub fn get_shader_info_log(&self) -> String {
        self.api.shader_info_log(self.borrow())
    }
}

impl<G: GraphicsApi, F> Drop for Shader<G, F> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.api.delete_shader(handle)
        }
    }
}

//

pub struct Program<G: GraphicsApi> {
    api: G,
    handle: GLuint,
    linked: bool,
}

/// What [Program::build] produced: a program handle, plus every compile or link
/// diagnostic that came up while making it.
pub struct PipelineBuild<G: GraphicsApi> {
    pub program: Program<G>,
    pub diagnostics: Vec<PipelineError>,
}

impl<G: GraphicsApi> PipelineBuild<G> {
    pub fn is_usable(&self) -> bool {
        self.diagnostics.is_empty() && self.program.is_linked()
    }

    /// the program, or the first thing that went wrong building it
    pub fn into_result(self) -> Result<Program<G>, PipelineError> {
        match self.diagnostics.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(self.program),
        }
    }
}

impl<G: GraphicsApi> Program<G> {
    pub fn new_empty(api: &G) -> Result<Self, GLErrorWrapper> {
        let rval = api.create_program()?;
        Ok(Self {
            api: api.clone(),
            handle: rval,
            linked: false,
        })
    }

    /// Compile both stages and link them, stopping at the first failure.
    pub fn compile(
        api: &G,
        vertex_shader: impl AsRef<str>,
        fragment_shader: impl AsRef<str>,
    ) -> Result<Self, PipelineError> {
        let vertex_shader = Shader::<G, VertexShader>::compile(api, vertex_shader.as_ref())?;
        let fragment_shader = Shader::<G, FragmentShader>::compile(api, fragment_shader.as_ref())?;

        let mut rval = Self::new_empty(api)?;
        rval.attach(&vertex_shader)?;
        rval.attach(&fragment_shader)?;
        rval.link()?;

        rval.detach(&vertex_shader);
        rval.detach(&fragment_shader);

        Ok(rval)
    }

    /// Run every step even after one of them fails, report each failure once through `log::error!`,
    /// and hand back the program anyway.  Only a failing GL call aborts.
    pub fn build(
        api: &G,
        vertex_shader: impl AsRef<str>,
        fragment_shader: impl AsRef<str>,
    ) -> Result<PipelineBuild<G>, GLErrorWrapper> {
        let mut diagnostics = Vec::new();

        let vertex_shader =
            Shader::<G, VertexShader>::compile_unchecked(api, vertex_shader.as_ref())?;
        collect(vertex_shader.check(), &mut diagnostics)?;
        let fragment_shader =
            Shader::<G, FragmentShader>::compile_unchecked(api, fragment_shader.as_ref())?;
        collect(fragment_shader.check(), &mut diagnostics)?;

        let mut program = Self::new_empty(api)?;
        program.attach(&vertex_shader)?;
        program.attach(&fragment_shader)?;
        collect(program.link(), &mut diagnostics)?;

        program.detach(&vertex_shader);
        program.detach(&fragment_shader);

        for diagnostic in &diagnostics {
            log::error!("{}", diagnostic);
        }
        if diagnostics.is_empty() {
            log::debug!("linked program {}", program.borrow());
        }

        Ok(PipelineBuild {
            program,
            diagnostics,
        })
    }

    pub fn borrow(&self) -> GLuint {
        self.handle
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    fn attach<F>(&mut self, shader: &Shader<G, F>) -> Result<(), GLErrorWrapper> {
        self.api.attach_shader(self.handle, shader.borrow())
    }

    fn detach<F>(&mut self, shader: &Shader<G, F>) {
        self.api.detach_shader(self.handle, shader.borrow());
    }

    fn link(&mut self) -> Result<(), PipelineError> {
        self.api.link_program(self.handle)?;
        self.linked = self.api.link_status(self.handle)?;
        if self.linked {
            Ok(())
        } else {
            Err(PipelineError::link_failed(self.get_program_info_log()))
        }
    }

    pub fn use_(&self) -> Result<(), GLErrorWrapper> {
        self.api.use_program(self.handle)
    }

    pub fn get_uniform_location(&self, name: &str) -> Result<GLint, GLErrorWrapper> {
        match self.api.uniform_location(self.handle, name)? {
            Some(location) => Ok(location),
            None => Err(GLErrorWrapper::with_message2(format!(
                "no uniform named {} on program {}",
                name, self.handle
            ))),
        }
    }

    /// remember to `use_()` the program first
    pub fn set_uniform_4f(
        &self,
        location: GLint,
        x: f32,
        y: f32,
        z: f32,
        a: f32,
    ) -> Result<(), GLErrorWrapper> {
        self.api.uniform_4f(location, [x, y, z, a])
    }

    pub fn get_program_info_log(&self) -> String {
        self.api.program_info_log(self.handle)
    }
}

fn collect(
    step: Result<(), PipelineError>,
    diagnostics: &mut Vec<PipelineError>,
) -> Result<(), GLErrorWrapper> {
    match step {
        Ok(()) => Ok(()),
        Err(PipelineError::Gl(e)) => Err(e),
        Err(e) => {
            diagnostics.push(e);
            Ok(())
        }
    }
}

impl<G: GraphicsApi> Drop for Program<G> {
    fn drop(&mut self) {
        self.api.delete_program(self.handle)
    }
}

//

pub trait GLBufferType {
    const TYPE_CODE: GLenum;
}

impl GLBufferType for GLfloat {
    const TYPE_CODE: GLenum = gl::FLOAT;
}

impl GLBufferType for u8 {
    const TYPE_CODE: GLenum = gl::UNSIGNED_BYTE;
}

impl GLBufferType for GLushort {
    const TYPE_CODE: GLenum = gl::UNSIGNED_SHORT;
}

impl GLBufferType for GLuint {
    const TYPE_CODE: GLenum = gl::UNSIGNED_INT;
}

/// Byte offset of the `count`th `T`, for the offset arguments of
/// [GraphicsApi::draw_elements] and [AttributeBinding].
pub const fn gl_offset_for<T>(count: GLsizei) -> usize {
    count as usize * size_of::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Call, RecordingApi};

    #[test]
    fn loader_that_resolves_nothing_is_refused() {
        // nothing else in this crate's tests touches the global GL pointers
        let err = GlApi::load_with(|_| std::ptr::null()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("glCreateShader"), "{}", message);
        assert!(message.contains("glClearColor"), "{}", message);
    }

    const VERTEX_SRC: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
   gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
";

    const FRAGMENT_SRC: &str = "#version 330 core
out vec4 FragColor;
uniform vec4 ourColor;
void main()
{
   FragColor = ourColor;
}
";

    // unbalanced brace
    const BROKEN_VERTEX_SRC: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
   gl_Position = vec4(aPos, 1.0);
";

    #[test]
    fn valid_sources_link_without_diagnostics() {
        let api = RecordingApi::new();
        let build = Program::build(&api, VERTEX_SRC, FRAGMENT_SRC).unwrap();
        assert!(build.is_usable());
        assert!(build.diagnostics.is_empty());
        assert!(build.program.is_linked());

        // both stages were released once the program was linked
        assert_eq!(api.live_shaders(), 0);
        assert_eq!(api.live_programs(), 1);

        let program = build.into_result().unwrap();
        assert_eq!(program.get_uniform_location("ourColor").unwrap(), 0);
        assert!(program.get_uniform_location("nope").is_err());

        drop(program);
        assert_eq!(api.live_programs(), 0);
    }

    #[test]
    fn broken_vertex_source_reports_vertex_stage() {
        let api = RecordingApi::new();
        let err = Program::compile(&api, BROKEN_VERTEX_SRC, FRAGMENT_SRC)
            .err()
            .unwrap();
        match &err {
            PipelineError::ShaderCompileFailed { stage, log } => {
                assert_eq!(*stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
        // strict compile stops before the fragment stage
        assert_eq!(api.live_shaders(), 0);
        assert!(!api
            .calls()
            .iter()
            .any(|c| matches!(c, Call::LinkProgram(_))));
    }

    #[test]
    fn lenient_build_keeps_going_and_reports_each_failure() {
        let api = RecordingApi::new();
        let build = Program::build(&api, BROKEN_VERTEX_SRC, FRAGMENT_SRC).unwrap();
        assert!(!build.is_usable());
        assert!(!build.program.is_linked());
        assert_eq!(build.diagnostics.len(), 2);
        assert!(matches!(
            build.diagnostics[0],
            PipelineError::ShaderCompileFailed {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        assert!(matches!(
            build.diagnostics[1],
            PipelineError::ProgramLinkFailed { .. }
        ));
        assert_eq!(api.live_shaders(), 0);

        let err = build.into_result().err().unwrap();
        assert!(err.log().is_some_and(|l| !l.is_empty()));
    }

    #[test]
    fn broken_fragment_source_reports_fragment_stage() {
        let api = RecordingApi::new();
        let err = Program::compile(&api, VERTEX_SRC, "void main() { FragColor = vec4(1.0); }")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PipelineError::ShaderCompileFailed {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
    }

    #[test]
    fn buffer_tracks_element_count() {
        let api = RecordingApi::new();
        let mut buffer = Buffer::<_, ArrayBufferType, f32>::new(&api).unwrap();
        assert!(buffer.is_empty());
        buffer.load(&[0.5, -0.5, 0.0, -0.5, -0.5, 0.0]).unwrap();
        assert_eq!(buffer.len(), 6);
        assert_eq!(api.buffer_contents(buffer.borrow_raw()).unwrap().len(), 24);
    }

    #[test]
    fn offsets_are_bytes() {
        assert_eq!(gl_offset_for::<u32>(3), 12);
        assert_eq!(gl_offset_for::<u8>(3), 3);
    }
}
