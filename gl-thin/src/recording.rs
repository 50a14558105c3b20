//! A [GraphicsApi] that draws nothing.
//!
//! Every call is appended to a log, object handles are handed out from a counter, and just
//! enough GL state is tracked (bindings, buffer contents, compile and link status, uniform
//! names) to answer queries the way a driver would.  Draw calls resolve which vertices they
//! would visit so callers can check geometry without a GPU.

use crate::api::{AttributeBinding, GraphicsApi, ShaderStage};
use crate::gl_helper::GLErrorWrapper;
use gl::types::{GLbitfield, GLenum, GLint, GLsizei, GLuint};
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateShader { shader: GLuint, stage: ShaderStage },
    ShaderSource { shader: GLuint, source: String },
    CompileShader(GLuint),
    DeleteShader(GLuint),
    CreateProgram(GLuint),
    AttachShader { program: GLuint, shader: GLuint },
    DetachShader { program: GLuint, shader: GLuint },
    LinkProgram(GLuint),
    UseProgram(GLuint),
    DeleteProgram(GLuint),
    Uniform4f { location: GLint, value: [f32; 4] },
    GenVertexArray(GLuint),
    BindVertexArray(GLuint),
    DeleteVertexArray(GLuint),
    GenBuffer(GLuint),
    BindBuffer { target: GLenum, buffer: GLuint },
    BufferData { target: GLenum, buffer: GLuint, bytes: usize },
    DeleteBuffer(GLuint),
    VertexAttribPointer(AttributeBinding),
    EnableVertexAttribArray(GLuint),
    ClearColor([f32; 4]),
    Clear(GLbitfield),
    DrawArrays { mode: GLenum, first: GLint, count: GLsizei },
    DrawElements { mode: GLenum, count: GLsizei, index_type: GLenum, offset: usize },
    Viewport { x: GLint, y: GLint, width: GLsizei, height: GLsizei },
    PolygonMode { face: GLenum, mode: GLenum },
}

/// What one draw call would have rasterized.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub mode: GLenum,
    pub program: GLuint,
    pub vertex_array: GLuint,
    /// vertex indices in the order the primitive assembler would read them
    pub visited: Vec<u32>,
}

impl DrawRecord {
    /// `visited` grouped three at a time, for `TRIANGLES` draws
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.visited
            .iter()
            .copied()
            .tuples()
            .map(|(a, b, c)| [a, b, c])
            .collect()
    }
}

struct ShaderRecord {
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramRecord {
    attached: Vec<GLuint>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
}

#[derive(Default)]
struct Recording {
    next_handle: GLuint,
    calls: Vec<Call>,
    draws: Vec<DrawRecord>,
    shaders: HashMap<GLuint, ShaderRecord>,
    programs: HashMap<GLuint, ProgramRecord>,
    vertex_arrays: HashMap<GLuint, Option<GLuint>>,
    buffers: HashMap<GLuint, Vec<u8>>,
    bound_vertex_array: GLuint,
    bound_array_buffer: GLuint,
    current_program: GLuint,
}

impl Recording {
    fn fresh_handle(&mut self) -> GLuint {
        self.next_handle += 1;
        self.next_handle
    }

    fn bound_element_buffer(&self) -> Option<GLuint> {
        self.vertex_arrays
            .get(&self.bound_vertex_array)
            .copied()
            .flatten()
    }
}

#[derive(Clone, Default)]
pub struct RecordingApi {
    inner: Rc<RefCell<Recording>>,
}

fn invalid_operation() -> GLErrorWrapper {
    GLErrorWrapper::new(gl::INVALID_OPERATION)
}

fn invalid_value() -> GLErrorWrapper {
    GLErrorWrapper::new(gl::INVALID_VALUE)
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.inner.borrow().draws.clone()
    }

    pub fn last_draw(&self) -> Option<DrawRecord> {
        self.inner.borrow().draws.last().cloned()
    }

    /// every value passed to `uniform_4f`, oldest first
    pub fn uniform_4f_values(&self) -> Vec<[f32; 4]> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Uniform4f { value, .. } => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn forget_calls(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.calls.clear();
        inner.draws.clear();
    }

    pub fn live_shaders(&self) -> usize {
        self.inner.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.inner.borrow().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.inner.borrow().buffers.len()
    }

    pub fn buffer_contents(&self, buffer: GLuint) -> Option<Vec<u8>> {
        self.inner.borrow().buffers.get(&buffer).cloned()
    }

    pub fn bound_vertex_array(&self) -> GLuint {
        self.inner.borrow().bound_vertex_array
    }

    /// the element buffer `vertex_array` recorded while it was bound
    pub fn element_buffer_of(&self, vertex_array: GLuint) -> Option<GLuint> {
        self.inner
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .copied()
            .flatten()
    }

    fn record(&self, call: Call) {
        self.inner.borrow_mut().calls.push(call);
    }
}

/// Stand-in for a GLSL front end: catches what a tutorial typo usually breaks.
fn check_glsl(source: &str) -> Result<(), String> {
    if !source.trim_start().starts_with("#version") {
        return Err("0:1(1): error: missing #version directive".to_string());
    }
    if !source.contains("void main") {
        return Err("0:1(1): error: no definition of main()".to_string());
    }
    for (open, close) in [('{', '}'), ('(', ')')] {
        let mut depth = 0i32;
        for (line, text) in source.lines().enumerate() {
            for ch in text.chars() {
                if ch == open {
                    depth += 1;
                } else if ch == close {
                    depth -= 1;
                }
                if depth < 0 {
                    return Err(format!("0:{}(1): error: unexpected '{}'", line + 1, close));
                }
            }
        }
        if depth != 0 {
            return Err(format!(
                "0:{}(1): error: syntax error, unexpected end of file, expecting '{}'",
                source.lines().count(),
                close
            ));
        }
    }
    Ok(())
}

/// names declared with `uniform <type> <name>;`, in declaration order
fn declared_uniforms(source: &str) -> Vec<String> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("uniform "))
        .filter_map(|line| line.split_whitespace().nth(2))
        .map(|name| name.trim_end_matches(';').to_string())
        .collect()
}

impl GraphicsApi for RecordingApi {
    fn create_shader(&self, stage: ShaderStage) -> Result<GLuint, GLErrorWrapper> {
        let mut inner = self.inner.borrow_mut();
        let shader = inner.fresh_handle();
        inner.shaders.insert(
            shader,
            ShaderRecord {
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        inner.calls.push(Call::CreateShader { shader, stage });
        Ok(shader)
    }

    fn shader_source(&self, shader: GLuint, source: &str) -> Result<(), GLErrorWrapper> {
        self.record(Call::ShaderSource {
            shader,
            source: source.to_string(),
        });
        let mut inner = self.inner.borrow_mut();
        let record = inner.shaders.get_mut(&shader).ok_or_else(invalid_value)?;
        record.source = source.to_string();
        Ok(())
    }

    fn compile_shader(&self, shader: GLuint) -> Result<(), GLErrorWrapper> {
        self.record(Call::CompileShader(shader));
        let mut inner = self.inner.borrow_mut();
        let record = inner.shaders.get_mut(&shader).ok_or_else(invalid_value)?;
        match check_glsl(&record.source) {
            Ok(()) => {
                record.compiled = true;
                record.log.clear();
            }
            Err(log) => {
                record.compiled = false;
                record.log = log;
            }
        }
        Ok(())
    }

    fn compile_status(&self, shader: GLuint) -> Result<bool, GLErrorWrapper> {
        let inner = self.inner.borrow();
        let record = inner.shaders.get(&shader).ok_or_else(invalid_value)?;
        Ok(record.compiled)
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let inner = self.inner.borrow();
        inner
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: GLuint) {
        self.record(Call::DeleteShader(shader));
        self.inner.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<GLuint, GLErrorWrapper> {
        let mut inner = self.inner.borrow_mut();
        let program = inner.fresh_handle();
        inner.programs.insert(program, ProgramRecord::default());
        inner.calls.push(Call::CreateProgram(program));
        Ok(program)
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) -> Result<(), GLErrorWrapper> {
        self.record(Call::AttachShader { program, shader });
        let mut inner = self.inner.borrow_mut();
        if !inner.shaders.contains_key(&shader) {
            return Err(invalid_value());
        }
        let record = inner.programs.get_mut(&program).ok_or_else(invalid_value)?;
        if record.attached.contains(&shader) {
            return Err(invalid_operation());
        }
        record.attached.push(shader);
        Ok(())
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        self.record(Call::DetachShader { program, shader });
        if let Some(record) = self.inner.borrow_mut().programs.get_mut(&program) {
            record.attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: GLuint) -> Result<(), GLErrorWrapper> {
        self.record(Call::LinkProgram(program));
        let mut inner = self.inner.borrow_mut();
        let Recording {
            shaders, programs, ..
        } = &mut *inner;
        let record = programs.get_mut(&program).ok_or_else(invalid_value)?;
        let attached: Vec<&ShaderRecord> = record
            .attached
            .iter()
            .filter_map(|s| shaders.get(s))
            .collect();

        record.linked = false;
        record.uniforms.clear();
        if attached.iter().any(|s| !s.compiled) {
            record.log = "error: linking with uncompiled/unspecialized shader".to_string();
        } else if attached.len() < 2 {
            record.log = "error: a program needs both a vertex and a fragment stage".to_string();
        } else {
            record.linked = true;
            record.log.clear();
            record.uniforms = attached
                .iter()
                .flat_map(|s| declared_uniforms(&s.source))
                .unique()
                .collect();
        }
        Ok(())
    }

    fn link_status(&self, program: GLuint) -> Result<bool, GLErrorWrapper> {
        let inner = self.inner.borrow();
        let record = inner.programs.get(&program).ok_or_else(invalid_value)?;
        Ok(record.linked)
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let inner = self.inner.borrow();
        inner
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: GLuint) -> Result<(), GLErrorWrapper> {
        self.record(Call::UseProgram(program));
        let mut inner = self.inner.borrow_mut();
        if program != 0 {
            let record = inner.programs.get(&program).ok_or_else(invalid_value)?;
            if !record.linked {
                return Err(invalid_operation());
            }
        }
        inner.current_program = program;
        Ok(())
    }

    fn delete_program(&self, program: GLuint) {
        self.record(Call::DeleteProgram(program));
        let mut inner = self.inner.borrow_mut();
        inner.programs.remove(&program);
        if inner.current_program == program {
            inner.current_program = 0;
        }
    }

    fn uniform_location(
        &self,
        program: GLuint,
        name: &str,
    ) -> Result<Option<GLint>, GLErrorWrapper> {
        let inner = self.inner.borrow();
        let record = inner.programs.get(&program).ok_or_else(invalid_value)?;
        if !record.linked {
            return Err(invalid_operation());
        }
        Ok(record
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| i as GLint))
    }

    fn uniform_4f(&self, location: GLint, value: [f32; 4]) -> Result<(), GLErrorWrapper> {
        self.record(Call::Uniform4f { location, value });
        if self.inner.borrow().current_program == 0 {
            return Err(invalid_operation());
        }
        Ok(())
    }

    fn gen_vertex_array(&self) -> Result<GLuint, GLErrorWrapper> {
        let mut inner = self.inner.borrow_mut();
        let vertex_array = inner.fresh_handle();
        inner.vertex_arrays.insert(vertex_array, None);
        inner.calls.push(Call::GenVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn bind_vertex_array(&self, vertex_array: GLuint) -> Result<(), GLErrorWrapper> {
        self.record(Call::BindVertexArray(vertex_array));
        let mut inner = self.inner.borrow_mut();
        if vertex_array != 0 && !inner.vertex_arrays.contains_key(&vertex_array) {
            return Err(invalid_operation());
        }
        inner.bound_vertex_array = vertex_array;
        Ok(())
    }

    fn delete_vertex_array(&self, vertex_array: GLuint) {
        self.record(Call::DeleteVertexArray(vertex_array));
        let mut inner = self.inner.borrow_mut();
        inner.vertex_arrays.remove(&vertex_array);
        if inner.bound_vertex_array == vertex_array {
            inner.bound_vertex_array = 0;
        }
    }

    fn gen_buffer(&self) -> Result<GLuint, GLErrorWrapper> {
        let mut inner = self.inner.borrow_mut();
        let buffer = inner.fresh_handle();
        inner.buffers.insert(buffer, Vec::new());
        inner.calls.push(Call::GenBuffer(buffer));
        Ok(buffer)
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) -> Result<(), GLErrorWrapper> {
        self.record(Call::BindBuffer { target, buffer });
        let mut inner = self.inner.borrow_mut();
        if buffer != 0 && !inner.buffers.contains_key(&buffer) {
            return Err(invalid_operation());
        }
        match target {
            gl::ARRAY_BUFFER => inner.bound_array_buffer = buffer,
            gl::ELEMENT_ARRAY_BUFFER => {
                let vertex_array = inner.bound_vertex_array;
                match inner.vertex_arrays.get_mut(&vertex_array) {
                    Some(slot) => *slot = (buffer != 0).then_some(buffer),
                    // no vertex array to remember it in
                    None => return Err(invalid_operation()),
                }
            }
            _ => return Err(GLErrorWrapper::new(gl::INVALID_ENUM)),
        }
        Ok(())
    }

    fn buffer_data(&self, target: GLenum, data: &[u8]) -> Result<(), GLErrorWrapper> {
        let mut inner = self.inner.borrow_mut();
        let buffer = match target {
            gl::ARRAY_BUFFER => inner.bound_array_buffer,
            gl::ELEMENT_ARRAY_BUFFER => inner.bound_element_buffer().unwrap_or(0),
            _ => return Err(GLErrorWrapper::new(gl::INVALID_ENUM)),
        };
        inner.calls.push(Call::BufferData {
            target,
            buffer,
            bytes: data.len(),
        });
        let contents = inner
            .buffers
            .get_mut(&buffer)
            .ok_or_else(invalid_operation)?;
        *contents = data.to_vec();
        Ok(())
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.record(Call::DeleteBuffer(buffer));
        let mut inner = self.inner.borrow_mut();
        inner.buffers.remove(&buffer);
        if inner.bound_array_buffer == buffer {
            inner.bound_array_buffer = 0;
        }
        for slot in inner.vertex_arrays.values_mut() {
            if *slot == Some(buffer) {
                *slot = None;
            }
        }
    }

    fn vertex_attrib_pointer(&self, binding: &AttributeBinding) -> Result<(), GLErrorWrapper> {
        self.record(Call::VertexAttribPointer(*binding));
        let inner = self.inner.borrow();
        if inner.bound_vertex_array == 0 || inner.bound_array_buffer == 0 {
            return Err(invalid_operation());
        }
        if !(1..=4).contains(&binding.components) || binding.stride < 0 {
            return Err(invalid_value());
        }
        Ok(())
    }

    fn enable_vertex_attrib_array(&self, location: GLuint) -> Result<(), GLErrorWrapper> {
        self.record(Call::EnableVertexAttribArray(location));
        if self.inner.borrow().bound_vertex_array == 0 {
            return Err(invalid_operation());
        }
        Ok(())
    }

    fn clear_color(&self, rgba: [f32; 4]) -> Result<(), GLErrorWrapper> {
        self.record(Call::ClearColor(rgba));
        Ok(())
    }

    fn clear(&self, mask: GLbitfield) -> Result<(), GLErrorWrapper> {
        self.record(Call::Clear(mask));
        Ok(())
    }

    fn draw_arrays(
        &self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
    ) -> Result<(), GLErrorWrapper> {
        self.record(Call::DrawArrays { mode, first, count });
        let mut inner = self.inner.borrow_mut();
        if first < 0 || count < 0 {
            return Err(invalid_value());
        }
        let record = DrawRecord {
            mode,
            program: inner.current_program,
            vertex_array: inner.bound_vertex_array,
            visited: (first as u32..(first + count) as u32).collect(),
        };
        inner.draws.push(record);
        Ok(())
    }

    fn draw_elements(
        &self,
        mode: GLenum,
        count: GLsizei,
        index_type: GLenum,
        offset: usize,
    ) -> Result<(), GLErrorWrapper> {
        self.record(Call::DrawElements {
            mode,
            count,
            index_type,
            offset,
        });
        let mut inner = self.inner.borrow_mut();
        if count < 0 {
            return Err(invalid_value());
        }
        let element_buffer = inner
            .bound_element_buffer()
            .ok_or_else(invalid_operation)?;
        let bytes = inner
            .buffers
            .get(&element_buffer)
            .ok_or_else(invalid_operation)?;
        let all: Vec<u32> = match index_type {
            gl::UNSIGNED_INT => bytes
                .chunks_exact(4)
                .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            gl::UNSIGNED_SHORT => bytes
                .chunks_exact(2)
                .map(|c| u16::from_ne_bytes([c[0], c[1]]) as u32)
                .collect(),
            gl::UNSIGNED_BYTE => bytes.iter().map(|b| *b as u32).collect(),
            _ => return Err(GLErrorWrapper::new(gl::INVALID_ENUM)),
        };
        let width = match index_type {
            gl::UNSIGNED_INT => 4,
            gl::UNSIGNED_SHORT => 2,
            _ => 1,
        };
        let start = offset / width;
        let visited: Vec<u32> = all.into_iter().skip(start).take(count as usize).collect();
        if visited.len() != count as usize {
            // reading past the end of the element buffer
            return Err(invalid_operation());
        }
        let record = DrawRecord {
            mode,
            program: inner.current_program,
            vertex_array: inner.bound_vertex_array,
            visited,
        };
        inner.draws.push(record);
        Ok(())
    }

    fn viewport(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
    ) -> Result<(), GLErrorWrapper> {
        self.record(Call::Viewport {
            x,
            y,
            width,
            height,
        });
        if width < 0 || height < 0 {
            return Err(invalid_value());
        }
        Ok(())
    }

    fn polygon_mode(&self, face: GLenum, mode: GLenum) -> Result<(), GLErrorWrapper> {
        self.record(Call::PolygonMode { face, mode });
        Ok(())
    }
}
