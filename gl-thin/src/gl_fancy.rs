use crate::api::{AttributeBinding, GraphicsApi};
use crate::gl_helper::{
    gl_offset_for, ArrayBufferType, Buffer, ElementArrayBufferType, GLBufferType, GLErrorWrapper,
    VertexArray,
};
use bytemuck::Pod;
use gl::types::{GLenum, GLint, GLsizei, GLuint};

/// Whoever holds `&mut GPUState` is the only one with buffers bound.
pub struct GPUState {}

impl GPUState {
    pub fn new() -> Self {
        Self {}
    }

    pub fn bind_vertex_array_and_buffers<'a, G: GraphicsApi, AT, IT>(
        &'a mut self,
        bundle: &'a VertexBufferBundle<G, AT, IT>,
    ) -> Result<BoundBuffers<'a, G, AT, IT>, GLErrorWrapper> {
        // the vertex array restores the element buffer binding on its own
        bundle.vertex_array.bind()?;
        Ok(BoundBuffers {
            gpu_state: self,
            bundle,
        })
    }

    pub fn bind_vertex_array_and_buffers_mut<'a, G: GraphicsApi, AT, IT>(
        &'a mut self,
        bundle: &'a mut VertexBufferBundle<G, AT, IT>,
    ) -> Result<BoundBuffersMut<'a, G, AT, IT>, GLErrorWrapper> {
        bundle.vertex_array.bind()?;
        Ok(BoundBuffersMut {
            gpu_state: self,
            bundle,
        })
    }
}

impl Default for GPUState {
    fn default() -> Self {
        Self::new()
    }
}

//

pub struct BoundBuffers<'a, G: GraphicsApi, AT, IT> {
    pub gpu_state: &'a GPUState,
    pub bundle: &'a VertexBufferBundle<G, AT, IT>,
}

impl<'a, G: GraphicsApi, AT, IT> BoundBuffers<'a, G, AT, IT> {
    /// Non-indexed draw of `count` vertices starting at vertex `first`.
    pub fn draw_arrays(
        &self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
    ) -> Result<(), GLErrorWrapper> {
        let available = self.bundle.vertex_count();
        if !range_fits(first, count, available) {
            return Err(GLErrorWrapper::with_message2(format!(
                "draw of {} vertices from vertex {} but only {} are loaded",
                count, first, available
            )));
        }
        self.bundle.api().draw_arrays(mode, first, count)
    }
}

impl<'a, G: GraphicsApi, AT, IT: GLBufferType> BoundBuffers<'a, G, AT, IT> {
    /// Indexed draw of `n_indices` indices starting `offset` indices into the element buffer.
    pub fn draw_elements(
        &self,
        mode: GLenum,
        n_indices: GLsizei,
        offset: GLsizei,
    ) -> Result<(), GLErrorWrapper> {
        let Some(index_buffer) = self.bundle.index_buffer.as_ref() else {
            return Err(GLErrorWrapper::with_message2(
                "draw_elements without an index buffer".to_string(),
            ));
        };
        if !range_fits(offset, n_indices, index_buffer.len()) {
            return Err(GLErrorWrapper::with_message2(format!(
                "draw of {} indices at offset {} but the index buffer holds {}",
                n_indices,
                offset,
                index_buffer.len()
            )));
        }
        self.bundle
            .api()
            .draw_elements(mode, n_indices, IT::TYPE_CODE, gl_offset_for::<IT>(offset))
    }
}

/// `start..start + len` lies inside `0..available`. Negative or overflowing ranges never fit.
fn range_fits(start: GLsizei, len: GLsizei, available: usize) -> bool {
    match (usize::try_from(start), usize::try_from(len)) {
        (Ok(start), Ok(len)) => start
            .checked_add(len)
            .is_some_and(|end| end <= available),
        _ => false,
    }
}

impl<'a, G: GraphicsApi, AT, IT> Drop for BoundBuffers<'a, G, AT, IT> {
    fn drop(&mut self) {
        if let Err(e) = self.bundle.api().bind_vertex_array(0) {
            log::error!("failed to unbind vertex array: {}", e);
        }
    }
}

//

/// Bound for filling in: the vertex array is bound, so element buffer bindings stick to it.
pub struct BoundBuffersMut<'a, G: GraphicsApi, AT, IT> {
    pub gpu_state: &'a GPUState,
    pub bundle: &'a mut VertexBufferBundle<G, AT, IT>,
}

impl<'a, G: GraphicsApi, AT: GLBufferType + Pod, IT: Pod> BoundBuffersMut<'a, G, AT, IT> {
    pub fn load_vertices(&mut self, values: &[AT]) -> Result<(), GLErrorWrapper> {
        self.bundle.vertex_buffer.load(values)
    }

    pub fn load_indices(&mut self, values: &[IT]) -> Result<(), GLErrorWrapper> {
        let index_buffer = match self.bundle.index_buffer.take() {
            Some(buffer) => buffer,
            None => Buffer::new(self.bundle.api())?,
        };
        self.bundle.index_buffer.insert(index_buffer).load(values)
    }

    /// # Arguments
    /// * `program_attribute_location` -  the `layout (location = N)` of the shader input
    /// * `attribute_array_width` - would be 3 for a vec3 or 2 for a vec2
    /// * `offset` - how many values are between the beginning of the "row" and this attribute's data.
    ///
    /// The stride is the bundle's `row_width`.
    pub fn rig_one_attribute(
        &self,
        program_attribute_location: GLuint,
        attribute_array_width: GLint,
        offset: GLsizei,
    ) -> Result<(), GLErrorWrapper> {
        let binding = AttributeBinding::new::<AT>(
            program_attribute_location,
            attribute_array_width,
            self.bundle.row_width,
            offset,
        );
        // the attribute captures whatever array buffer is bound right now
        self.bundle.vertex_buffer.bind()?;
        let api = self.bundle.api();
        api.vertex_attrib_pointer(&binding)?;
        api.enable_vertex_attrib_array(program_attribute_location)
    }
}

impl<'a, G: GraphicsApi, AT, IT> Drop for BoundBuffersMut<'a, G, AT, IT> {
    fn drop(&mut self) {
        // vertex array first: unbinding the element buffer while it is bound would unhook it
        let api = self.bundle.api();
        if let Err(e) = api
            .bind_vertex_array(0)
            .and_then(|_| api.bind_buffer(gl::ARRAY_BUFFER, 0))
        {
            log::error!("failed to unbind vertex array: {}", e);
        }
    }
}

//

pub struct VertexBufferBundle<G: GraphicsApi, AT, IT> {
    pub vertex_array: VertexArray<G>,
    pub vertex_buffer: Buffer<G, ArrayBufferType, AT>,
    pub index_buffer: Option<Buffer<G, ElementArrayBufferType, IT>>,
    /// how many `AT` make up one vertex
    pub row_width: GLsizei,
}

impl<G: GraphicsApi, AT, IT> VertexBufferBundle<G, AT, IT> {
    pub fn empty(api: &G, row_width: GLsizei) -> Result<Self, GLErrorWrapper> {
        Ok(Self {
            vertex_array: VertexArray::new(api)?,
            vertex_buffer: Buffer::new(api)?,
            index_buffer: None,
            row_width,
        })
    }

    pub fn api(&self) -> &G {
        &self.vertex_array.api
    }

    pub fn vertex_count(&self) -> usize {
        if self.row_width <= 0 {
            0
        } else {
            self.vertex_buffer.len() / self.row_width as usize
        }
    }

    pub fn index_count(&self) -> usize {
        self.index_buffer.as_ref().map_or(0, |b| b.len())
    }

    pub fn bind<'a>(
        &'a self,
        gpu_state: &'a mut GPUState,
    ) -> Result<BoundBuffers<'a, G, AT, IT>, GLErrorWrapper> {
        gpu_state.bind_vertex_array_and_buffers(self)
    }

    pub fn bind_mut<'a>(
        &'a mut self,
        gpu_state: &'a mut GPUState,
    ) -> Result<BoundBuffersMut<'a, G, AT, IT>, GLErrorWrapper> {
        gpu_state.bind_vertex_array_and_buffers_mut(self)
    }
}

impl<G: GraphicsApi, AT: GLBufferType + Pod, IT: Pod> VertexBufferBundle<G, AT, IT> {
    /// Upload `vertex_data` (and `index_data` when present) and rig each
    /// `(location, width, offset)` attribute against rows of `row_width` values.
    pub fn new(
        api: &G,
        gpu_state: &mut GPUState,
        vertex_data: &[AT],
        index_data: Option<&[IT]>,
        row_width: GLsizei,
        attributes: &[(GLuint, GLint, GLsizei)],
    ) -> Result<Self, GLErrorWrapper> {
        let mut rval = Self::empty(api, row_width)?;
        {
            let mut bindings = rval.bind_mut(gpu_state)?;
            bindings.load_vertices(vertex_data)?;
            if let Some(indices) = index_data {
                bindings.load_indices(indices)?;
            }
            for &(location, width, offset) in attributes {
                bindings.rig_one_attribute(location, width, offset)?;
            }
        }
        Ok(rval)
    }
}
