//! A device that records calls instead of executing them.
//!
//! [`TraceGpu`] hands out integer ids like an OpenGL driver would and appends a
//! [`GpuCall`] for every operation, including the release of each resource when
//! its handle is dropped. The inspect binary uses it for dry runs; the tests use
//! it to check call order and resource lifetimes.

use std::{cell::RefCell, rc::Rc};

use crate::{
    error::GpuError,
    gpu::{BufferKind, Gpu, VertexLayout},
    resources::image::DecodedImage,
    shader::Shader,
};

/// Texture units reported unless configured otherwise, the OpenGL 3.3 minimum.
pub const DEFAULT_TEXTURE_UNITS: u32 = 16;

/// One recorded device operation.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCall {
    CreateBuffer {
        id: u32,
        kind: BufferKind,
        len: usize,
    },
    CreateVertexArray {
        id: u32,
        vertex_buffer: u32,
        index_buffer: u32,
        layout: VertexLayout,
    },
    CreateTexture {
        id: u32,
        label: String,
        width: u32,
        height: u32,
        channels: u8,
    },
    UseProgram(u32),
    SetUniformI32 {
        program: u32,
        name: String,
        value: i32,
    },
    SetUniformF32 {
        program: u32,
        name: String,
        value: f32,
    },
    ActiveTexture(u32),
    BindTexture(u32),
    BindVertexArray(u32),
    DrawElements(u32),
    DeleteBuffer(u32),
    DeleteVertexArray(u32),
    DeleteTexture(u32),
}

type CallLog = Rc<RefCell<Vec<GpuCall>>>;

#[derive(Clone, Copy, Debug)]
enum ResourceKind {
    Buffer,
    VertexArray,
    Texture,
}

/// A resource id that records its own deletion.
#[derive(Debug)]
pub struct TraceResource {
    id: u32,
    kind: ResourceKind,
    log: CallLog,
}

impl TraceResource {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for TraceResource {
    fn drop(&mut self) {
        let call = match self.kind {
            ResourceKind::Buffer => GpuCall::DeleteBuffer(self.id),
            ResourceKind::VertexArray => GpuCall::DeleteVertexArray(self.id),
            ResourceKind::Texture => GpuCall::DeleteTexture(self.id),
        };
        self.log.borrow_mut().push(call);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceProgram {
    id: u32,
}

impl TraceProgram {
    pub fn id(&self) -> u32 {
        self.id
    }
}

pub struct TraceGpu {
    log: CallLog,
    next_id: u32,
    max_texture_units: u32,
    allocation_limit: Option<usize>,
    allocations: usize,
}

impl TraceGpu {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            next_id: 1,
            max_texture_units: DEFAULT_TEXTURE_UNITS,
            allocation_limit: None,
            allocations: 0,
        }
    }

    pub fn with_texture_units(mut self, units: u32) -> Self {
        self.max_texture_units = units;
        self
    }

    /// Fail every allocation after the first `limit` with [`GpuError::OutOfMemory`].
    pub fn with_allocation_limit(mut self, limit: usize) -> Self {
        self.allocation_limit = Some(limit);
        self
    }

    pub fn create_program(&mut self) -> Shader<TraceGpu> {
        let id = self.next_id();
        Shader::new(TraceProgram { id })
    }

    /// Everything recorded so far, including releases.
    pub fn calls(&self) -> Vec<GpuCall> {
        self.log.borrow().clone()
    }

    /// Forget the recorded calls, keeping live resources alive.
    pub fn clear(&mut self) {
        self.log.borrow_mut().clear();
    }

    pub fn count(&self, matches: impl Fn(&GpuCall) -> bool) -> usize {
        self.log.borrow().iter().filter(|call| matches(call)).count()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn allocate(&mut self, kind: ResourceKind, what: &str) -> Result<TraceResource, GpuError> {
        if let Some(limit) = self.allocation_limit {
            if self.allocations >= limit {
                return Err(GpuError::OutOfMemory(what.to_string()));
            }
        }
        self.allocations += 1;
        Ok(TraceResource {
            id: self.next_id(),
            kind,
            log: self.log.clone(),
        })
    }

    fn record(&self, call: GpuCall) {
        self.log.borrow_mut().push(call);
    }
}

impl Default for TraceGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpu for TraceGpu {
    type Buffer = TraceResource;
    type VertexArray = TraceResource;
    type Texture = TraceResource;
    type Program = TraceProgram;

    fn max_texture_units(&self) -> u32 {
        self.max_texture_units
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        contents: &[u8],
        label: &str,
    ) -> Result<TraceResource, GpuError> {
        let buffer = self.allocate(ResourceKind::Buffer, label)?;
        self.record(GpuCall::CreateBuffer {
            id: buffer.id,
            kind,
            len: contents.len(),
        });
        Ok(buffer)
    }

    fn create_vertex_array(
        &mut self,
        vertex_buffer: &TraceResource,
        index_buffer: &TraceResource,
        layout: &VertexLayout,
        label: &str,
    ) -> Result<TraceResource, GpuError> {
        let vertex_array = self.allocate(ResourceKind::VertexArray, label)?;
        self.record(GpuCall::CreateVertexArray {
            id: vertex_array.id,
            vertex_buffer: vertex_buffer.id,
            index_buffer: index_buffer.id,
            layout: *layout,
        });
        Ok(vertex_array)
    }

    fn create_texture(
        &mut self,
        image: &DecodedImage,
        label: &str,
    ) -> Result<TraceResource, GpuError> {
        if image.width == 0 || image.height == 0 {
            return Err(GpuError::EmptyTexture(label.to_string()));
        }
        let texture = self.allocate(ResourceKind::Texture, label)?;
        self.record(GpuCall::CreateTexture {
            id: texture.id,
            label: label.to_string(),
            width: image.width,
            height: image.height,
            channels: image.channels,
        });
        Ok(texture)
    }

    fn use_program(&mut self, program: &TraceProgram) {
        self.record(GpuCall::UseProgram(program.id));
    }

    fn set_uniform_i32(&mut self, program: &TraceProgram, name: &str, value: i32) {
        self.record(GpuCall::SetUniformI32 {
            program: program.id,
            name: name.to_string(),
            value,
        });
    }

    fn set_uniform_f32(&mut self, program: &TraceProgram, name: &str, value: f32) {
        self.record(GpuCall::SetUniformF32 {
            program: program.id,
            name: name.to_string(),
            value,
        });
    }

    fn active_texture(&mut self, unit: u32) {
        self.record(GpuCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: &TraceResource) {
        self.record(GpuCall::BindTexture(texture.id));
    }

    fn bind_vertex_array(&mut self, vertex_array: &TraceResource) {
        self.record(GpuCall::BindVertexArray(vertex_array.id));
    }

    fn draw_elements(&mut self, index_count: u32) -> Result<(), GpuError> {
        self.record(GpuCall::DrawElements(index_count));
        Ok(())
    }
}
