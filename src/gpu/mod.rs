//! The graphics device seam.
//!
//! Meshes and models never talk to a graphics API directly. They go through
//! [`Gpu`], an OpenGL-shaped interface with texture units, named uniforms and
//! indexed draws. Every resource type is owned: dropping a `Buffer`,
//! `VertexArray` or `Texture` releases it on the device, so each handle is freed
//! exactly once on every path, including aborted loads.
//!
//! Two implementations ship with the crate:
//!
//! - [`crate::context::WgpuContext`] drives a real device through wgpu
//! - [`trace::TraceGpu`] records every call, for dry runs and tests

pub mod trace;

use crate::{error::GpuError, resources::image::DecodedImage};

/// What a buffer holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// One `f32` vector attribute inside an interleaved vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub offset: u64,
}

/// Byte layout of an interleaved vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: &'static [VertexAttribute],
}

/// A graphics device bound to the current thread's rendering context.
pub trait Gpu {
    type Buffer;
    type VertexArray;
    type Texture;
    type Program;

    /// Number of texture units a single draw may bind.
    fn max_texture_units(&self) -> u32;

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        contents: &[u8],
        label: &str,
    ) -> Result<Self::Buffer, GpuError>;

    /// Describe how `vertex_buffer` is read and which index buffer goes with it.
    fn create_vertex_array(
        &mut self,
        vertex_buffer: &Self::Buffer,
        index_buffer: &Self::Buffer,
        layout: &VertexLayout,
        label: &str,
    ) -> Result<Self::VertexArray, GpuError>;

    fn create_texture(
        &mut self,
        image: &DecodedImage,
        label: &str,
    ) -> Result<Self::Texture, GpuError>;

    fn use_program(&mut self, program: &Self::Program);

    /// Unknown uniform names are ignored.
    fn set_uniform_i32(&mut self, program: &Self::Program, name: &str, value: i32);

    /// Unknown uniform names are ignored.
    fn set_uniform_f32(&mut self, program: &Self::Program, name: &str, value: f32);

    fn active_texture(&mut self, unit: u32);

    /// Bind `texture` to the active texture unit.
    fn bind_texture(&mut self, texture: &Self::Texture);

    fn bind_vertex_array(&mut self, vertex_array: &Self::VertexArray);

    /// Draw `index_count` indices of the bound vertex array as a triangle list.
    fn draw_elements(&mut self, index_count: u32) -> Result<(), GpuError>;
}
