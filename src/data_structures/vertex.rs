//! The vertex format shared by every mesh.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::gpu::{VertexAttribute, VertexLayout};

/// One vertex: position, normal and the first texture coordinate channel.
///
/// The field order defines the interleaved buffer layout, see [`Vertex::LAYOUT`].
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

const ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        location: 0,
        components: 3,
        offset: offset_of!(Vertex, position) as u64,
    },
    VertexAttribute {
        location: 1,
        components: 3,
        offset: offset_of!(Vertex, normal) as u64,
    },
    VertexAttribute {
        location: 2,
        components: 2,
        offset: offset_of!(Vertex, tex_coords) as u64,
    },
];

impl Vertex {
    /// Position at location 0, normal at 1, texcoord at 2, all `f32`.
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: size_of::<Vertex>() as u64,
        attributes: &ATTRIBUTES,
    };

    pub fn new(
        position: cgmath::Vector3<f32>,
        normal: cgmath::Vector3<f32>,
        tex_coords: cgmath::Vector2<f32>,
    ) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            tex_coords: tex_coords.into(),
        }
    }
}
