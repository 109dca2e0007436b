use crate::{
    data_structures::{
        texture::{Texture, TextureKind},
        vertex::Vertex,
    },
    error::GpuError,
    gpu::{BufferKind, Gpu},
    resources::texture_cache::TextureCache,
    shader::Shader,
};

/// One drawable unit: immutable geometry, its texture references and the GPU
/// objects backing it.
///
/// The vertex array and both buffers are created in [`Mesh::new`] and released
/// when the mesh is dropped. Textures are only referenced; the model that owns
/// the [`TextureCache`] releases them.
pub struct Mesh<G: Gpu> {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<Texture>,
    // Drop order: the vertex array goes before the buffers it reads from.
    vertex_array: G::VertexArray,
    vertex_buffer: G::Buffer,
    index_buffer: G::Buffer,
}

impl<G: Gpu> Mesh<G> {
    /// Upload `vertices` and `indices` and describe the [`Vertex::LAYOUT`].
    ///
    /// Fails if the device cannot allocate, or if the mesh references more
    /// textures than the device has texture units.
    pub fn new(
        gpu: &mut G,
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Texture>,
    ) -> Result<Self, GpuError> {
        let name = name.into();
        check_texture_units(&name, textures.len(), gpu.max_texture_units())?;

        let vertex_buffer = gpu.create_buffer(
            BufferKind::Vertex,
            bytemuck::cast_slice(&vertices),
            &format!("{name} Vertex Buffer"),
        )?;
        let index_buffer = gpu.create_buffer(
            BufferKind::Index,
            bytemuck::cast_slice(&indices),
            &format!("{name} Index Buffer"),
        )?;
        let vertex_array = gpu.create_vertex_array(
            &vertex_buffer,
            &index_buffer,
            &Vertex::LAYOUT,
            &format!("{name} Vertex Array"),
        )?;

        Ok(Self {
            name,
            vertices,
            indices,
            textures,
            vertex_array,
            vertex_buffer,
            index_buffer,
        })
    }

    /**
     * Bind every texture to its own unit, point the matching sampler uniform at
     * it and issue one indexed draw over all indices.
     *
     * Texture `i` (0-based) goes to unit `i`. Its sampler is named after its
     * kind and how many textures of that kind came before it, so two diffuse
     * maps and a specular map set `diffuse_1`, `diffuse_2` and `specular_1`.
     */
    pub fn draw(
        &self,
        gpu: &mut G,
        shader: &Shader<G>,
        textures: &TextureCache<G>,
    ) -> Result<(), GpuError> {
        check_texture_units(&self.name, self.textures.len(), gpu.max_texture_units())?;

        let mut counts = [0usize; TextureKind::COUNT];
        for (unit, texture) in self.textures.iter().enumerate() {
            let resource =
                textures
                    .resolve(texture.handle)
                    .ok_or_else(|| GpuError::DanglingTexture {
                        mesh: self.name.clone(),
                        index: texture.handle.index(),
                    })?;
            let unit = unit as u32;
            gpu.active_texture(unit);
            gpu.bind_texture(resource);

            let count = &mut counts[texture.kind.index()];
            *count += 1;
            shader.set_sampler(gpu, &texture.kind.sampler_name(*count), unit);
        }
        gpu.active_texture(0);

        gpu.bind_vertex_array(&self.vertex_array);
        gpu.draw_elements(self.indices.len() as u32)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_array(&self) -> &G::VertexArray {
        &self.vertex_array
    }

    pub fn vertex_buffer(&self) -> &G::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &G::Buffer {
        &self.index_buffer
    }
}

fn check_texture_units(mesh: &str, requested: usize, available: u32) -> Result<(), GpuError> {
    if requested > available as usize {
        return Err(GpuError::TextureUnitsExceeded {
            mesh: mesh.to_string(),
            requested,
            available,
        });
    }
    Ok(())
}
