use std::path::{Path, PathBuf};

use crate::{
    error::{GpuError, LoadError},
    gpu::Gpu,
    resources::{loader::ModelLoader, mesh::Mesh, texture_cache::TextureCache},
    shader::Shader,
};

/// Every mesh of one loaded asset, in draw order, plus the textures they share.
pub struct Model<G: Gpu> {
    // Field order is drop order: meshes release their buffers before the
    // textures they reference are released.
    pub(crate) meshes: Vec<Mesh<G>>,
    pub(crate) textures: TextureCache<G>,
    pub(crate) directory: PathBuf,
}

impl<G: Gpu> Model<G> {
    /// Load `path` with default options, picking the importer by extension.
    pub fn load(gpu: &mut G, path: impl AsRef<Path>) -> Result<Self, LoadError> {
        ModelLoader::default().load(gpu, path)
    }

    /// Draw every mesh in load order.
    pub fn draw(&self, gpu: &mut G, shader: &Shader<G>) -> Result<(), GpuError> {
        self.meshes
            .iter()
            .try_for_each(|mesh| mesh.draw(gpu, shader, &self.textures))
    }

    pub fn meshes(&self) -> &[Mesh<G>] {
        &self.meshes
    }

    pub fn textures(&self) -> &TextureCache<G> {
        &self.textures
    }

    /// Directory texture references were resolved against.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}
