//! Flattening an imported scene into GPU meshes.
//!
//! The loader walks the scene graph depth-first from the root. At every node it
//! first takes the node's meshes in listed order, then descends into the
//! children in listed order; the resulting sequence is the model's draw order.
//! The walk uses an explicit stack, so arbitrarily deep hierarchies are fine.
//!
//! Only importer failures and GPU allocation failures abort a load. A mesh with
//! broken geometry is skipped and a texture that cannot be loaded leaves its
//! slot empty; both are logged. A load that ends up with no mesh at all, because
//! none is reachable from the root or every reachable one was skipped, fails
//! with [`ImportError::NoMeshes`].

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{
    config::LoadOptions,
    data_structures::{
        texture::{Texture, TextureKind},
        vertex::Vertex,
    },
    error::{GpuError, ImportError, LoadError},
    gpu::Gpu,
    resources::{
        image::{FsImageLoader, ImageLoader, ImageSource},
        import::{Importer, RawMesh, Scene, SceneImporter, TextureSource},
        mesh::Mesh,
        model::Model,
        texture_cache::{TextureCache, resolve_texture_path},
    },
};

pub struct ModelLoader {
    options: LoadOptions,
    importer: Box<dyn Importer>,
    images: Box<dyn ImageLoader>,
}

impl ModelLoader {
    pub fn new(options: LoadOptions) -> Self {
        let images = FsImageLoader::new(options.flip_images);
        Self {
            options,
            importer: Box::new(SceneImporter),
            images: Box::new(images),
        }
    }

    pub fn with_importer(mut self, importer: impl Importer + 'static) -> Self {
        self.importer = Box::new(importer);
        self
    }

    pub fn with_image_loader(mut self, images: impl ImageLoader + 'static) -> Self {
        self.images = Box::new(images);
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn load<G: Gpu>(&self, gpu: &mut G, path: impl AsRef<Path>) -> Result<Model<G>, LoadError> {
        let path = path.as_ref();
        let started = instant::Instant::now();

        let scene = self.importer.import(path, &self.options.import)?;
        let root = scene
            .root
            .filter(|&root| root < scene.nodes.len())
            .ok_or_else(|| ImportError::NoRootNode(path.to_path_buf()))?;
        let order = mesh_order(&scene, root);
        if order.is_empty() {
            return Err(ImportError::NoMeshes(path.to_path_buf()).into());
        }
        log::debug!(
            "Imported {}: {} nodes, {} meshes, {} materials",
            path.display(),
            scene.nodes.len(),
            scene.meshes.len(),
            scene.materials.len()
        );

        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        // Built in place so that an aborted load drops meshes before textures.
        let mut model = Model {
            meshes: Vec::new(),
            textures: TextureCache::new(),
            directory: directory.clone(),
        };
        let mut failed_textures = HashSet::new();

        for mesh_index in order {
            let raw = &scene.meshes[mesh_index];
            let name = if raw.name.is_empty() {
                format!("mesh{mesh_index}")
            } else {
                raw.name.clone()
            };
            let Some((vertices, indices)) = flatten(&name, raw) else {
                continue;
            };
            let textures = self.resolve_textures(
                gpu,
                &scene,
                raw,
                &name,
                &directory,
                &mut model.textures,
                &mut failed_textures,
            )?;
            log::debug!(
                "Mesh {name}: {} vertices, {} triangles, {} textures",
                vertices.len(),
                indices.len() / 3,
                textures.len()
            );
            model
                .meshes
                .push(Mesh::new(gpu, name, vertices, indices, textures)?);
        }
        if model.meshes.is_empty() {
            log::error!("No mesh of {} survived loading.", path.display());
            return Err(ImportError::NoMeshes(path.to_path_buf()).into());
        }

        log::info!(
            "Loaded {} with {} meshes and {} textures in {:?}",
            path.display(),
            model.meshes.len(),
            model.textures.len(),
            started.elapsed()
        );
        Ok(model)
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_textures<G: Gpu>(
        &self,
        gpu: &mut G,
        scene: &Scene,
        raw: &RawMesh,
        mesh_name: &str,
        directory: &Path,
        cache: &mut TextureCache<G>,
        failed: &mut HashSet<PathBuf>,
    ) -> Result<Vec<Texture>, GpuError> {
        let Some(material_index) = raw.material else {
            return Ok(Vec::new());
        };
        let Some(material) = scene.materials.get(material_index) else {
            log::warn!("Mesh {mesh_name} references missing material {material_index}.");
            return Ok(Vec::new());
        };

        let mut textures = Vec::new();
        for kind in unique_kinds(&self.options.texture_kinds) {
            for source in material.textures_of(kind) {
                let (path, embedded) = match source {
                    TextureSource::File(reference) => {
                        (resolve_texture_path(directory, reference), None)
                    }
                    TextureSource::Embedded { key, bytes } => {
                        (resolve_texture_path(directory, key), Some(&bytes[..]))
                    }
                };

                if let Some(handle) = cache.get(&path) {
                    log::trace!("Texture {} reused for {mesh_name}", path.display());
                    textures.push(Texture { handle, kind, path });
                    continue;
                }
                if failed.contains(&path) {
                    continue;
                }

                let image_source = match embedded {
                    Some(bytes) => ImageSource::Embedded { key: &path, bytes },
                    None => ImageSource::File(&path),
                };
                match self.images.load(image_source) {
                    Ok(image) => {
                        let texture = gpu.create_texture(&image, &path.to_string_lossy())?;
                        let handle = cache.insert(path.clone(), texture);
                        textures.push(Texture { handle, kind, path });
                    }
                    Err(e) => {
                        log::warn!("{e}; mesh {mesh_name} continues without this {kind} texture.");
                        failed.insert(path);
                    }
                }
            }
        }
        Ok(textures)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

/// Mesh indices in depth-first draw order: a node's meshes, then its children.
///
/// Out-of-range references and nodes reached a second time are skipped with a
/// warning.
pub fn mesh_order(scene: &Scene, root: usize) -> Vec<usize> {
    let mut order = Vec::new();
    let mut visited = vec![false; scene.nodes.len()];
    let mut stack = vec![root];

    while let Some(node_index) = stack.pop() {
        let Some(node) = scene.nodes.get(node_index) else {
            log::warn!("Scene references missing node {node_index}.");
            continue;
        };
        if std::mem::replace(&mut visited[node_index], true) {
            log::warn!("Node {node_index} ({}) is reachable twice and is skipped.", node.name);
            continue;
        }

        for &mesh_index in &node.meshes {
            if mesh_index < scene.meshes.len() {
                order.push(mesh_index);
            } else {
                log::warn!("Node {} references missing mesh {mesh_index}.", node.name);
            }
        }
        // Reversed so the first child is popped, and fully walked, first.
        stack.extend(node.children.iter().rev());
    }
    order
}

/// Build the vertex and index sequences of one mesh, or `None` if its geometry
/// is unusable.
fn flatten(name: &str, raw: &RawMesh) -> Option<(Vec<Vertex>, Vec<u32>)> {
    if raw.positions.is_empty() {
        log::error!("Mesh {name} has no vertices and is skipped.");
        return None;
    }
    if !raw.normals.is_empty() && raw.normals.len() != raw.positions.len() {
        log::warn!(
            "Mesh {name} has {} normals for {} positions.",
            raw.normals.len(),
            raw.positions.len()
        );
    }

    let zero_normal = cgmath::Vector3::new(0.0, 0.0, 0.0);
    let origin = cgmath::Vector2::new(0.0, 0.0);
    let vertices: Vec<Vertex> = raw
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let normal = raw.normals.get(i).copied().unwrap_or(zero_normal);
            let tex_coords = raw
                .tex_coords
                .as_ref()
                .and_then(|coords| coords.get(i).copied())
                .unwrap_or(origin);
            Vertex::new(position, normal, tex_coords)
        })
        .collect();

    let non_triangles = raw.faces.iter().filter(|face| face.len() != 3).count();
    if non_triangles > 0 {
        log::warn!("Mesh {name} has {non_triangles} faces that are not triangles.");
    }
    let indices: Vec<u32> = raw.faces.iter().flatten().copied().collect();
    if indices.is_empty() {
        log::error!("Mesh {name} has no faces and is skipped.");
        return None;
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        log::error!(
            "Mesh {name} indexes vertex {bad} but has only {} and is skipped.",
            vertices.len()
        );
        return None;
    }

    Some((vertices, indices))
}

fn unique_kinds(kinds: &[TextureKind]) -> Vec<TextureKind> {
    let mut seen = HashSet::new();
    kinds.iter().copied().filter(|kind| seen.insert(*kind)).collect()
}
