//! Scene importers.
//!
//! An importer turns an asset file into a [`Scene`]: a node graph referencing
//! meshes by index, the raw meshes themselves and their materials. Nothing in
//! a `Scene` touches the GPU yet.
//!
//! - `obj` reads Wavefront OBJ/MTL through tobj
//! - `gltf` reads glTF 2.0 (`.gltf` and `.glb`)
//!
//! [`SceneImporter`] picks one by file extension.

pub mod gltf;
pub mod obj;

use std::{path::Path, sync::Arc};

use crate::{config::ImportFlags, data_structures::texture::TextureKind, error::ImportError};

/// One node of the imported hierarchy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub name: String,
    /// Indices into [`Scene::meshes`], in importer order.
    pub meshes: Vec<usize>,
    /// Indices into [`Scene::nodes`], in importer order.
    pub children: Vec<usize>,
}

/// Geometry as delivered by the importer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMesh {
    pub name: String,
    pub positions: Vec<cgmath::Vector3<f32>>,
    /// Either empty or one normal per position.
    pub normals: Vec<cgmath::Vector3<f32>>,
    /// First texture coordinate channel, if the mesh has one.
    pub tex_coords: Option<Vec<cgmath::Vector2<f32>>>,
    /// Index lists per face; triangles when triangulation was requested.
    pub faces: Vec<Vec<u32>>,
    pub material: Option<usize>,
}

/// Where a material slot's image lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureSource {
    /// A path as written in the asset, usually relative to it.
    File(String),
    /// Encoded image bytes stored inside the asset.
    Embedded { key: String, bytes: Arc<[u8]> },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawMaterial {
    pub name: String,
    /// Texture slots in material order.
    pub textures: Vec<(TextureKind, TextureSource)>,
}

impl RawMaterial {
    pub fn textures_of(&self, kind: TextureKind) -> impl Iterator<Item = &TextureSource> {
        self.textures
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, source)| source)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub nodes: Vec<Node>,
    pub root: Option<usize>,
    pub meshes: Vec<RawMesh>,
    pub materials: Vec<RawMaterial>,
}

/// The asset import collaborator.
pub trait Importer {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<Scene, ImportError>;
}

/// Chooses the importer from the file extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneImporter;

impl Importer for SceneImporter {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<Scene, ImportError> {
        if !path.is_file() {
            return Err(ImportError::NotFound(path.to_path_buf()));
        }
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "obj" => self::obj::ObjImporter.import(path, flags),
            "gltf" | "glb" => self::gltf::GltfImporter.import(path, flags),
            _ => Err(ImportError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Apply the UV flip policy to one texture coordinate.
pub(crate) fn flip_uv(uv: cgmath::Vector2<f32>, flags: &ImportFlags) -> cgmath::Vector2<f32> {
    if flags.flip_uvs {
        cgmath::Vector2::new(uv.x, 1.0 - uv.y)
    } else {
        uv
    }
}
