use std::{path::Path, sync::Arc};

use ::gltf::mesh::Mode;

use super::{Importer, Node, RawMaterial, RawMesh, Scene, TextureSource, flip_uv};
use crate::{config::ImportFlags, data_structures::texture::TextureKind, error::ImportError};

/**
 * glTF 2.0 importer for `.gltf` and `.glb` files.
 *
 * The default scene (or the first one) hangs below a synthetic root node, so
 * node `i` of the file becomes node `i + 1` of the [`Scene`]. Every primitive
 * is a mesh of its own; a glTF mesh with two primitives contributes two
 * consecutive mesh indices to the node that references it.
 */
#[derive(Clone, Copy, Debug, Default)]
pub struct GltfImporter;

impl Importer for GltfImporter {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<Scene, ImportError> {
        let gltf_error = |source| ImportError::Gltf {
            path: path.to_path_buf(),
            source,
        };
        let ::gltf::Gltf { document, blob } = ::gltf::Gltf::open(path).map_err(gltf_error)?;
        let buffers =
            ::gltf::import_buffers(&document, path.parent(), blob).map_err(gltf_error)?;
        let buffer_data = |buffer: ::gltf::Buffer| {
            buffers
                .get(buffer.index())
                .map(|data| data.0.as_slice())
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Mesh indices of each glTF mesh, one per usable primitive.
        let mut meshes = Vec::new();
        let mut primitives_of_mesh = Vec::new();
        for mesh in document.meshes() {
            let mut indices = Vec::new();
            for primitive in mesh.primitives() {
                let name = match mesh.name() {
                    Some(name) => format!("{name}.{}", primitive.index()),
                    None => format!("mesh{}.{}", mesh.index(), primitive.index()),
                };
                match to_mesh(&primitive, name, flags, &buffer_data) {
                    Some(raw) => {
                        indices.push(meshes.len());
                        meshes.push(raw);
                    }
                    None => continue,
                }
            }
            primitives_of_mesh.push(indices);
        }

        let materials = document
            .materials()
            .map(|material| to_material(&material, &file_name, &buffer_data))
            .collect();

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| ImportError::NoRootNode(path.to_path_buf()))?;

        let mut nodes = Vec::with_capacity(document.nodes().len() + 1);
        nodes.push(Node {
            name: scene.name().unwrap_or(&file_name).to_string(),
            meshes: Vec::new(),
            children: scene.nodes().map(|node| node.index() + 1).collect(),
        });
        for node in document.nodes() {
            nodes.push(Node {
                name: node.name().unwrap_or_default().to_string(),
                meshes: node
                    .mesh()
                    .and_then(|mesh| primitives_of_mesh.get(mesh.index()).cloned())
                    .unwrap_or_default(),
                children: node.children().map(|child| child.index() + 1).collect(),
            });
        }

        Ok(Scene {
            nodes,
            root: Some(0),
            meshes,
            materials,
        })
    }
}

fn to_mesh<'a, 's, F>(
    primitive: &'a ::gltf::Primitive<'a>,
    name: String,
    flags: &ImportFlags,
    buffer_data: &F,
) -> Option<RawMesh>
where
    F: Clone + Fn(::gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let reader = primitive.reader(buffer_data.clone());

    let Some(positions) = reader.read_positions() else {
        log::warn!("Primitive {name} has no positions and is skipped.");
        return None;
    };
    let positions: Vec<cgmath::Vector3<f32>> = positions.map(Into::into).collect();
    let normals = reader
        .read_normals()
        .map(|normals| normals.map(Into::into).collect())
        .unwrap_or_default();
    let tex_coords = reader.read_tex_coords(0).map(|coords| {
        coords
            .into_f32()
            .map(|uv| flip_uv(uv.into(), flags))
            .collect()
    });

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = match (primitive.mode(), flags.triangulate) {
        (Mode::Triangles, _) => indices.chunks(3).map(<[u32]>::to_vec).collect(),
        (Mode::TriangleStrip, true) => strip_to_triangles(&indices),
        (Mode::TriangleFan, true) => fan_to_triangles(&indices),
        (Mode::TriangleStrip | Mode::TriangleFan, false) => vec![indices],
        (mode, _) => {
            log::warn!("Primitive {name} uses {mode:?} topology and is skipped.");
            return None;
        }
    };

    Some(RawMesh {
        name,
        positions,
        normals,
        tex_coords,
        faces,
        material: primitive.material().index(),
    })
}

fn strip_to_triangles(indices: &[u32]) -> Vec<Vec<u32>> {
    indices
        .windows(3)
        .enumerate()
        .map(|(i, w)| {
            // keep the winding of every other triangle consistent
            if i % 2 == 0 {
                vec![w[0], w[1], w[2]]
            } else {
                vec![w[1], w[0], w[2]]
            }
        })
        .collect()
}

fn fan_to_triangles(indices: &[u32]) -> Vec<Vec<u32>> {
    match indices.split_first() {
        Some((&center, rest)) => rest
            .windows(2)
            .map(|w| vec![center, w[0], w[1]])
            .collect(),
        None => Vec::new(),
    }
}

fn to_material<'a, 's, F>(
    material: &::gltf::Material<'a>,
    file_name: &str,
    buffer_data: &F,
) -> RawMaterial
where
    F: Fn(::gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let mut textures = Vec::new();
    if let Some(info) = material.pbr_metallic_roughness().base_color_texture() {
        if let Some(source) = to_source(&info.texture(), file_name, buffer_data) {
            textures.push((TextureKind::Diffuse, source));
        }
    }
    if let Some(normal) = material.normal_texture() {
        if let Some(source) = to_source(&normal.texture(), file_name, buffer_data) {
            textures.push((TextureKind::Normal, source));
        }
    }
    RawMaterial {
        name: material.name().unwrap_or_default().to_string(),
        textures,
    }
}

fn to_source<'a, 's, F>(
    texture: &::gltf::Texture<'a>,
    file_name: &str,
    buffer_data: &F,
) -> Option<TextureSource>
where
    F: Fn(::gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let image = texture.source();
    match image.source() {
        ::gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
            log::warn!("Image {} is a data URI, which is not supported.", image.index());
            None
        }
        ::gltf::image::Source::Uri { uri, .. } => Some(TextureSource::File(decode_uri(uri))),
        ::gltf::image::Source::View { view, .. } => {
            let data = buffer_data(view.buffer())?;
            let bytes = data.get(view.offset()..view.offset() + view.length())?;
            Some(TextureSource::Embedded {
                key: format!("{file_name}#image{}", image.index()),
                bytes: Arc::from(bytes),
            })
        }
    }
}

/// Relative glTF URIs are percent-encoded (`my%20tex.png`).
fn decode_uri(uri: &str) -> String {
    match urlencoding::decode(uri) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            log::warn!("Image URI {uri} is not valid percent-encoded UTF-8 ({e}); using it as is.");
            uri.to_string()
        }
    }
}
