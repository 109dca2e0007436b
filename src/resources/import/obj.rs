use std::path::Path;

use super::{Importer, Node, RawMaterial, RawMesh, Scene, TextureSource, flip_uv};
use crate::{config::ImportFlags, data_structures::texture::TextureKind, error::ImportError};

/**
 * Wavefront OBJ importer.
 *
 * OBJ has no hierarchy, so the scene is a single root node that lists every
 * object of the file as a mesh, in file order.
 */
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjImporter;

impl Importer for ObjImporter {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<Scene, ImportError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: flags.triangulate,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| ImportError::Obj {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = match materials {
            Ok(materials) => materials.into_iter().map(to_material).collect(),
            Err(e) => {
                log::warn!(
                    "Materials of {} could not be loaded ({e}), meshes stay untextured.",
                    path.display()
                );
                Vec::new()
            }
        };

        let meshes: Vec<RawMesh> = models.iter().map(|m| to_mesh(m, flags)).collect();
        let root = Node {
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            meshes: (0..meshes.len()).collect(),
            children: Vec::new(),
        };

        Ok(Scene {
            nodes: vec![root],
            root: Some(0),
            meshes,
            materials,
        })
    }
}

fn to_mesh(model: &tobj::Model, flags: &ImportFlags) -> RawMesh {
    let mesh = &model.mesh;
    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| cgmath::Vector3::new(p[0], p[1], p[2]))
        .collect::<Vec<_>>();
    let normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| cgmath::Vector3::new(n[0], n[1], n[2]))
        .collect();
    let tex_coords = (!mesh.texcoords.is_empty()).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| flip_uv(cgmath::Vector2::new(t[0], t[1]), flags))
            .collect()
    });

    // An empty arity list means every face is a triangle.
    let faces = if mesh.face_arities.is_empty() {
        mesh.indices.chunks(3).map(<[u32]>::to_vec).collect()
    } else {
        let mut start = 0;
        mesh.face_arities
            .iter()
            .map(|&arity| {
                let end = (start + arity as usize).min(mesh.indices.len());
                let face = mesh.indices[start..end].to_vec();
                start = end;
                face
            })
            .collect()
    };

    RawMesh {
        name: model.name.clone(),
        positions,
        normals,
        tex_coords,
        faces,
        material: mesh.material_id,
    }
}

fn to_material(material: tobj::Material) -> RawMaterial {
    let mut textures = Vec::new();
    let mut push = |kind, texture: Option<String>| {
        if let Some(texture) = texture.filter(|t| !t.trim().is_empty()) {
            textures.push((kind, TextureSource::File(texture)));
        }
    };
    push(TextureKind::Diffuse, material.diffuse_texture);
    push(TextureKind::Specular, material.specular_texture);
    push(TextureKind::Normal, material.normal_texture);
    // tobj keeps displacement maps among the unparsed statements
    push(TextureKind::Height, material.unknown_param.get("disp").cloned());

    RawMaterial {
        name: material.name,
        textures,
    }
}
