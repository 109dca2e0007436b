#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use flow_mesh::{
    ImportError, ImportFlags,
    resources::import::{Importer, Node, RawMaterial, RawMesh, Scene},
};

static NEXT_FIXTURE: AtomicUsize = AtomicUsize::new(0);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A scratch directory holding one test's assets, removed on drop.
pub struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "flow-mesh-{name}-{}-{}",
            std::process::id(),
            NEXT_FIXTURE.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.join(relative)
    }

    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn write_png(&self, relative: &str, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
            .save(&path)
            .unwrap();
        path
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Hands out a prepared scene for any path.
pub struct StubImporter {
    pub scene: Scene,
}

impl Importer for StubImporter {
    fn import(&self, _path: &Path, _flags: &ImportFlags) -> Result<Scene, ImportError> {
        Ok(self.scene.clone())
    }
}

/// A single triangle facing +z.
pub fn triangle(name: &str, material: Option<usize>) -> RawMesh {
    RawMesh {
        name: name.to_string(),
        positions: vec![
            cgmath::Vector3::new(0.0, 0.0, 0.0),
            cgmath::Vector3::new(1.0, 0.0, 0.0),
            cgmath::Vector3::new(0.0, 1.0, 0.0),
        ],
        normals: vec![cgmath::Vector3::new(0.0, 0.0, 1.0); 3],
        tex_coords: Some(vec![
            cgmath::Vector2::new(0.0, 0.0),
            cgmath::Vector2::new(1.0, 0.0),
            cgmath::Vector2::new(0.0, 1.0),
        ]),
        faces: vec![vec![0, 1, 2]],
        material,
    }
}

pub fn node(name: &str, meshes: &[usize], children: &[usize]) -> Node {
    Node {
        name: name.to_string(),
        meshes: meshes.to_vec(),
        children: children.to_vec(),
    }
}

pub fn material(name: &str, textures: Vec<(flow_mesh::TextureKind, &str)>) -> RawMaterial {
    RawMaterial {
        name: name.to_string(),
        textures: textures
            .into_iter()
            .map(|(kind, path)| {
                (
                    kind,
                    flow_mesh::resources::import::TextureSource::File(path.to_string()),
                )
            })
            .collect(),
    }
}
