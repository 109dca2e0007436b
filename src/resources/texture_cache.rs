//! Path-keyed registry of uploaded textures.
//!
//! A cache lives exactly as long as the model it was filled for: the loader
//! creates one per load and hands it to the [`Model`](super::model::Model),
//! which keeps it as the arena its meshes index into. Caches are never shared,
//! so there is no eviction and no locking.

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
};

use crate::{data_structures::texture::TextureHandle, gpu::Gpu};

struct Entry<T> {
    path: PathBuf,
    texture: T,
}

pub struct TextureCache<G: Gpu> {
    entries: Vec<Entry<G::Texture>>,
    by_path: HashMap<PathBuf, TextureHandle>,
}

impl<G: Gpu> TextureCache<G> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    pub fn get(&self, path: &Path) -> Option<TextureHandle> {
        self.by_path.get(path).copied()
    }

    /// Register an uploaded texture under `path`.
    ///
    /// A path is only ever inserted once; inserting it again returns the
    /// existing handle and drops (releases) the redundant upload.
    pub fn insert(&mut self, path: PathBuf, texture: G::Texture) -> TextureHandle {
        if let Some(handle) = self.get(&path) {
            log::warn!("Texture {} was uploaded twice.", path.display());
            return handle;
        }
        let handle = TextureHandle(self.entries.len());
        self.by_path.insert(path.clone(), handle);
        self.entries.push(Entry { path, texture });
        handle
    }

    pub fn resolve(&self, handle: TextureHandle) -> Option<&G::Texture> {
        self.entries.get(handle.0).map(|entry| &entry.texture)
    }

    /// Uploaded paths in upload order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|entry| entry.path.as_path())
    }

    /// Number of uploads, which equals the number of distinct paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<G: Gpu> Default for TextureCache<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a texture reference against the asset directory.
///
/// Backslashes count as separators and `.`/`..` are folded lexically, so the
/// same file spelled two ways maps to one cache key. Absolute references are
/// kept as they are.
pub fn resolve_texture_path(directory: &Path, reference: &str) -> PathBuf {
    let reference = reference.trim().replace('\\', "/");
    let joined = directory.join(reference);

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match resolved.components().next_back() {
                Some(Component::Normal(_)) => {
                    resolved.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => resolved.push(".."),
            },
            other => resolved.push(other),
        }
    }
    resolved
}
