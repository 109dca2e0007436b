//! Load options.
//!
//! Every policy the loader applies is spelled out here instead of being baked
//! into the importers. Options can be built in code or read from TOML:
//!
//! ```toml
//! texture_kinds = ["diffuse", "specular", "normal"]
//! flip_images = false
//!
//! [import]
//! triangulate = true
//! flip_uvs = true
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::{data_structures::texture::TextureKind, error::ConfigError};

/// Post-processing requested from the importer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImportFlags {
    /// Split polygons into triangles (and strips/fans into lists).
    pub triangulate: bool,
    /// Replace every texture coordinate `v` with `1 - v`.
    pub flip_uvs: bool,
}

impl Default for ImportFlags {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub import: ImportFlags,
    /// Material slots that are resolved, in this order. The order decides texture
    /// unit assignment at draw time.
    pub texture_kinds: Vec<TextureKind>,
    /// Flip decoded images vertically before upload.
    pub flip_images: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            import: ImportFlags::default(),
            texture_kinds: vec![TextureKind::Diffuse, TextureKind::Specular],
            flip_images: false,
        }
    }
}

impl LoadOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
