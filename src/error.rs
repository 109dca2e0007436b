//! Error types for model loading and GPU resource management.
//!
//! Failures fall into two groups:
//!
//! - fatal ones abort a load and surface as [`LoadError`]: the importer could not
//!   produce a scene ([`ImportError`]) or the device refused an allocation ([`GpuError`])
//! - recoverable ones are logged and skipped: a texture that cannot be read or
//!   decoded ([`TextureLoadError`]) simply leaves its slot empty

use std::path::PathBuf;

use thiserror::Error;

/// The importer could not turn an asset file into a scene.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("asset file not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported asset format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to parse OBJ file {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to parse glTF file {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("scene in {0} has no root node")]
    NoRootNode(PathBuf),

    #[error("scene in {0} has no meshes to draw")]
    NoMeshes(PathBuf),
}

/// A texture referenced by a material could not be loaded.
///
/// Never fatal: the loader logs it and continues without that texture.
#[derive(Error, Debug)]
pub enum TextureLoadError {
    #[error("texture file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read texture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported texture source {0}")]
    UnsupportedSource(String),
}

/// The graphics device rejected an operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    #[error("out of GPU memory while allocating {0}")]
    OutOfMemory(String),

    #[error("texture '{0}' has zero extent")]
    EmptyTexture(String),

    #[error("texture '{label}' is {width}x{height}, device maximum is {max}")]
    TextureTooLarge {
        label: String,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("mesh '{mesh}' needs {requested} texture units, device supports {available}")]
    TextureUnitsExceeded {
        mesh: String,
        requested: usize,
        available: u32,
    },

    #[error("mesh '{mesh}' references texture {index} which is not owned by its model")]
    DanglingTexture { mesh: String, index: usize },

    #[error("draw issued without an active program")]
    NoProgram,

    #[error("draw issued without a bound vertex array")]
    NoVertexArray,

    #[error("no usable graphics device: {0}")]
    Unavailable(String),

    #[error("failed to read back rendered image: {0}")]
    Readback(String),
}

/// A fatal model load failure. No partially constructed model is ever returned.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Load options could not be read.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid load options: {0}")]
    Parse(#[from] toml::de::Error),
}
