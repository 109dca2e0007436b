//! flow-mesh
//!
//! Loads 3D model assets into GPU-ready meshes and draws them. An asset file is
//! imported into a scene graph, flattened depth-first into meshes whose
//! vertices and indices are uploaded once, and every texture its materials
//! reference is decoded and uploaded once per distinct path.
//!
//! High-level modules
//! - `config`: load options, readable from TOML
//! - `context`: the wgpu device backend, with headless and offscreen rendering
//! - `data_structures`: vertices and texture records
//! - `error`: the error types of every fallible operation
//! - `gpu`: the graphics device seam meshes draw through, and a recording device
//! - `pipelines`: the render pipeline and shader used for models
//! - `render`: recorded draws and their replay into a render pass
//! - `resources`: importers, image decoding, the texture cache, meshes and models
//! - `shader`: a program handle with named uniforms
//!

pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod gpu;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod shader;

// Re-exports commonly used types for convenience in downstream code.
pub use config::{ImportFlags, LoadOptions};
pub use context::WgpuContext;
pub use data_structures::{
    texture::{Texture, TextureHandle, TextureKind},
    vertex::Vertex,
};
pub use error::{GpuError, ImportError, LoadError, TextureLoadError};
pub use gpu::{Gpu, trace::TraceGpu};
pub use resources::{Mesh, Model, ModelLoader, TextureCache};
pub use shader::Shader;
