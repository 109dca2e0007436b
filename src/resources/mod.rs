/**
 * Everything between an asset file on disk and drawable GPU meshes.
 *
 * - `import` reads OBJ and glTF files into a GPU-free [`import::Scene`]
 * - `image` decodes the images materials point at
 * - `loader` flattens a scene into meshes and uploads their textures
 * - `texture_cache` keeps one upload per texture path
 * - `mesh` and `model` own the resulting GPU objects and draw them
 */
pub mod image;
pub mod import;
pub mod loader;
pub mod mesh;
pub mod model;
pub mod texture_cache;

pub use loader::ModelLoader;
pub use mesh::Mesh;
pub use model::Model;
pub use texture_cache::TextureCache;
