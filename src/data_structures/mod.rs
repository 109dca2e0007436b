//! Engine data structures shared by loaders and backends.
//!
//! - `vertex` holds the interleaved vertex format every mesh uses
//! - `texture` holds texture kinds, per-mesh texture records and the wgpu texture wrapper

pub mod texture;
pub mod vertex;
