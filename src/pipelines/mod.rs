//! Render pipelines used by the wgpu backend.
pub mod basic;
