//! A compiled shader program as seen by meshes.
//!
//! Compilation and linking belong to the backend; this only carries the
//! program handle and forwards activation and uniform writes by name.

use crate::gpu::Gpu;

pub struct Shader<G: Gpu> {
    program: G::Program,
}

impl<G: Gpu> Shader<G> {
    pub fn new(program: G::Program) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &G::Program {
        &self.program
    }

    /// Make this program current for subsequent draws.
    pub fn use_program(&self, gpu: &mut G) {
        gpu.use_program(&self.program);
    }

    pub fn set_int(&self, gpu: &mut G, name: &str, value: i32) {
        gpu.set_uniform_i32(&self.program, name, value);
    }

    pub fn set_float(&self, gpu: &mut G, name: &str, value: f32) {
        gpu.set_uniform_f32(&self.program, name, value);
    }

    /// Point the sampler uniform `name` at texture unit `unit`.
    pub fn set_sampler(&self, gpu: &mut G, name: &str, unit: u32) {
        gpu.set_uniform_i32(&self.program, name, unit as i32);
    }
}
