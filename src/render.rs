//! Recorded draws and their replay into a render pass.
//!
//! The wgpu backend cannot issue a draw the moment [`Gpu::draw_elements`] is
//! called: a render pass borrows its target and lives only as long as one
//! frame. Instead, every draw call is captured as a [`DrawCommand`] holding the
//! pipeline, the bind group built from the texture units bound at that moment
//! and the mesh buffers. [`replay`] then encodes the commands in call order
//! inside a pass the context opens on the target.
//!
//! [`Gpu::draw_elements`]: crate::gpu::Gpu::draw_elements

use wgpu::RenderPass;

/// One indexed draw captured from the device state at call time.
#[derive(Clone, Debug)]
pub struct DrawCommand {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group: wgpu::BindGroup,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_format: wgpu::IndexFormat,
    pub index_count: u32,
}

/// Encode `commands` into `render_pass` in the order they were recorded.
pub fn replay(commands: &[DrawCommand], render_pass: &mut RenderPass<'_>) {
    for command in commands {
        if command.index_count == 0 {
            log::warn!("you attempted to draw a mesh with zero indices");
            continue;
        }
        render_pass.set_pipeline(&command.pipeline);
        render_pass.set_bind_group(0, &command.bind_group, &[]);
        render_pass.set_vertex_buffer(0, command.vertex_buffer.slice(..));
        render_pass.set_index_buffer(command.index_buffer.slice(..), command.index_format);
        render_pass.draw_indexed(0..command.index_count, 0, 0..1);
    }
}
