// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Traits for recording GPU commands.

use crate::renderer::api::command::{BindGroupId, CommandBufferId, RenderPassDescriptor};
use crate::renderer::api::pipeline::RenderPipelineId;
use crate::renderer::api::resource::BufferId;
use crate::renderer::api::util::IndexFormat;
use std::any::Any;
use std::ops::Range;

/// An active render pass. Commands are recorded in call order.
///
/// Resources are passed by id; the backend resolves them when recording.
pub trait RenderPass {
    /// Sets the pipeline used by subsequent draws.
    fn set_pipeline(&mut self, pipeline: RenderPipelineId);

    /// Binds a bind group at `index`, with one dynamic offset per dynamic binding.
    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupId, offsets: &[u32]);

    /// Binds a vertex buffer at `slot`.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64);

    /// Binds the index buffer.
    fn set_index_buffer(&mut self, buffer: BufferId, offset: u64, index_format: IndexFormat);

    /// Draws indexed primitives.
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);

    /// Opens a labelled group of commands for GPU debuggers.
    fn push_debug_group(&mut self, label: &str);

    /// Closes the innermost debug group.
    fn pop_debug_group(&mut self);
}

/// Records passes into a command buffer.
pub trait CommandEncoder {
    /// Begins a render pass. The pass borrows the encoder until dropped.
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPass + 'encoder>;

    /// Finishes recording and returns the command buffer to submit.
    fn finish(self: Box<Self>) -> CommandBufferId;

    /// Downcasting access for backend-specific operations.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
