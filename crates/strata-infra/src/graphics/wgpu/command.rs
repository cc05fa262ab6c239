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

use std::any::Any;
use std::ops::Range;
use strata_core::renderer::{
    BindGroupId, BufferId, CommandBufferId, CommandEncoder, IndexFormat, RenderPass,
    RenderPassDescriptor, RenderPipelineId,
};

use super::conversions::IntoWgpu;
use super::device::WgpuDevice;

/// A render pass recording into a [`WgpuCommandEncoder`].
pub struct WgpuRenderPass<'a> {
    pub(crate) pass: wgpu::RenderPass<'a>,
    pub(crate) device: &'a WgpuDevice,
}

impl RenderPass for WgpuRenderPass<'_> {
    fn set_pipeline(&mut self, pipeline_id: RenderPipelineId) {
        if let Some(pipeline) = self.device.get_wgpu_render_pipeline(pipeline_id) {
            self.pass.set_pipeline(&pipeline);
        } else {
            log::warn!("WgpuRenderPass: RenderPipelineId {pipeline_id:?} not found.");
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group_id: BindGroupId, offsets: &[u32]) {
        if let Some(bind_group) = self.device.get_wgpu_bind_group(bind_group_id) {
            self.pass.set_bind_group(index, bind_group.as_ref(), offsets);
        } else {
            log::warn!("WgpuRenderPass: BindGroupId {bind_group_id:?} not found.");
        }
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer_id: BufferId, offset: u64) {
        if let Some(buffer) = self.device.get_wgpu_buffer(buffer_id) {
            self.pass.set_vertex_buffer(slot, buffer.slice(offset..));
        } else {
            log::warn!("WgpuRenderPass: Vertex BufferId {buffer_id:?} not found.");
        }
    }

    fn set_index_buffer(&mut self, buffer_id: BufferId, offset: u64, index_format: IndexFormat) {
        if let Some(buffer) = self.device.get_wgpu_buffer(buffer_id) {
            self.pass
                .set_index_buffer(buffer.slice(offset..), index_format.into_wgpu());
        } else {
            log::warn!("WgpuRenderPass: Index BufferId {buffer_id:?} not found.");
        }
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.pass.draw_indexed(indices, base_vertex, instances);
    }

    fn push_debug_group(&mut self, label: &str) {
        self.pass.push_debug_group(label);
    }

    fn pop_debug_group(&mut self) {
        self.pass.pop_debug_group();
    }
}

/// Records commands for a [`WgpuDevice`].
pub struct WgpuCommandEncoder {
    pub(crate) encoder: wgpu::CommandEncoder,
    pub(crate) device: WgpuDevice,
}

impl WgpuCommandEncoder {
    /// Provides mutable access to the underlying `wgpu::CommandEncoder`,
    /// for copies and readbacks the abstract encoder does not expose.
    pub fn wgpu_encoder_mut(&mut self) -> &mut wgpu::CommandEncoder {
        &mut self.encoder
    }
}

impl CommandEncoder for WgpuCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPass + 'encoder> {
        // Resolve views first, an attachment whose view is unknown is dropped.
        let mut views = Vec::with_capacity(descriptor.color_attachments.len());
        for attachment in descriptor.color_attachments {
            let Some(view) = self.device.get_wgpu_texture_view(attachment.view) else {
                log::warn!(
                    "WgpuCommandEncoder: color attachment view {:?} not found, skipped.",
                    attachment.view
                );
                continue;
            };
            let resolve = attachment
                .resolve_target
                .and_then(|id| self.device.get_wgpu_texture_view(id));
            views.push((attachment, view, resolve));
        }

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = views
            .iter()
            .map(|(attachment, view, resolve)| {
                Some(wgpu::RenderPassColorAttachment {
                    view: view.as_ref(),
                    depth_slice: None,
                    resolve_target: resolve.as_deref(),
                    ops: wgpu::Operations {
                        load: attachment.ops.load.into_wgpu(),
                        store: attachment.ops.store.into_wgpu(),
                    },
                })
            })
            .collect();

        let depth = descriptor.depth_stencil_attachment.and_then(|ds| {
            let view = self.device.get_wgpu_texture_view(ds.view);
            if view.is_none() {
                log::warn!("WgpuCommandEncoder: depth view {:?} not found, skipped.", ds.view);
            }
            view.map(|view| (ds, view))
        });
        let depth_stencil_attachment =
            depth
                .as_ref()
                .map(|(ds, view)| wgpu::RenderPassDepthStencilAttachment {
                    view: view.as_ref(),
                    depth_ops: ds.depth_ops.map(|ops| wgpu::Operations {
                        load: ops.load.into_wgpu(),
                        store: ops.store.into_wgpu(),
                    }),
                    stencil_ops: None,
                });

        let pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: descriptor.label,
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            ..Default::default()
        });

        Box::new(WgpuRenderPass {
            pass,
            device: &self.device,
        })
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let Self { encoder, device } = *self;
        device.register_command_buffer(encoder.finish())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
