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

//! Test doubles for the rendering traits.

use crate::geometry::Geometry;
use crate::material::{LightingModel, Material};
use crate::renderer::api::*;
use crate::renderer::context::{EyeType, RenderContext};
use crate::renderer::error::{RenderError, ResourceError, SubstrateError};
use crate::renderer::light::Light;
use crate::renderer::traits::{
    CommandEncoder, Driver, DriverId, ElementDraw, GeometrySubstrate, GraphicsDevice,
    MaterialSubstrate, RenderPass,
};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A mock graphics device that produces unique resource IDs and counts calls.
#[derive(Debug)]
pub(crate) struct MockGraphicsDevice {
    next_id: AtomicUsize,
    buffer_sizes: Mutex<Vec<u64>>,
    buffer_writes: AtomicUsize,
    destroyed_buffers: AtomicUsize,
}

impl MockGraphicsDevice {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            buffer_sizes: Mutex::new(Vec::new()),
            buffer_writes: AtomicUsize::new(0),
            destroyed_buffers: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn buffer_sizes(&self) -> Vec<u64> {
        self.buffer_sizes.lock().unwrap().clone()
    }

    pub(crate) fn buffer_write_count(&self) -> usize {
        self.buffer_writes.load(Ordering::Relaxed)
    }

    pub(crate) fn destroyed_buffer_count(&self) -> usize {
        self.destroyed_buffers.load(Ordering::Relaxed)
    }
}

struct MockCommandEncoder;

impl CommandEncoder for MockCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        _descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPass + 'encoder> {
        Box::new(MockRenderPass::default())
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        CommandBufferId(0)
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_shader_module(
        &self,
        _d: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        Ok(ShaderModuleId(self.next()))
    }
    fn destroy_shader_module(&self, _id: ShaderModuleId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_render_pipeline(
        &self,
        _d: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        Ok(RenderPipelineId(self.next()))
    }
    fn destroy_render_pipeline(&self, _id: RenderPipelineId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_pipeline_layout(
        &self,
        _d: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        Ok(PipelineLayoutId(self.next()))
    }
    fn destroy_pipeline_layout(&self, _id: PipelineLayoutId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_bind_group_layout(
        &self,
        _d: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        Ok(BindGroupLayoutId(self.next()))
    }
    fn destroy_bind_group_layout(&self, _id: BindGroupLayoutId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_bind_group(&self, _d: &BindGroupDescriptor) -> Result<BindGroupId, ResourceError> {
        Ok(BindGroupId(self.next()))
    }
    fn destroy_bind_group(&self, _id: BindGroupId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_buffer(&self, d: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.buffer_sizes.lock().unwrap().push(d.size);
        Ok(BufferId(self.next()))
    }
    fn create_buffer_with_data(
        &self,
        d: &BufferDescriptor,
        _data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        self.create_buffer(d)
    }
    fn destroy_buffer(&self, _id: BufferId) -> Result<(), ResourceError> {
        self.destroyed_buffers.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
    fn write_buffer(&self, _id: BufferId, _offset: u64, _data: &[u8]) -> Result<(), ResourceError> {
        self.buffer_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
    fn create_texture(&self, _d: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        Ok(TextureId(self.next()))
    }
    fn destroy_texture(&self, _id: TextureId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn write_texture(
        &self,
        _id: TextureId,
        _data: &[u8],
        _bpr: Option<u32>,
        _offset: Origin3D,
        _size: Extent3D,
    ) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_texture_view(
        &self,
        _id: TextureId,
        _d: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        Ok(TextureViewId(self.next()))
    }
    fn destroy_texture_view(&self, _id: TextureViewId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_sampler(&self, _d: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.next()))
    }
    fn destroy_sampler(&self, _id: SamplerId) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(MockCommandEncoder)
    }
    fn submit_command_buffer(&self, _cb: CommandBufferId) {}
    fn get_adapter_info(&self) -> RendererAdapterInfo {
        RendererAdapterInfo {
            name: "MockDevice".to_string(),
            backend_type: GraphicsBackendType::Unknown,
            device_type: RendererDeviceType::Unknown,
        }
    }
}

/// A render pass that records indexed draws as `(index range, label of the open debug group)`.
#[derive(Debug, Default)]
pub(crate) struct MockRenderPass {
    pub(crate) draws: Vec<Range<u32>>,
    pub(crate) groups: Vec<String>,
}

impl RenderPass for MockRenderPass {
    fn set_pipeline(&mut self, _p: RenderPipelineId) {}
    fn set_bind_group(&mut self, _i: u32, _bg: BindGroupId, _o: &[u32]) {}
    fn set_vertex_buffer(&mut self, _s: u32, _b: BufferId, _o: u64) {}
    fn set_index_buffer(&mut self, _b: BufferId, _o: u64, _f: IndexFormat) {}
    fn draw_indexed(&mut self, indices: Range<u32>, _bv: i32, _i: Range<u32>) {
        self.draws.push(indices);
    }
    fn push_debug_group(&mut self, label: &str) {
        self.groups.push(label.to_string());
    }
    fn pop_debug_group(&mut self) {}
}

/// A driver whose substrates draw each element once with its index count
/// and count how often they were created.
#[derive(Debug, Default)]
pub(crate) struct MockDriver {
    pub(crate) id: Option<DriverId>,
    pub(crate) geometry_substrates: AtomicUsize,
    pub(crate) material_substrates: AtomicUsize,
    pub(crate) fail_elements: Vec<usize>,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        Self {
            id: Some(DriverId::unique()),
            ..Default::default()
        }
    }

    pub(crate) fn geometry_substrate_count(&self) -> usize {
        self.geometry_substrates.load(Ordering::Relaxed)
    }

    pub(crate) fn material_substrate_count(&self) -> usize {
        self.material_substrates.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct MockGeometrySubstrate {
    index_counts: Vec<u32>,
    fail_elements: Vec<usize>,
}

impl GeometrySubstrate for MockGeometrySubstrate {
    fn render(
        &mut self,
        draw: &ElementDraw<'_>,
        _context: &RenderContext,
        pass: &mut dyn RenderPass,
        _driver: &dyn Driver,
    ) -> Result<(), RenderError> {
        if self.fail_elements.contains(&draw.element_index) {
            return Err(RenderError::RenderingFailed(format!(
                "element {} failed",
                draw.element_index
            )));
        }
        pass.push_debug_group(draw.material.name());
        pass.draw_indexed(0..self.index_counts[draw.element_index], 0, 0..1);
        pass.pop_debug_group();
        Ok(())
    }
}

#[derive(Debug)]
struct MockMaterialSubstrate {
    model: LightingModel,
}

impl MaterialSubstrate for MockMaterialSubstrate {
    fn lighting_model(&self) -> LightingModel {
        self.model
    }
    fn vertex_program(&self) -> ShaderFunction {
        ShaderFunction::new(ShaderModuleId(1), "vs_main")
    }
    fn fragment_program(&self) -> ShaderFunction {
        ShaderFunction::new(ShaderModuleId(1), "fs_main")
    }
    fn bind_material_uniforms(
        &self,
        _material: &Material,
        _opacity: f32,
        _eye: EyeType,
        _frame: u64,
    ) -> Result<UniformBinding, ResourceError> {
        Ok(UniformBinding {
            bind_group: BindGroupId(1),
            offset: 0,
        })
    }
    fn bind_lighting_uniforms(
        &self,
        _lights: &[Light],
        _eye: EyeType,
        _frame: u64,
    ) -> Result<UniformBinding, ResourceError> {
        Ok(UniformBinding {
            bind_group: BindGroupId(2),
            offset: 0,
        })
    }
    fn textures(&self) -> &[TextureViewId] {
        &[]
    }
    fn texture_bind_group(&self) -> BindGroupId {
        BindGroupId(3)
    }
}

impl Driver for MockDriver {
    fn id(&self) -> DriverId {
        self.id.unwrap_or(DriverId(0))
    }

    fn new_geometry_substrate(
        &self,
        geometry: &Geometry,
    ) -> Result<Box<dyn GeometrySubstrate>, SubstrateError> {
        self.geometry_substrates.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MockGeometrySubstrate {
            index_counts: geometry
                .get_geometry_elements()
                .iter()
                .map(|e| e.index_count() as u32)
                .collect(),
            fail_elements: self.fail_elements.clone(),
        }))
    }

    fn new_material_substrate(
        &self,
        material: &Material,
    ) -> Result<Arc<dyn MaterialSubstrate>, SubstrateError> {
        self.material_substrates.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(MockMaterialSubstrate {
            model: material.lighting_model(),
        }))
    }
}
