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

//! A recording graphics device and render pass shared by the integration tests.

#![allow(dead_code)]

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use strata_core::geometry::{
    GeometryElement, GeometryPrimitiveType, GeometrySemantic, GeometrySource, SourceLayout,
    VertexData,
};
use strata_core::material::Material;
use strata_core::renderer::api::*;
use strata_core::renderer::{
    CommandEncoder, GraphicsDevice, PipelineError, RenderPass, RenderTarget, ResourceError,
};
use strata_core::Geometry;
use strata_render::DeviceDriver;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The states of a pipeline the device was asked to build.
#[derive(Debug, Clone)]
pub struct RecordedPipeline {
    pub id: Option<RenderPipelineId>,
    pub topology: PrimitiveTopology,
    pub strip_index_format: Option<IndexFormat>,
    pub depth: Option<DepthStencilStateDescriptor>,
    pub blend: Option<BlendStateDescriptor>,
    pub vertex_buffers: usize,
}

#[derive(Debug, Clone)]
pub struct RecordedBuffer {
    pub id: BufferId,
    pub label: String,
    pub size: u64,
    pub usage: BufferUsage,
}

#[derive(Debug, Default)]
struct Records {
    pipelines: Vec<RecordedPipeline>,
    buffers: Vec<RecordedBuffer>,
    destroyed_buffers: Vec<BufferId>,
    textures: Vec<TextureId>,
    destroyed_textures: Vec<TextureId>,
    texture_uploads: usize,
    shader_modules: usize,
}

/// Hands out unique ids and records what it was asked to create.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    next_id: AtomicUsize,
    records: Mutex<Records>,
    failing_topology: Mutex<Option<PrimitiveTopology>>,
}

impl RecordingDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicUsize::new(1),
            ..Default::default()
        })
    }

    /// Makes every pipeline with `topology` fail to build.
    pub fn fail_pipelines_with(&self, topology: PrimitiveTopology) {
        *self.failing_topology.lock().unwrap() = Some(topology);
    }

    pub fn pipelines(&self) -> Vec<RecordedPipeline> {
        self.records.lock().unwrap().pipelines.clone()
    }

    pub fn buffers(&self) -> Vec<RecordedBuffer> {
        self.records.lock().unwrap().buffers.clone()
    }

    pub fn buffers_with_usage(&self, usage: BufferUsage) -> Vec<RecordedBuffer> {
        self.buffers()
            .into_iter()
            .filter(|b| b.usage.contains(usage))
            .collect()
    }

    pub fn destroyed_buffers(&self) -> Vec<BufferId> {
        self.records.lock().unwrap().destroyed_buffers.clone()
    }

    /// Textures in creation order; the driver's fallback comes first.
    pub fn textures(&self) -> Vec<TextureId> {
        self.records.lock().unwrap().textures.clone()
    }

    pub fn destroyed_textures(&self) -> Vec<TextureId> {
        self.records.lock().unwrap().destroyed_textures.clone()
    }

    pub fn texture_uploads(&self) -> usize {
        self.records.lock().unwrap().texture_uploads
    }

    pub fn shader_modules(&self) -> usize {
        self.records.lock().unwrap().shader_modules
    }

    fn next(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn record_buffer(&self, descriptor: &BufferDescriptor) -> BufferId {
        let id = BufferId(self.next());
        self.records.lock().unwrap().buffers.push(RecordedBuffer {
            id,
            label: descriptor
                .label
                .as_deref()
                .unwrap_or_default()
                .to_string(),
            size: descriptor.size,
            usage: descriptor.usage,
        });
        id
    }
}

struct NullEncoder;

impl CommandEncoder for NullEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        _descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPass + 'encoder> {
        Box::new(RecordingPass::default())
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        CommandBufferId(0)
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_shader_module(
        &self,
        _descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        self.records.lock().unwrap().shader_modules += 1;
        Ok(ShaderModuleId(self.next()))
    }

    fn destroy_shader_module(&self, _id: ShaderModuleId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let topology = descriptor.primitive_state.topology;
        let fails = *self.failing_topology.lock().unwrap() == Some(topology);
        let id = (!fails).then(|| RenderPipelineId(self.next()));
        self.records.lock().unwrap().pipelines.push(RecordedPipeline {
            id,
            topology,
            strip_index_format: descriptor.primitive_state.strip_index_format,
            depth: descriptor.depth_stencil_state,
            blend: descriptor.color_target_states.first().and_then(|t| t.blend),
            vertex_buffers: descriptor.vertex_buffers_layout.len(),
        });
        id.ok_or_else(|| {
            ResourceError::Pipeline(PipelineError::CompilationFailed {
                label: descriptor.label.as_deref().map(str::to_string),
                details: format!("{topology:?} rejected"),
            })
        })
    }

    fn destroy_render_pipeline(&self, _id: RenderPipelineId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_pipeline_layout(
        &self,
        _descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        Ok(PipelineLayoutId(self.next()))
    }

    fn destroy_pipeline_layout(&self, _id: PipelineLayoutId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_bind_group_layout(
        &self,
        _descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        Ok(BindGroupLayoutId(self.next()))
    }

    fn destroy_bind_group_layout(&self, _id: BindGroupLayoutId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_bind_group(
        &self,
        _descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        Ok(BindGroupId(self.next()))
    }

    fn destroy_bind_group(&self, _id: BindGroupId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        Ok(self.record_buffer(descriptor))
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        assert_eq!(descriptor.size, data.len() as u64, "buffer size must match data");
        Ok(self.record_buffer(descriptor))
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.records.lock().unwrap().destroyed_buffers.push(id);
        Ok(())
    }

    fn write_buffer(&self, _id: BufferId, _offset: u64, _data: &[u8]) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_texture(&self, _descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next());
        self.records.lock().unwrap().textures.push(id);
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.records.lock().unwrap().destroyed_textures.push(id);
        Ok(())
    }

    fn write_texture(
        &self,
        _texture_id: TextureId,
        _data: &[u8],
        _bytes_per_row: Option<u32>,
        _offset: Origin3D,
        _size: Extent3D,
    ) -> Result<(), ResourceError> {
        self.records.lock().unwrap().texture_uploads += 1;
        Ok(())
    }

    fn create_texture_view(
        &self,
        _texture_id: TextureId,
        _descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        Ok(TextureViewId(self.next()))
    }

    fn destroy_texture_view(&self, _id: TextureViewId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.next()))
    }

    fn destroy_sampler(&self, _id: SamplerId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(NullEncoder)
    }

    fn submit_command_buffer(&self, _command_buffer: CommandBufferId) {}

    fn get_adapter_info(&self) -> RendererAdapterInfo {
        RendererAdapterInfo {
            name: "RecordingDevice".to_string(),
            backend_type: GraphicsBackendType::Unknown,
            device_type: RendererDeviceType::Unknown,
        }
    }
}

/// One recorded pass command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pipeline(RenderPipelineId),
    BindGroup(u32, BindGroupId, Vec<u32>),
    VertexBuffer(u32, BufferId),
    IndexBuffer(BufferId, IndexFormat),
    DrawIndexed(Range<u32>),
    PushDebugGroup(String),
    PopDebugGroup,
}

#[derive(Debug, Default)]
pub struct RecordingPass {
    pub commands: Vec<Command>,
}

impl RecordingPass {
    pub fn draws(&self) -> Vec<Range<u32>> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawIndexed(range) => Some(range.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pipelines(&self) -> Vec<RenderPipelineId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Pipeline(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Offsets bound to `group`, in order.
    pub fn offsets(&self, group: u32) -> Vec<u32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::BindGroup(index, _, offsets) if *index == group => offsets.first().copied(),
                _ => None,
            })
            .collect()
    }

    pub fn bind_groups(&self, group: u32) -> Vec<BindGroupId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::BindGroup(index, id, _) if *index == group => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn debug_labels(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::PushDebugGroup(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RenderPass for RecordingPass {
    fn set_pipeline(&mut self, pipeline: RenderPipelineId) {
        self.commands.push(Command::Pipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupId, offsets: &[u32]) {
        self.commands
            .push(Command::BindGroup(index, bind_group, offsets.to_vec()));
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, _offset: u64) {
        self.commands.push(Command::VertexBuffer(slot, buffer));
    }

    fn set_index_buffer(&mut self, buffer: BufferId, _offset: u64, index_format: IndexFormat) {
        self.commands.push(Command::IndexBuffer(buffer, index_format));
    }

    fn draw_indexed(&mut self, indices: Range<u32>, _base_vertex: i32, _instances: Range<u32>) {
        self.commands.push(Command::DrawIndexed(indices));
    }

    fn push_debug_group(&mut self, label: &str) {
        self.commands.push(Command::PushDebugGroup(label.to_string()));
    }

    fn pop_debug_group(&mut self) {
        self.commands.push(Command::PopDebugGroup);
    }
}

pub fn driver(device: &Arc<RecordingDevice>) -> DeviceDriver {
    DeviceDriver::new(
        device.clone() as Arc<dyn GraphicsDevice>,
        RenderTarget::default(),
        SubstrateSettings::default(),
    )
    .unwrap()
}

/// Four interleaved vertices: position, normal and texture coordinates.
pub fn quad_sources() -> Vec<GeometrySource> {
    #[rustfmt::skip]
    let vertices: [f32; 32] = [
        -1.0, -1.0, 0.0,  0.0, 0.0, 1.0,  0.0, 0.0,
         1.0, -1.0, 0.0,  0.0, 0.0, 1.0,  1.0, 0.0,
         1.0,  1.0, 0.0,  0.0, 0.0, 1.0,  1.0, 1.0,
        -1.0,  1.0, 0.0,  0.0, 0.0, 1.0,  0.0, 1.0,
    ];
    let data = VertexData::from_pod(&vertices);
    vec![
        GeometrySource::new(data.clone(), GeometrySemantic::Vertex, SourceLayout::f32(4, 3, 0, 32)),
        GeometrySource::new(data.clone(), GeometrySemantic::Normal, SourceLayout::f32(4, 3, 12, 32)),
        GeometrySource::new(data, GeometrySemantic::Texcoord, SourceLayout::f32(4, 2, 24, 32)),
    ]
}

pub fn quad_element() -> GeometryElement {
    GeometryElement::from_u16(&[0, 1, 2, 0, 2, 3], GeometryPrimitiveType::Triangle, 2)
}

pub fn named(name: &str) -> Arc<Material> {
    Arc::new(Material::default().with_name(name))
}

pub fn quad(materials: Vec<Arc<Material>>) -> Geometry {
    Geometry::new(quad_sources(), vec![quad_element()], materials)
        .unwrap()
        .with_name("quad")
}
