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

use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use wgpu::util::DeviceExt;

use strata_core::renderer::{
    BindGroupDescriptor, BindGroupId, BindGroupLayoutDescriptor, BindGroupLayoutId,
    BindingResource, BindingType, BufferBindingType, BufferDescriptor, BufferId, CommandBufferId,
    CommandEncoder, Extent3D, GraphicsBackendType, GraphicsDevice, Origin3D, PipelineError,
    PipelineLayoutDescriptor, PipelineLayoutId, RenderPipelineDescriptor, RenderPipelineId,
    RenderTarget, RendererAdapterInfo, RendererDeviceType, ResourceError, SamplerDescriptor,
    SamplerId, ShaderError, ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData,
    TextureDescriptor, TextureDimension, TextureId, TextureUsage, TextureViewDescriptor,
    TextureViewId,
};

use super::command::WgpuCommandEncoder;
use super::context::WgpuGraphicsContext;
use super::conversions::IntoWgpu;

#[derive(Debug)]
pub(crate) struct WgpuBufferEntry {
    pub(crate) wgpu_buffer: Arc<wgpu::Buffer>,
    pub(crate) size: u64, // To track VRAM accurately on destruction
}

#[derive(Debug)]
pub(crate) struct WgpuTextureEntry {
    pub(crate) wgpu_texture: Arc<wgpu::Texture>,
    pub(crate) size: u64,
}

/// The internal, non-clonable state of the WgpuDevice.
/// This struct holds all the GPU resources and state, protected by an Arc.
#[derive(Debug)]
pub struct WgpuDeviceInternal {
    context: WgpuGraphicsContext,
    shader_modules: Mutex<HashMap<ShaderModuleId, Arc<wgpu::ShaderModule>>>,
    pipelines: Mutex<HashMap<RenderPipelineId, Arc<wgpu::RenderPipeline>>>,
    pipeline_layouts: Mutex<HashMap<PipelineLayoutId, Arc<wgpu::PipelineLayout>>>,
    bind_group_layouts: Mutex<HashMap<BindGroupLayoutId, Arc<wgpu::BindGroupLayout>>>,
    bind_groups: Mutex<HashMap<BindGroupId, Arc<wgpu::BindGroup>>>,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    texture_views: Mutex<HashMap<TextureViewId, Arc<wgpu::TextureView>>>,
    samplers: Mutex<HashMap<SamplerId, Arc<wgpu::Sampler>>>,

    next_id: AtomicUsize,

    // VRAM Tracking
    vram_allocated_bytes: AtomicUsize,
    vram_peak_bytes: AtomicUsize,

    /// Command buffers that have been finished but not yet submitted.
    pending_command_buffers: Mutex<HashMap<CommandBufferId, wgpu::CommandBuffer>>,
}

/// A clonable, thread-safe handle to the WGPU graphics device.
/// It wraps the actual device state (`WgpuDeviceInternal`) in an Arc,
/// allowing it to be shared across threads and with command encoders.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

/// An offscreen color target with its optional depth attachment.
#[derive(Debug, Clone, Copy)]
pub struct RenderTargetViews {
    pub color_texture: TextureId,
    pub color: TextureViewId,
    pub depth_texture: Option<TextureId>,
    pub depth: Option<TextureViewId>,
}

impl RenderTargetViews {
    /// Releases the textures and views of the target.
    pub fn destroy(&self, device: &dyn GraphicsDevice) {
        let results = [
            device.destroy_texture_view(self.color),
            device.destroy_texture(self.color_texture),
            self.depth.map_or(Ok(()), |view| device.destroy_texture_view(view)),
            self.depth_texture
                .map_or(Ok(()), |texture| device.destroy_texture(texture)),
        ];
        for e in results.into_iter().filter_map(Result::err) {
            log::warn!("RenderTargetViews: failed to release attachment: {e}");
        }
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned ({what}): {e}")))
}

fn lookup<K: Eq + Hash, V: Clone>(map: &Mutex<HashMap<K, V>>, id: &K) -> Option<V> {
    map.lock().ok().and_then(|guard| guard.get(id).cloned())
}

fn remove<K: Eq + Hash, V>(map: &Mutex<HashMap<K, V>>, id: &K, what: &str) -> Result<V, ResourceError> {
    lock(map, what)?.remove(id).ok_or(ResourceError::NotFound)
}

impl WgpuDevice {
    pub fn new(context: WgpuGraphicsContext) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context,
                shader_modules: Mutex::new(HashMap::new()),
                pipelines: Mutex::new(HashMap::new()),
                pipeline_layouts: Mutex::new(HashMap::new()),
                bind_group_layouts: Mutex::new(HashMap::new()),
                bind_groups: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                texture_views: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                next_id: AtomicUsize::new(1),
                vram_allocated_bytes: AtomicUsize::new(0),
                vram_peak_bytes: AtomicUsize::new(0),
                pending_command_buffers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The context this device draws with.
    pub fn context(&self) -> &WgpuGraphicsContext {
        &self.internal.context
    }

    fn wgpu_device(&self) -> &wgpu::Device {
        &self.internal.context.device
    }

    fn next_id(&self) -> usize {
        self.internal.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn track_allocation(&self, bytes: u64) {
        let current = self
            .internal
            .vram_allocated_bytes
            .fetch_add(bytes as usize, Ordering::Relaxed)
            + bytes as usize;
        self.internal
            .vram_peak_bytes
            .fetch_max(current, Ordering::Relaxed);
    }

    fn track_release(&self, bytes: u64) {
        self.internal
            .vram_allocated_bytes
            .fetch_sub(bytes as usize, Ordering::Relaxed);
    }

    /// Bytes currently held by buffers and textures.
    pub fn vram_allocated_bytes(&self) -> usize {
        self.internal.vram_allocated_bytes.load(Ordering::Relaxed)
    }

    /// The highest value [`WgpuDevice::vram_allocated_bytes`] has reached.
    pub fn vram_peak_bytes(&self) -> usize {
        self.internal.vram_peak_bytes.load(Ordering::Relaxed)
    }

    /// Runs `operation` inside a validation error scope and returns the
    /// captured error, if any.
    fn with_validation<R>(&self, operation: impl FnOnce(&wgpu::Device) -> R) -> (R, Option<wgpu::Error>) {
        let device = self.wgpu_device();
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = operation(device);
        let error = pollster::block_on(device.pop_error_scope());
        (result, error)
    }

    pub(crate) fn get_wgpu_render_pipeline(&self, id: RenderPipelineId) -> Option<Arc<wgpu::RenderPipeline>> {
        lookup(&self.internal.pipelines, &id)
    }

    pub(crate) fn get_wgpu_bind_group(&self, id: BindGroupId) -> Option<Arc<wgpu::BindGroup>> {
        lookup(&self.internal.bind_groups, &id)
    }

    pub(crate) fn get_wgpu_buffer(&self, id: BufferId) -> Option<Arc<wgpu::Buffer>> {
        self.internal
            .buffers
            .lock()
            .ok()
            .and_then(|buffers| buffers.get(&id).map(|entry| Arc::clone(&entry.wgpu_buffer)))
    }

    pub(crate) fn get_wgpu_texture_view(&self, id: TextureViewId) -> Option<Arc<wgpu::TextureView>> {
        lookup(&self.internal.texture_views, &id)
    }

    /// (crate-internal) Registers a finished wgpu::CommandBuffer, storing it
    /// in a map and returning an abstract ID for it.
    pub(crate) fn register_command_buffer(&self, buffer: wgpu::CommandBuffer) -> CommandBufferId {
        let id = CommandBufferId(self.next_id());
        match self.internal.pending_command_buffers.lock() {
            Ok(mut pending) => {
                pending.insert(id, buffer);
            }
            Err(e) => log::error!("WgpuDevice: command buffer {id:?} dropped: {e}"),
        }
        id
    }

    /// Creates an offscreen color target of `width` x `height` in the formats
    /// of `target`, with a depth attachment if `target` has a depth format.
    ///
    /// ## Errors
    /// Returns a [`ResourceError`] if a texture or view cannot be created.
    pub fn create_render_target_texture(
        &self,
        width: u32,
        height: u32,
        target: RenderTarget,
    ) -> Result<RenderTargetViews, ResourceError> {
        let size = Extent3D {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let attachment = |label: &'static str, format| -> Result<(TextureId, TextureViewId), ResourceError> {
            let texture = self.create_texture(&TextureDescriptor {
                label: Some(Cow::Borrowed(label)),
                size,
                mip_level_count: 1,
                sample_count: target.sample_count,
                dimension: TextureDimension::D2,
                format,
                usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::COPY_SRC,
            })?;
            let view = self.create_texture_view(texture, &TextureViewDescriptor::default())?;
            Ok((texture, view))
        };

        let (color_texture, color) = attachment("Offscreen Color", target.color_format)?;
        let (depth_texture, depth) = match target.depth_stencil_format {
            Some(format) => {
                let (texture, view) = attachment("Offscreen Depth", format)?;
                (Some(texture), Some(view))
            }
            None => (None, None),
        };
        log::debug!("WgpuDevice: Created {width}x{height} render target ({target:?})");
        Ok(RenderTargetViews {
            color_texture,
            color,
            depth_texture,
            depth,
        })
    }
}

impl GraphicsDevice for WgpuDevice {
    // --- Shader Module Operations ---

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let source = match &descriptor.source {
            ShaderSourceData::Wgsl(code) => wgpu::ShaderSource::Wgsl(code.clone()),
        };
        let label = descriptor.label;

        let (module, error) = self.with_validation(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor { label, source })
        });
        if let Some(error) = error {
            log::error!("WgpuDevice: Shader module {label:?} failed to compile: {error}");
            return Err(ShaderError::CompilationError {
                label: label.unwrap_or_default().to_string(),
                details: error.to_string(),
            }
            .into());
        }

        let id = ShaderModuleId(self.next_id());
        lock(&self.internal.shader_modules, "shader_modules")?.insert(id, Arc::new(module));
        log::info!("WgpuDevice: Created shader module {label:?} with ID: {id:?}");
        Ok(id)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        remove(&self.internal.shader_modules, &id, "shader_modules")
            .map_err(|_| ShaderError::NotFound { id }.into())
            .map(|_| log::debug!("WgpuDevice: Destroyed shader module with ID: {id:?}"))
    }

    // -- Render Pipeline Operations ---

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let label = descriptor.label.as_deref();
        log::debug!("WgpuDevice: Creating render pipeline with label: {label:?}");

        // 1. Resolve the shader modules and layout
        let missing_module = |id| ResourceError::Shader(ShaderError::NotFound { id });
        let vs_module = lookup(&self.internal.shader_modules, &descriptor.vertex_shader_module)
            .ok_or_else(|| missing_module(descriptor.vertex_shader_module))?;
        let fs_module = match descriptor.fragment_shader_module {
            Some(id) => Some(lookup(&self.internal.shader_modules, &id).ok_or_else(|| missing_module(id))?),
            None => None,
        };
        let layout = match descriptor.layout {
            Some(id) => Some(
                lookup(&self.internal.pipeline_layouts, &id).ok_or(ResourceError::InvalidHandle)?,
            ),
            None => None,
        };

        // 2. Convert vertex buffers layout
        let attributes: Vec<Vec<wgpu::VertexAttribute>> = descriptor
            .vertex_buffers_layout
            .iter()
            .map(|buffer| {
                buffer
                    .attributes
                    .iter()
                    .map(|attribute| wgpu::VertexAttribute {
                        format: attribute.format.into_wgpu(),
                        offset: attribute.offset,
                        shader_location: attribute.shader_location,
                    })
                    .collect()
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = descriptor
            .vertex_buffers_layout
            .iter()
            .zip(attributes.iter())
            .map(|(buffer, attributes)| wgpu::VertexBufferLayout {
                array_stride: buffer.array_stride,
                step_mode: buffer.step_mode.into_wgpu(),
                attributes,
            })
            .collect();

        // 3. Convert fixed-function state
        let state = &descriptor.primitive_state;
        let primitive = wgpu::PrimitiveState {
            topology: state.topology.into_wgpu(),
            strip_index_format: state.strip_index_format.map(|f| f.into_wgpu()),
            front_face: state.front_face.into_wgpu(),
            cull_mode: state.cull_mode.map(|m| m.into_wgpu()),
            polygon_mode: state.polygon_mode.into_wgpu(),
            ..Default::default()
        };
        let depth_stencil = descriptor
            .depth_stencil_state
            .as_ref()
            .map(|ds| wgpu::DepthStencilState {
                format: ds.format.into_wgpu(),
                depth_write_enabled: ds.depth_write_enabled,
                depth_compare: ds.depth_compare.into_wgpu(),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            });
        let targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_target_states
            .iter()
            .map(|target| {
                Some(wgpu::ColorTargetState {
                    format: target.format.into_wgpu(),
                    blend: target.blend.map(|b| b.into_wgpu()),
                    write_mask: target.write_mask.into_wgpu(),
                })
            })
            .collect();
        let multisample = wgpu::MultisampleState {
            count: descriptor.multisample_state.count.into_wgpu(),
            mask: u64::from(descriptor.multisample_state.mask),
            alpha_to_coverage_enabled: descriptor.multisample_state.alpha_to_coverage_enabled,
        };

        let fragment = match (&fs_module, &descriptor.fragment_entry_point) {
            (Some(module), Some(entry_point)) => Some(wgpu::FragmentState {
                module,
                entry_point: Some(entry_point.as_ref()),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            (Some(_), None) => {
                return Err(PipelineError::CompilationFailed {
                    label: label.map(String::from),
                    details: "fragment module without an entry point".to_string(),
                }
                .into())
            }
            _ => None,
        };

        // 4. Create the pipeline inside a validation scope
        let (pipeline, error) = self.with_validation(|device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label,
                layout: layout.as_deref(),
                vertex: wgpu::VertexState {
                    module: &vs_module,
                    entry_point: Some(descriptor.vertex_entry_point.as_ref()),
                    buffers: &vertex_buffers,
                    compilation_options: Default::default(),
                },
                primitive,
                depth_stencil,
                multisample,
                fragment,
                multiview: None,
                cache: None,
            })
        });
        if let Some(error) = error {
            log::error!("WgpuDevice: Render pipeline {label:?} rejected: {error}");
            return Err(PipelineError::CompilationFailed {
                label: label.map(String::from),
                details: error.to_string(),
            }
            .into());
        }

        let id = RenderPipelineId(self.next_id());
        lock(&self.internal.pipelines, "pipelines")?.insert(id, Arc::new(pipeline));
        log::info!("WgpuDevice: Created render pipeline {label:?} with ID: {id:?}");
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        remove(&self.internal.pipelines, &id, "pipelines")
            .map_err(|_| PipelineError::InvalidRenderPipeline { id }.into())
            .map(|_| log::debug!("WgpuDevice: Destroyed render pipeline with ID: {id:?}"))
    }

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        let layouts = descriptor
            .bind_group_layouts
            .iter()
            .map(|id| lookup(&self.internal.bind_group_layouts, id).ok_or(ResourceError::InvalidHandle))
            .collect::<Result<Vec<_>, _>>()?;
        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().map(|l| l.as_ref()).collect();

        let layout = self
            .wgpu_device()
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: descriptor.label.as_deref(),
                bind_group_layouts: &layout_refs,
                push_constant_ranges: &[],
            });
        let id = PipelineLayoutId(self.next_id());
        lock(&self.internal.pipeline_layouts, "pipeline_layouts")?.insert(id, Arc::new(layout));
        log::debug!(
            "WgpuDevice: Created pipeline layout {:?} with ID: {:?}",
            descriptor.label,
            id
        );
        Ok(id)
    }

    fn destroy_pipeline_layout(&self, id: PipelineLayoutId) -> Result<(), ResourceError> {
        remove(&self.internal.pipeline_layouts, &id, "pipeline_layouts").map(|_| ())
    }

    // --- Bind Group Operations ---

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = descriptor
            .entries
            .iter()
            .map(|entry| wgpu::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: entry.visibility.into_wgpu(),
                ty: match &entry.ty {
                    BindingType::Buffer {
                        ty,
                        has_dynamic_offset,
                        min_binding_size,
                    } => wgpu::BindingType::Buffer {
                        ty: match ty {
                            BufferBindingType::Uniform => wgpu::BufferBindingType::Uniform,
                            BufferBindingType::Storage { read_only } => {
                                wgpu::BufferBindingType::Storage {
                                    read_only: *read_only,
                                }
                            }
                        },
                        has_dynamic_offset: *has_dynamic_offset,
                        min_binding_size: *min_binding_size,
                    },
                    BindingType::Texture {
                        sample_type,
                        view_dimension,
                        multisampled,
                    } => wgpu::BindingType::Texture {
                        sample_type: sample_type.into_wgpu(),
                        view_dimension: view_dimension.into_wgpu(),
                        multisampled: *multisampled,
                    },
                    BindingType::Sampler(ty) => wgpu::BindingType::Sampler(ty.into_wgpu()),
                },
                count: None,
            })
            .collect();

        let layout = self
            .wgpu_device()
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: descriptor.label,
                entries: &entries,
            });
        let id = BindGroupLayoutId(self.next_id());
        lock(&self.internal.bind_group_layouts, "bind_group_layouts")?.insert(id, Arc::new(layout));
        log::debug!(
            "WgpuDevice: Created bind group layout {:?} with ID: {:?}",
            descriptor.label,
            id
        );
        Ok(id)
    }

    fn destroy_bind_group_layout(&self, id: BindGroupLayoutId) -> Result<(), ResourceError> {
        remove(&self.internal.bind_group_layouts, &id, "bind_group_layouts").map(|_| ())
    }

    fn create_bind_group(&self, descriptor: &BindGroupDescriptor) -> Result<BindGroupId, ResourceError> {
        enum Resolved {
            Buffer(Arc<wgpu::Buffer>, u64, Option<NonZeroU64>),
            View(Arc<wgpu::TextureView>),
            Sampler(Arc<wgpu::Sampler>),
        }

        let layout = lookup(&self.internal.bind_group_layouts, &descriptor.layout)
            .ok_or(ResourceError::InvalidHandle)?;
        let resolved = descriptor
            .entries
            .iter()
            .map(|entry| {
                let resource = match entry.resource {
                    BindingResource::Buffer(binding) => self
                        .get_wgpu_buffer(binding.buffer)
                        .map(|b| Resolved::Buffer(b, binding.offset, binding.size)),
                    BindingResource::TextureView(id) => self.get_wgpu_texture_view(id).map(Resolved::View),
                    BindingResource::Sampler(id) => {
                        lookup(&self.internal.samplers, &id).map(Resolved::Sampler)
                    }
                };
                resource
                    .map(|r| (entry.binding, r))
                    .ok_or(ResourceError::NotFound)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let entries: Vec<wgpu::BindGroupEntry> = resolved
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match resource {
                    Resolved::Buffer(buffer, offset, size) => {
                        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: buffer.as_ref(),
                            offset: *offset,
                            size: *size,
                        })
                    }
                    Resolved::View(view) => wgpu::BindingResource::TextureView(view.as_ref()),
                    Resolved::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler.as_ref()),
                },
            })
            .collect();

        let bind_group = self.wgpu_device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: descriptor.label,
            layout: &layout,
            entries: &entries,
        });
        let id = BindGroupId(self.next_id());
        lock(&self.internal.bind_groups, "bind_groups")?.insert(id, Arc::new(bind_group));
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        remove(&self.internal.bind_groups, &id, "bind_groups").map(|_| ())
    }

    // --- Buffer Operations ---

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let buffer = self.wgpu_device().create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size,
            usage: descriptor.usage.into_wgpu(),
            mapped_at_creation: descriptor.mapped_at_creation,
        });
        let id = BufferId(self.next_id());
        self.track_allocation(descriptor.size);
        lock(&self.internal.buffers, "buffers")?.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(buffer),
                size: descriptor.size,
            },
        );
        log::debug!(
            "WgpuDevice: Created buffer {:?} with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            descriptor.size
        );
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let buffer = self
            .wgpu_device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: descriptor.label.as_deref(),
                contents: data,
                usage: descriptor.usage.into_wgpu(),
            });
        let id = BufferId(self.next_id());
        let size = buffer.size();
        self.track_allocation(size);
        lock(&self.internal.buffers, "buffers")?.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(buffer),
                size,
            },
        );
        log::debug!(
            "WgpuDevice: Created buffer {:?} with initial data. ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let entry = remove(&self.internal.buffers, &id, "buffers")?;
        self.track_release(entry.size);
        log::trace!("WgpuDevice: Destroyed buffer with ID: {id:?}");
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let buffer = self.get_wgpu_buffer(id).ok_or(ResourceError::NotFound)?;
        if offset + data.len() as u64 > buffer.size() {
            return Err(ResourceError::OutOfBounds);
        }
        self.internal.context.queue.write_buffer(&buffer, offset, data);
        Ok(())
    }

    // --- Texture Operations ---

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let texture = self.wgpu_device().create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size.into_wgpu(),
            mip_level_count: descriptor.mip_level_count,
            sample_count: descriptor.sample_count.into_wgpu(),
            dimension: descriptor.dimension.into_wgpu(),
            format: descriptor.format.into_wgpu(),
            usage: descriptor.usage.into_wgpu(),
            view_formats: &[],
        });
        let size = u64::from(descriptor.size.width)
            * u64::from(descriptor.size.height)
            * u64::from(descriptor.size.depth_or_array_layers)
            * u64::from(descriptor.format.bytes_per_pixel())
            * u64::from(descriptor.sample_count.count());
        let id = TextureId(self.next_id());
        self.track_allocation(size);
        lock(&self.internal.textures, "textures")?.insert(
            id,
            WgpuTextureEntry {
                wgpu_texture: Arc::new(texture),
                size,
            },
        );
        log::debug!(
            "WgpuDevice: Created texture {:?} with ID: {:?}, size: {} bytes (VRAM)",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let entry = remove(&self.internal.textures, &id, "textures")?;
        self.track_release(entry.size);
        Ok(())
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        offset: Origin3D,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let texture = lock(&self.internal.textures, "textures")?
            .get(&texture_id)
            .map(|entry| Arc::clone(&entry.wgpu_texture))
            .ok_or(ResourceError::NotFound)?;
        self.internal.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: offset.into_wgpu(),
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row,
                rows_per_image: None,
            },
            size.into_wgpu(),
        );
        log::trace!(
            "WgpuDevice: Wrote {} bytes to texture ID: {:?}",
            data.len(),
            texture_id
        );
        Ok(())
    }

    fn create_texture_view(
        &self,
        texture_id: TextureId,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let texture = lock(&self.internal.textures, "textures")?
            .get(&texture_id)
            .map(|entry| Arc::clone(&entry.wgpu_texture))
            .ok_or(ResourceError::NotFound)?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: descriptor.label.as_deref(),
            format: descriptor.format.map(|f| f.into_wgpu()),
            dimension: descriptor.dimension.map(|d| d.into_wgpu()),
            ..Default::default()
        });
        let id = TextureViewId(self.next_id());
        lock(&self.internal.texture_views, "texture_views")?.insert(id, Arc::new(view));
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        remove(&self.internal.texture_views, &id, "texture_views").map(|_| ())
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let sampler = self.wgpu_device().create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label.as_deref(),
            address_mode_u: descriptor.address_mode_u.into_wgpu(),
            address_mode_v: descriptor.address_mode_v.into_wgpu(),
            address_mode_w: descriptor.address_mode_w.into_wgpu(),
            mag_filter: descriptor.mag_filter.into_wgpu(),
            min_filter: descriptor.min_filter.into_wgpu(),
            mipmap_filter: descriptor.mipmap_filter.into_wgpu(),
            ..Default::default()
        });
        let id = SamplerId(self.next_id());
        lock(&self.internal.samplers, "samplers")?.insert(id, Arc::new(sampler));
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        remove(&self.internal.samplers, &id, "samplers").map(|_| ())
    }

    // --- Command Operations ---

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        let encoder = self
            .wgpu_device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label });
        Box::new(WgpuCommandEncoder {
            encoder,
            device: self.clone(),
        })
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) {
        let buffer = match self.internal.pending_command_buffers.lock() {
            Ok(mut pending) => pending.remove(&command_buffer),
            Err(e) => {
                log::error!("WgpuDevice: pending command buffers poisoned: {e}");
                return;
            }
        };
        match buffer {
            Some(buffer) => {
                self.internal.context.queue.submit(std::iter::once(buffer));
            }
            None => log::error!(
                "Attempted to submit a CommandBufferId ({command_buffer:?}) that does not exist."
            ),
        }
    }

    fn get_adapter_info(&self) -> RendererAdapterInfo {
        let context = &self.internal.context;
        RendererAdapterInfo {
            name: context.adapter_name.clone(),
            backend_type: match context.adapter_backend {
                wgpu::Backend::Vulkan => GraphicsBackendType::Vulkan,
                wgpu::Backend::Metal => GraphicsBackendType::Metal,
                wgpu::Backend::Dx12 => GraphicsBackendType::Dx12,
                wgpu::Backend::Gl => GraphicsBackendType::OpenGl,
                wgpu::Backend::BrowserWebGpu => GraphicsBackendType::WebGpu,
                _ => GraphicsBackendType::Unknown,
            },
            device_type: match context.adapter_device_type {
                wgpu::DeviceType::IntegratedGpu => RendererDeviceType::IntegratedGpu,
                wgpu::DeviceType::DiscreteGpu => RendererDeviceType::DiscreteGpu,
                wgpu::DeviceType::VirtualGpu => RendererDeviceType::VirtualGpu,
                wgpu::DeviceType::Cpu => RendererDeviceType::Cpu,
                _ => RendererDeviceType::Unknown,
            },
        }
    }
}
