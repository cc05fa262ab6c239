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

//! Device-backed geometry substrate.
//!
//! Construction validates and uploads the geometry's data, then prebuilds one
//! pipeline per element for the driver's default target. Pipelines for other
//! targets, crossfades and materials swapped in later are built on first use
//! and cached under a [`PipelineKey`].

use super::vertex_layout::{group_sources, VertexGroup};
use crate::driver::DeviceDriver;
use ahash::AHashMap;
use std::borrow::Cow;
use std::sync::Arc;
use strata_core::geometry::Geometry;
use strata_core::material::Material;
use strata_core::renderer::api::{
    core::SubstrateSettings,
    pipeline::{
        BlendStateDescriptor, ColorTargetStateDescriptor, ColorWrites, CompareFunction,
        DepthStencilStateDescriptor, MultisampleStateDescriptor, PipelineLayoutId,
        PolygonMode, PrimitiveStateDescriptor, PrimitiveTopology, RenderPipelineDescriptor,
        RenderPipelineId, VertexBufferLayoutDescriptor,
    },
    resource::{BufferDescriptor, BufferId, BufferUsage, ShaderFunction},
    scene::ViewUniforms,
    util::{ConcurrentBuffer, IndexFormat},
};
use strata_core::renderer::{
    Driver, ElementDraw, GeometrySubstrate, GraphicsDevice, MaterialSubstrate, RenderContext,
    RenderError, RenderPass, RenderTarget, ResourceError, SubstrateError,
};

/// Everything a pipeline is specialized on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// Vertex stage.
    pub vertex: ShaderFunction,
    /// Fragment stage.
    pub fragment: ShaderFunction,
    /// Primitive topology of the element.
    pub topology: PrimitiveTopology,
    /// Index format, only set for strip topologies.
    pub strip_index_format: Option<IndexFormat>,
    /// If `true`, fragments write depth.
    pub depth_write: bool,
    /// Depth comparison.
    pub depth_compare: CompareFunction,
    /// Attachment formats and sample count.
    pub target: RenderTarget,
}

impl PipelineKey {
    /// The key of `element` drawn with `material`'s substrate into `target`.
    ///
    /// Depth writes follow the material unless `allow_depth_write` is
    /// `false`; depth compare is `Less` if the material reads depth, `Always`
    /// otherwise.
    pub fn new(
        element: &ElementBuffer,
        material: &Material,
        substrate: &dyn MaterialSubstrate,
        target: RenderTarget,
        allow_depth_write: bool,
    ) -> Self {
        Self {
            vertex: substrate.vertex_program(),
            fragment: substrate.fragment_program(),
            topology: element.topology,
            strip_index_format: element.topology.is_strip().then_some(element.format),
            depth_write: allow_depth_write && material.writes_to_depth_buffer(),
            depth_compare: if material.reads_from_depth_buffer() {
                CompareFunction::Less
            } else {
                CompareFunction::Always
            },
            target,
        }
    }
}

/// The uploaded index buffer of one element.
#[derive(Debug, Clone, Copy)]
pub struct ElementBuffer {
    /// The GPU buffer.
    pub buffer: BufferId,
    /// Indices drawn.
    pub index_count: u32,
    /// Index width.
    pub format: IndexFormat,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
}

/// The GPU realization of a [`Geometry`] on a [`DeviceDriver`]'s device.
#[derive(Debug)]
pub struct DeviceGeometrySubstrate {
    device: Arc<dyn GraphicsDevice>,
    label: String,
    settings: SubstrateSettings,
    pipeline_layout: PipelineLayoutId,
    vertex_buffers: Vec<BufferId>,
    vertex_layouts: Vec<VertexBufferLayoutDescriptor<'static>>,
    elements: Vec<ElementBuffer>,
    view_uniforms: ConcurrentBuffer,
    pipelines: AHashMap<PipelineKey, Option<RenderPipelineId>>,
}

impl DeviceGeometrySubstrate {
    /// Validates and uploads `geometry` and prebuilds its pipelines.
    ///
    /// ## Errors
    ///
    /// Returns [`SubstrateError::EmptyMaterials`],
    /// [`SubstrateError::StrideMismatch`],
    /// [`SubstrateError::UnsupportedVertexLayout`] or
    /// [`SubstrateError::InvalidIndexData`] for malformed input, or
    /// [`SubstrateError::Resource`] if an allocation fails. Resources created
    /// before the failure are released.
    pub fn new(driver: &DeviceDriver, geometry: &Geometry) -> Result<Self, SubstrateError> {
        if geometry.get_materials().is_empty() {
            return Err(SubstrateError::EmptyMaterials);
        }
        let groups = group_sources(geometry.get_geometry_sources())?;
        for (index, element) in geometry.get_geometry_elements().iter().enumerate() {
            let expected = element.index_byte_len();
            if element.data().len() < expected {
                return Err(SubstrateError::InvalidIndexData {
                    element: index,
                    expected,
                    found: element.data().len(),
                });
            }
        }

        let device = Arc::clone(driver.device());
        let settings = driver.settings().clone();
        let label = if geometry.name().is_empty() {
            "Geometry".to_string()
        } else {
            geometry.name().to_string()
        };
        let view_uniforms = ConcurrentBuffer::new(
            device.as_ref(),
            driver.layouts().view,
            0,
            std::mem::size_of::<ViewUniforms>() as u64,
            settings.frames_in_flight,
            settings.uniform_entries_per_slot,
            format!("{label} View"),
        )?;

        // From here on, an early return drops `substrate`, which releases
        // everything uploaded so far.
        let mut substrate = Self {
            device,
            label,
            settings,
            pipeline_layout: driver.pipeline_layout(),
            vertex_buffers: Vec::with_capacity(groups.len()),
            vertex_layouts: Vec::with_capacity(groups.len()),
            elements: Vec::with_capacity(geometry.get_geometry_elements().len()),
            view_uniforms,
            pipelines: AHashMap::new(),
        };
        substrate.upload_vertices(groups)?;
        substrate.upload_elements(geometry)?;

        let target = driver.target();
        for index in 0..substrate.elements.len() {
            let material = geometry
                .get_material_for_element(index)
                .map_err(|_| SubstrateError::EmptyMaterials)?;
            let material_substrate = material.substrate(driver)?;
            let key = PipelineKey::new(
                &substrate.elements[index],
                material,
                material_substrate.as_ref(),
                target,
                true,
            );
            substrate.pipeline(&key);
        }

        log::debug!(
            "GeometrySubstrate: '{}' ready with {} vertex buffers, {} elements, {} pipelines",
            substrate.label,
            substrate.vertex_buffers.len(),
            substrate.elements.len(),
            substrate.pipelines.len()
        );
        Ok(substrate)
    }

    fn upload_vertices(&mut self, groups: Vec<VertexGroup>) -> Result<(), ResourceError> {
        for (index, group) in groups.into_iter().enumerate() {
            let label = format!("{} Vertices {}", self.label, index);
            let buffer = self.device.create_buffer_with_data(
                &BufferDescriptor {
                    label: Some(Cow::Borrowed(label.as_str())),
                    size: group.size as u64,
                    usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
                    mapped_at_creation: false,
                },
                &group.data.bytes()[..group.size],
            )?;
            self.vertex_buffers.push(buffer);
            self.vertex_layouts.push(group.layout);
        }
        Ok(())
    }

    fn upload_elements(&mut self, geometry: &Geometry) -> Result<(), ResourceError> {
        for (index, element) in geometry.get_geometry_elements().iter().enumerate() {
            let label = format!("{} Indices {}", self.label, index);
            let bytes = &element.data()[..element.index_byte_len()];
            let buffer = self.device.create_buffer_with_data(
                &BufferDescriptor {
                    label: Some(Cow::Borrowed(label.as_str())),
                    size: bytes.len() as u64,
                    usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
                    mapped_at_creation: false,
                },
                bytes,
            )?;
            self.elements.push(ElementBuffer {
                buffer,
                index_count: element.index_count() as u32,
                format: element.index_format(),
                topology: element.primitive_type().topology(),
            });
        }
        Ok(())
    }

    /// The uploaded elements, by element index.
    pub fn elements(&self) -> &[ElementBuffer] {
        &self.elements
    }

    /// Number of cached pipeline keys, including those that failed to build.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns the pipeline for `key`, building it on first request.
    ///
    /// A failed build is logged once and cached as `None`.
    fn pipeline(&mut self, key: &PipelineKey) -> Option<RenderPipelineId> {
        if let Some(cached) = self.pipelines.get(key) {
            return *cached;
        }

        let label = format!("{} Pipeline", self.label);
        let descriptor = RenderPipelineDescriptor {
            label: Some(Cow::Borrowed(label.as_str())),
            vertex_shader_module: key.vertex.module,
            vertex_entry_point: Cow::Borrowed(key.vertex.entry_point),
            fragment_shader_module: Some(key.fragment.module),
            fragment_entry_point: Some(Cow::Borrowed(key.fragment.entry_point)),
            vertex_buffers_layout: Cow::Borrowed(self.vertex_layouts.as_slice()),
            layout: Some(self.pipeline_layout),
            primitive_state: PrimitiveStateDescriptor {
                topology: key.topology,
                strip_index_format: key.strip_index_format,
                front_face: self.settings.front_face,
                cull_mode: self.settings.cull_mode,
                polygon_mode: PolygonMode::Fill,
            },
            depth_stencil_state: key.target.depth_stencil_format.map(|format| {
                DepthStencilStateDescriptor {
                    format,
                    depth_write_enabled: key.depth_write,
                    depth_compare: key.depth_compare,
                }
            }),
            color_target_states: Cow::Owned(vec![ColorTargetStateDescriptor {
                format: key.target.color_format,
                blend: Some(BlendStateDescriptor::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            }]),
            multisample_state: MultisampleStateDescriptor {
                count: key.target.sample_count,
                ..Default::default()
            },
        };

        let pipeline = match self.device.create_render_pipeline(&descriptor) {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!(
                    "GeometrySubstrate: '{}' pipeline for {:?} failed, affected draws are skipped: {}",
                    self.label,
                    key.topology,
                    e
                );
                None
            }
        };
        self.pipelines.insert(*key, pipeline);
        pipeline
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_with_material(
        &mut self,
        element: ElementBuffer,
        material: &Material,
        allow_depth_write: bool,
        draw: &ElementDraw<'_>,
        context: &RenderContext,
        pass: &mut dyn RenderPass,
        driver: &dyn Driver,
    ) -> Result<(), RenderError> {
        let substrate = material.substrate(driver)?;
        let key = PipelineKey::new(
            &element,
            material,
            substrate.as_ref(),
            context.target,
            allow_depth_write,
        );
        let Some(pipeline) = self.pipeline(&key) else {
            return Ok(());
        };
        pass.set_pipeline(pipeline);

        let lighting = substrate.bind_lighting_uniforms(context.lights(), context.eye, context.frame)?;
        pass.set_bind_group(2, lighting.bind_group, &[lighting.offset]);

        let uniforms =
            substrate.bind_material_uniforms(material, draw.opacity, context.eye, context.frame)?;
        pass.set_bind_group(1, uniforms.bind_group, &[uniforms.offset]);

        pass.set_bind_group(3, substrate.texture_bind_group(), &[]);
        pass.draw_indexed(0..element.index_count, 0, 0..1);
        Ok(())
    }
}

impl GeometrySubstrate for DeviceGeometrySubstrate {
    fn render(
        &mut self,
        draw: &ElementDraw<'_>,
        context: &RenderContext,
        pass: &mut dyn RenderPass,
        driver: &dyn Driver,
    ) -> Result<(), RenderError> {
        let Some(element) = self.elements.get(draw.element_index).copied() else {
            log::warn!(
                "GeometrySubstrate: '{}' has no element {}",
                self.label,
                draw.element_index
            );
            return Ok(());
        };

        let debug_groups = self.settings.debug_groups;
        if debug_groups {
            pass.push_debug_group(&format!(
                "{} [{}] {}",
                self.label,
                draw.element_index,
                draw.material.name()
            ));
        }

        for (slot, buffer) in self.vertex_buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, *buffer, 0);
        }
        pass.set_index_buffer(element.buffer, 0, element.format);

        let view = if draw.stereo_enabled {
            context.view_matrix
        } else {
            context.monocular_view_matrix
        };
        let uniforms = ViewUniforms::new(
            &draw.transform,
            &view,
            &context.projection_matrix,
            context.camera_position,
        );
        let mut result = self
            .view_uniforms
            .write(
                self.device.as_ref(),
                context.eye,
                context.frame,
                bytemuck::bytes_of(&uniforms),
            )
            .map(|binding| pass.set_bind_group(0, binding.bind_group, &[binding.offset]))
            .map_err(RenderError::from);

        if result.is_ok() {
            if let Some(outgoing) = draw.material.outgoing() {
                result = self.draw_with_material(element, outgoing, false, draw, context, pass, driver);
            }
        }
        if result.is_ok() {
            result = self.draw_with_material(element, draw.material, true, draw, context, pass, driver);
        }

        if debug_groups {
            pass.pop_debug_group();
        }
        result
    }
}

impl Drop for DeviceGeometrySubstrate {
    fn drop(&mut self) {
        let device = self.device.as_ref();
        let warn = |what: &str, result: Result<(), ResourceError>| {
            if let Err(e) = result {
                log::warn!("GeometrySubstrate: failed to destroy {what}: {e}");
            }
        };

        for buffer in self.vertex_buffers.drain(..) {
            warn("vertex buffer", device.destroy_buffer(buffer));
        }
        for element in self.elements.drain(..) {
            warn("index buffer", device.destroy_buffer(element.buffer));
        }
        for pipeline in self.pipelines.drain().filter_map(|(_, id)| id) {
            warn("render pipeline", device.destroy_render_pipeline(pipeline));
        }
        self.view_uniforms.destroy(device);
    }
}
