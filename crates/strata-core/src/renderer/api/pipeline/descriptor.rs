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

//! Main pipeline descriptors.

use super::layout::PipelineLayoutId;
use super::state::*;
use crate::renderer::api::{resource::ShaderModuleId, util::SampleCount};
use std::borrow::Cow;

/// A complete description of a render pipeline.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// Debug label.
    pub label: Option<Cow<'a, str>>,
    /// Vertex shader module.
    pub vertex_shader_module: ShaderModuleId,
    /// Vertex entry point.
    pub vertex_entry_point: Cow<'a, str>,
    /// Fragment shader module.
    pub fragment_shader_module: Option<ShaderModuleId>,
    /// Fragment entry point.
    pub fragment_entry_point: Option<Cow<'a, str>>,
    /// Vertex buffer layouts, indexed by slot.
    pub vertex_buffers_layout: Cow<'a, [VertexBufferLayoutDescriptor<'a>]>,
    /// Bind group layouts used by the pipeline.
    pub layout: Option<PipelineLayoutId>,
    /// Primitive state.
    pub primitive_state: PrimitiveStateDescriptor,
    /// Depth state, `None` when the target has no depth attachment.
    pub depth_stencil_state: Option<DepthStencilStateDescriptor>,
    /// Color targets.
    pub color_target_states: Cow<'a, [ColorTargetStateDescriptor]>,
    /// Multisampling.
    pub multisample_state: MultisampleStateDescriptor,
}

/// Multisampling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultisampleStateDescriptor {
    /// Sample count.
    pub count: SampleCount,
    /// Sample mask.
    pub mask: u32,
    /// If `true`, alpha drives coverage.
    pub alpha_to_coverage_enabled: bool,
}

impl Default for MultisampleStateDescriptor {
    fn default() -> Self {
        Self {
            count: SampleCount::X1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        }
    }
}

/// An opaque handle to a render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPipelineId(pub usize);
