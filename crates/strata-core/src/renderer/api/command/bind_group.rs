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

//! Defines data structures for bind groups and bind group layouts.
//!
//! Bind groups are the mechanism for binding resources (buffers, textures, samplers)
//! to shaders in a graphics pipeline. Substrates bind the view, material, lighting
//! and texture groups at fixed indices shared by every built-in shader.

use crate::renderer::api::{
    resource::{BufferId, SamplerId, TextureViewDimension, TextureViewId},
    util::flags::ShaderStageFlags,
};
use std::num::NonZeroU64;

/// An opaque handle to a bind group layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindGroupLayoutId(pub usize);

/// An opaque handle to a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindGroupId(pub usize);

/// Describes one binding slot of a bind group layout.
#[derive(Debug, Clone)]
pub struct BindGroupLayoutEntry {
    /// The binding index inside the group.
    pub binding: u32,
    /// The stages that can access the binding.
    pub visibility: ShaderStageFlags,
    /// What is bound.
    pub ty: BindingType,
}

impl BindGroupLayoutEntry {
    /// A uniform buffer entry.
    pub fn uniform_buffer(
        binding: u32,
        visibility: ShaderStageFlags,
        has_dynamic_offset: bool,
        min_binding_size: Option<NonZeroU64>,
    ) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset,
                min_binding_size,
            },
        }
    }

    /// A filterable 2D float texture entry.
    pub fn texture_2d(binding: u32, visibility: ShaderStageFlags) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Texture {
                sample_type: TextureSampleType::Float { filterable: true },
                view_dimension: TextureViewDimension::D2,
                multisampled: false,
            },
        }
    }

    /// A filtering sampler entry.
    pub fn sampler(binding: u32, visibility: ShaderStageFlags) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Sampler(SamplerBindingType::Filtering),
        }
    }
}

/// The kind of buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferBindingType {
    /// A uniform buffer.
    Uniform,
    /// A storage buffer.
    Storage {
        /// If `true`, shaders cannot write to it.
        read_only: bool,
    },
}

/// The sample type of a bound texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSampleType {
    /// Floating-point texels.
    Float {
        /// If `true`, the texture can be sampled with a filtering sampler.
        filterable: bool,
    },
    /// Depth texels.
    Depth,
}

/// The kind of sampler binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerBindingType {
    /// A sampler that may filter.
    Filtering,
    /// A sampler that must not filter.
    NonFiltering,
}

/// What a layout entry binds.
#[derive(Debug, Clone)]
pub enum BindingType {
    /// A buffer.
    Buffer {
        /// Uniform or storage.
        ty: BufferBindingType,
        /// If `true`, the offset is given when the group is set on a pass.
        has_dynamic_offset: bool,
        /// The minimum size of the bound range.
        min_binding_size: Option<NonZeroU64>,
    },
    /// A sampled texture.
    Texture {
        /// Texel sample type.
        sample_type: TextureSampleType,
        /// View dimension.
        view_dimension: TextureViewDimension,
        /// If `true`, the texture is multisampled.
        multisampled: bool,
    },
    /// A sampler.
    Sampler(SamplerBindingType),
}

/// Describes a bind group layout to create.
#[derive(Debug, Clone)]
pub struct BindGroupLayoutDescriptor<'a> {
    /// Debug label.
    pub label: Option<&'a str>,
    /// The binding slots.
    pub entries: &'a [BindGroupLayoutEntry],
}

/// A range of a buffer bound to a binding slot.
#[derive(Debug, Clone, Copy)]
pub struct BufferBinding {
    /// The buffer.
    pub buffer: BufferId,
    /// Byte offset of the range.
    pub offset: u64,
    /// Size of the range, or the rest of the buffer when `None`.
    pub size: Option<NonZeroU64>,
}

/// A resource bound to a binding slot.
#[derive(Debug, Clone, Copy)]
pub enum BindingResource {
    /// A buffer range.
    Buffer(BufferBinding),
    /// A texture view.
    TextureView(TextureViewId),
    /// A sampler.
    Sampler(SamplerId),
}

/// Describes a bind group to create.
#[derive(Debug, Clone)]
pub struct BindGroupDescriptor<'a> {
    /// Debug label.
    pub label: Option<&'a str>,
    /// The layout the group conforms to.
    pub layout: BindGroupLayoutId,
    /// The bound resources.
    pub entries: &'a [BindGroupEntry],
}

/// One resource of a bind group.
#[derive(Debug, Clone, Copy)]
pub struct BindGroupEntry {
    /// The binding index inside the group.
    pub binding: u32,
    /// The bound resource.
    pub resource: BindingResource,
}

impl BindGroupEntry {
    /// Binds a range of `buffer`.
    pub fn buffer(binding: u32, buffer: BufferId, offset: u64, size: Option<NonZeroU64>) -> Self {
        Self {
            binding,
            resource: BindingResource::Buffer(BufferBinding {
                buffer,
                offset,
                size,
            }),
        }
    }

    /// Binds a texture view.
    pub fn texture_view(binding: u32, view: TextureViewId) -> Self {
        Self {
            binding,
            resource: BindingResource::TextureView(view),
        }
    }

    /// Binds a sampler.
    pub fn sampler(binding: u32, sampler: SamplerId) -> Self {
        Self {
            binding,
            resource: BindingResource::Sampler(sampler),
        }
    }
}
