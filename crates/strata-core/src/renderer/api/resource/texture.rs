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

//! Textures, texture views and samplers.

use crate::renderer::api::util::enums::{SampleCount, TextureFormat};
use bitflags::bitflags;
use std::borrow::Cow;

/// An opaque handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a view into a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureViewId(pub usize);

/// An opaque handle to a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);

/// The size of a texture or copy region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3D {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth or number of array layers.
    pub depth_or_array_layers: u32,
}

/// The texel origin of a copy region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Origin3D {
    /// X offset.
    pub x: u32,
    /// Y offset.
    pub y: u32,
    /// Z offset.
    pub z: u32,
}

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// One-dimensional.
    D1,
    /// Two-dimensional.
    #[default]
    D2,
    /// Three-dimensional.
    D3,
}

bitflags! {
    /// How a texture may be used. Bit positions match the WebGPU values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// The texture can be the source of a copy.
        const COPY_SRC = 1 << 0;
        /// The texture can be the destination of a copy or a queue write.
        const COPY_DST = 1 << 1;
        /// The texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// The texture can be bound as a storage texture.
        const STORAGE_BINDING = 1 << 3;
        /// The texture can be a render pass attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

/// Describes a texture to create.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// Debug label.
    pub label: Option<Cow<'a, str>>,
    /// Texture size.
    pub size: Extent3D,
    /// Number of mip levels.
    pub mip_level_count: u32,
    /// Multisample count.
    pub sample_count: SampleCount,
    /// Dimensionality.
    pub dimension: TextureDimension,
    /// Texel format.
    pub format: TextureFormat,
    /// Allowed usages.
    pub usage: TextureUsage,
}

/// The dimensionality a texture view exposes to shaders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    /// One-dimensional.
    D1,
    /// Two-dimensional.
    #[default]
    D2,
    /// Array of two-dimensional layers.
    D2Array,
    /// Cube map.
    Cube,
    /// Three-dimensional.
    D3,
}

/// Describes a view into a texture. `None` fields inherit from the texture.
#[derive(Debug, Clone, Default)]
pub struct TextureViewDescriptor<'a> {
    /// Debug label.
    pub label: Option<Cow<'a, str>>,
    /// Format override.
    pub format: Option<TextureFormat>,
    /// Dimension override.
    pub dimension: Option<TextureViewDimension>,
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Clamp to the edge texel.
    #[default]
    ClampToEdge,
    /// Repeat the texture.
    Repeat,
    /// Repeat the texture, mirroring every other tile.
    MirrorRepeat,
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Linear interpolation between texels.
    Linear,
}

/// Describes a sampler to create.
#[derive(Debug, Clone, Default)]
pub struct SamplerDescriptor<'a> {
    /// Debug label.
    pub label: Option<Cow<'a, str>>,
    /// Addressing along U.
    pub address_mode_u: AddressMode,
    /// Addressing along V.
    pub address_mode_v: AddressMode,
    /// Addressing along W.
    pub address_mode_w: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Filter between mip levels.
    pub mipmap_filter: FilterMode,
}
