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

//! State descriptors for the pipeline.

use super::enums::*;
use crate::renderer::api::util::enums::{IndexFormat, TextureFormat};
use bitflags::bitflags;
use std::borrow::Cow;

/// One attribute inside a vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttributeDescriptor {
    /// The `@location` the shader reads it from.
    pub shader_location: u32,
    /// Attribute format.
    pub format: VertexFormat,
    /// Byte offset inside one vertex.
    pub offset: u64,
}

/// The layout of one vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferLayoutDescriptor<'a> {
    /// Bytes between consecutive vertices.
    pub array_stride: u64,
    /// How often the buffer advances.
    pub step_mode: VertexStepMode,
    /// Attributes read from the buffer.
    pub attributes: Cow<'a, [VertexAttributeDescriptor]>,
}

/// Primitive assembly and rasterization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveStateDescriptor {
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Index format for strip topologies, `None` otherwise.
    pub strip_index_format: Option<IndexFormat>,
    /// Front-facing winding.
    pub front_face: FrontFace,
    /// Culled faces.
    pub cull_mode: Option<CullMode>,
    /// Rasterization mode.
    pub polygon_mode: PolygonMode,
}

impl Default for PrimitiveStateDescriptor {
    fn default() -> Self {
        PrimitiveStateDescriptor {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
        }
    }
}

/// Depth testing state. Stencil is not used by substrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilStateDescriptor {
    /// Format of the depth attachment.
    pub format: TextureFormat,
    /// If `true`, passing fragments write their depth.
    pub depth_write_enabled: bool,
    /// The depth comparison.
    pub depth_compare: CompareFunction,
}

/// Blending of one channel group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponentDescriptor {
    /// Factor applied to the source.
    pub src_factor: BlendFactor,
    /// Factor applied to the destination.
    pub dst_factor: BlendFactor,
    /// Combining operation.
    pub operation: BlendOperation,
}

/// Blending of the color and alpha channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendStateDescriptor {
    /// Color channels.
    pub color: BlendComponentDescriptor,
    /// Alpha channel.
    pub alpha: BlendComponentDescriptor,
}

impl BlendStateDescriptor {
    /// Source-alpha over destination with one-minus-source-alpha on both
    /// color and alpha.
    pub const ALPHA_BLENDING: Self = Self {
        color: BlendComponentDescriptor {
            src_factor: BlendFactor::SrcAlpha,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        },
        alpha: BlendComponentDescriptor {
            src_factor: BlendFactor::SrcAlpha,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        },
    };
}

bitflags! {
    /// Color channels written by a color target.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWrites: u8 {
        /// Red.
        const R = 0b0001;
        /// Green.
        const G = 0b0010;
        /// Blue.
        const B = 0b0100;
        /// Alpha.
        const A = 0b1000;
        /// All channels.
        const ALL = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

/// The state of one color target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorTargetStateDescriptor {
    /// Target format.
    pub format: TextureFormat,
    /// Blending, `None` to replace.
    pub blend: Option<BlendStateDescriptor>,
    /// Written channels.
    pub write_mask: ColorWrites,
}
