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

//! Render pass descriptions.

use crate::renderer::api::resource::TextureViewId;

/// An opaque handle to a finished command buffer awaiting submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub usize);

/// A linear RGBA color.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
}

/// What happens to an attachment at the start of the pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOp<V> {
    /// Clear to the given value.
    Clear(V),
    /// Keep the existing contents.
    Load,
}

/// What happens to an attachment at the end of the pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreOp {
    /// Write the results.
    #[default]
    Store,
    /// Discard the results.
    Discard,
}

/// Load and store behavior of one attachment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operations<V> {
    /// Load behavior.
    pub load: LoadOp<V>,
    /// Store behavior.
    pub store: StoreOp,
}

/// A color attachment of a render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderPassColorAttachment {
    /// The view rendered into.
    pub view: TextureViewId,
    /// Optional multisample resolve target.
    pub resolve_target: Option<TextureViewId>,
    /// Load/store behavior.
    pub ops: Operations<Color>,
}

/// The depth/stencil attachment of a render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderPassDepthStencilAttachment {
    /// The depth view.
    pub view: TextureViewId,
    /// Depth load/store behavior, `None` for read-only depth.
    pub depth_ops: Option<Operations<f32>>,
}

/// Describes a render pass to begin.
#[derive(Debug, Clone)]
pub struct RenderPassDescriptor<'a> {
    /// Debug label.
    pub label: Option<&'a str>,
    /// Color attachments.
    pub color_attachments: &'a [RenderPassColorAttachment],
    /// Optional depth/stencil attachment.
    pub depth_stencil_attachment: Option<RenderPassDepthStencilAttachment>,
}
