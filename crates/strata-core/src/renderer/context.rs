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

//! Per-frame state handed to geometries by the scene renderer.

use crate::renderer::api::util::enums::{SampleCount, TextureFormat};
use crate::renderer::light::{hash_lights, Light};
use glam::{Mat4, Vec3};

/// The eye a pass renders for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EyeType {
    /// Left eye of a stereo pair.
    Left,
    /// Right eye of a stereo pair.
    Right,
    /// A single, non-stereo view.
    #[default]
    Monocular,
}

impl EyeType {
    /// Number of distinct eyes, the per-frame slot multiplier of uniform buffers.
    pub const COUNT: usize = 3;

    /// A dense index in `0..EyeType::COUNT`.
    pub fn index(self) -> usize {
        match self {
            EyeType::Left => 0,
            EyeType::Right => 1,
            EyeType::Monocular => 2,
        }
    }
}

/// The formats of the attachments draws are recorded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTarget {
    /// Multisample count of the color and depth attachments.
    pub sample_count: SampleCount,
    /// Color attachment format.
    pub color_format: TextureFormat,
    /// Depth/stencil attachment format, `None` if the pass has no depth.
    pub depth_stencil_format: Option<TextureFormat>,
}

impl Default for RenderTarget {
    fn default() -> Self {
        Self {
            sample_count: SampleCount::X1,
            color_format: TextureFormat::Bgra8UnormSrgb,
            depth_stencil_format: Some(TextureFormat::Depth32Float),
        }
    }
}

/// Everything a draw needs to know about the frame and eye being rendered.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Monotonic frame number, selects uniform buffer slots.
    pub frame: u64,
    /// The eye being rendered.
    pub eye: EyeType,
    /// View matrix of this eye.
    pub view_matrix: Mat4,
    /// View matrix of the head, used by geometries with stereo disabled.
    pub monocular_view_matrix: Mat4,
    /// Projection matrix of this eye.
    pub projection_matrix: Mat4,
    /// World-space camera position.
    pub camera_position: Vec3,
    /// Formats of the pass being recorded.
    pub target: RenderTarget,
    lights: Vec<Light>,
    lights_hash: u64,
}

impl RenderContext {
    /// Creates a context with identity matrices and no lights.
    pub fn new(frame: u64, eye: EyeType, target: RenderTarget) -> Self {
        Self {
            frame,
            eye,
            view_matrix: Mat4::IDENTITY,
            monocular_view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            target,
            lights: Vec::new(),
            lights_hash: hash_lights(&[]),
        }
    }

    /// Sets the camera of a monocular pass: the eye view and the head view
    /// are the same matrix.
    pub fn with_camera(mut self, view: Mat4, projection: Mat4, position: Vec3) -> Self {
        self.view_matrix = view;
        self.monocular_view_matrix = view;
        self.projection_matrix = projection;
        self.camera_position = position;
        self
    }

    /// Replaces the active lights and recomputes their hash.
    pub fn set_lights(&mut self, lights: Vec<Light>) {
        self.lights_hash = hash_lights(&lights);
        self.lights = lights;
    }

    /// The active lights.
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Identity of the active light set, part of every shader sort key.
    pub fn lights_hash(&self) -> u64 {
        self.lights_hash
    }
}

/// What a geometry needs to know about the node drawing it to build sort keys.
#[derive(Debug, Clone, Copy)]
pub struct NodeSortInfo {
    /// Stable identifier of the node, used to break ordering ties.
    pub id: u64,
    /// World transform of the node.
    pub world_transform: Mat4,
    /// Accumulated opacity of the node.
    pub opacity: f32,
    /// World-space camera position.
    pub camera_position: Vec3,
}
