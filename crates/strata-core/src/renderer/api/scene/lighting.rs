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

//! Lighting uniform structures.

/// Maximum number of non-ambient lights a lighting uniform buffer carries.
pub const MAX_LIGHTS: usize = 8;

/// Data for a single light, formatted for GPU consumption.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Color (rgb) and light kind (w, see [`LightType::gpu_kind`](crate::renderer::LightType::gpu_kind)).
    pub color: [f32; 4],
    /// World position (xyz) and attenuation start distance (w).
    pub position: [f32; 4],
    /// Normalized direction (xyz) and attenuation end distance (w).
    pub direction: [f32; 4],
    /// x = attenuation falloff exponent, y = spot inner cosine,
    /// z = spot outer cosine, w = specular weight.
    pub params: [f32; 4],
}

/// The structure of a lighting uniform buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniforms {
    /// Sum of every ambient light (rgb), a is unused.
    pub ambient_color: [f32; 4],
    /// Active non-ambient lights, the first `num_lights` entries are valid.
    pub lights: [LightUniform; MAX_LIGHTS],
    /// Number of valid entries in `lights`.
    pub num_lights: u32,
    /// Padding for 16-byte alignment.
    pub _padding: [u32; 3],
}

impl Default for LightingUniforms {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}
