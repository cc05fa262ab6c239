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

//! Material uniform structures.

/// Data for a material's properties, shared by every lighting model's shader.
///
/// Models that do not use a term leave it zeroed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    /// Diffuse surface color (linear RGBA).
    pub diffuse_color: [f32; 4],
    /// Specular surface color (rgb), a is unused.
    pub specular_color: [f32; 4],
    /// Ambient surface color (rgb), a is unused.
    pub ambient_color: [f32; 4],
    /// x = shininess, y = alpha, z = diffuse intensity, w = specular intensity.
    pub params: [f32; 4],
}

impl MaterialUniforms {
    /// The final alpha written by the fragment shader.
    pub fn alpha(&self) -> f32 {
        self.params[1]
    }
}
