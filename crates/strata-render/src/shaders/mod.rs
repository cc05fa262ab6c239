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

//! Built-in shader sources, one program per lighting model.
//!
//! Every program starts with `common.wgsl`, which declares the bind group
//! contract shared by all substrates:
//!
//! | Group | Binding | Content |
//! |---|---|---|
//! | 0 | 0 | [`ViewUniforms`](strata_core::renderer::api::scene::ViewUniforms), dynamic offset |
//! | 1 | 0 | [`MaterialUniforms`](strata_core::renderer::api::scene::MaterialUniforms), dynamic offset |
//! | 2 | 0 | [`LightingUniforms`](strata_core::renderer::api::scene::LightingUniforms), dynamic offset |
//! | 3 | 0, 1, 2 | diffuse texture, specular texture, sampler |
//!
//! Vertex inputs are read at the semantic locations: position 0, normal 1
//! (lit models only), texture coordinates 3.

use strata_core::material::LightingModel;

/// Vertex stage entry point of every built-in program.
pub const VERTEX_ENTRY_POINT: &str = "vs_main";

/// Fragment stage entry point of every built-in program.
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

/// Unlit: diffuse color and ambient.
pub const CONSTANT_WGSL: &str = concat!(include_str!("common.wgsl"), include_str!("constant.wgsl"));

/// Diffuse lighting.
pub const LAMBERT_WGSL: &str = concat!(include_str!("common.wgsl"), include_str!("lambert.wgsl"));

/// Diffuse lighting with reflection-vector specular.
pub const PHONG_WGSL: &str = concat!(include_str!("common.wgsl"), include_str!("phong.wgsl"));

/// Diffuse lighting with half-vector specular.
pub const BLINN_WGSL: &str = concat!(include_str!("common.wgsl"), include_str!("blinn.wgsl"));

/// The source of the program drawing `model`.
pub fn source_for(model: LightingModel) -> &'static str {
    match model {
        LightingModel::Constant => CONSTANT_WGSL,
        LightingModel::Lambert => LAMBERT_WGSL,
        LightingModel::Phong => PHONG_WGSL,
        LightingModel::Blinn => BLINN_WGSL,
    }
}

/// Debug label of the program drawing `model`.
pub fn label_for(model: LightingModel) -> &'static str {
    match model {
        LightingModel::Constant => "constant",
        LightingModel::Lambert => "lambert",
        LightingModel::Phong => "phong",
        LightingModel::Blinn => "blinn",
    }
}
