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

//! Device-backed substrates for Strata geometries and materials.
//!
//! A [`DeviceDriver`] owns the resources every substrate on one device shares:
//! bind group layouts, the pipeline layout, the compiled lighting programs and
//! uploaded textures. It creates a [`DeviceGeometrySubstrate`] per geometry
//! and a [`DeviceMaterialSubstrate`] per material through the
//! [`Driver`](strata_core::renderer::Driver) trait, so any
//! [`GraphicsDevice`](strata_core::renderer::GraphicsDevice) backend can draw
//! Strata scenes.

#![warn(missing_docs)]

pub mod driver;
pub mod shaders;
pub mod substrate;

pub use driver::{BindGroupLayouts, DeviceDriver, ShaderProgram};
pub use substrate::{DeviceGeometrySubstrate, DeviceMaterialSubstrate, PipelineKey};
