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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the "common language" shared by the substrates and the
//! backends: abstract `traits` (like [`GraphicsDevice`] and [`Driver`]),
//! descriptor data structures, per-frame context, sort keys and the error
//! hierarchy. The concrete GPU work is done by a backend in `strata-infra`,
//! and the substrates in `strata-render` drive it through these traits.

pub mod api;
pub mod context;
pub mod error;
pub mod light;
pub mod sort_key;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::context::{EyeType, NodeSortInfo, RenderContext, RenderTarget};
pub use self::error::{
    GeometryError, PipelineError, RenderError, ResourceError, ShaderError, SubstrateError,
};
pub use self::light::{hash_lights, Light, LightType};
pub use self::sort_key::SortKey;
pub use self::traits::{
    CommandEncoder, Driver, DriverId, ElementDraw, GeometrySubstrate, GraphicsDevice,
    MaterialSubstrate, RenderPass,
};
