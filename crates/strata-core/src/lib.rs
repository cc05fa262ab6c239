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

//! Foundational crate of the Strata rendering layer.
//!
//! `strata-core` holds the backend-agnostic contracts: GPU resource ids and
//! descriptors, the [`renderer::traits::GraphicsDevice`] abstraction, and the
//! renderer-visible entities [`geometry::Geometry`] and [`material::Material`]
//! together with the substrate traits that backends implement for them.

#![warn(missing_docs)]

pub mod geometry;
pub mod material;
pub mod math;
pub mod renderer;

pub use geometry::Geometry;
pub use material::Material;
