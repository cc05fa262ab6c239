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

//! Backend realizations of geometries and materials.
//!
//! A [`Driver`] belongs to one backend context and creates substrates for it.
//! [`Geometry`] and [`Material`] hold their substrates as trait objects and
//! never branch on the backend themselves.

use crate::geometry::Geometry;
use crate::material::{LightingModel, Material};
use crate::renderer::api::command::BindGroupId;
use crate::renderer::api::resource::{ShaderFunction, TextureViewId};
use crate::renderer::api::util::UniformBinding;
use crate::renderer::context::{EyeType, RenderContext};
use crate::renderer::error::{RenderError, ResourceError, SubstrateError};
use crate::renderer::light::Light;
use crate::renderer::traits::RenderPass;
use glam::Mat4;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies a driver, and through it the backend context substrates belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverId(pub u64);

impl DriverId {
    /// Allocates a process-unique id.
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        DriverId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Creates backend substrates for geometries and materials.
pub trait Driver: Send + Sync {
    /// The identity of this driver's backend context.
    fn id(&self) -> DriverId;

    /// Builds the GPU realization of `geometry`.
    ///
    /// ## Errors
    ///
    /// Returns a [`SubstrateError`] on malformed input or if a required
    /// resource cannot be created; nothing partially built is kept.
    fn new_geometry_substrate(
        &self,
        geometry: &Geometry,
    ) -> Result<Box<dyn GeometrySubstrate>, SubstrateError>;

    /// Builds the GPU realization of `material`.
    ///
    /// ## Errors
    ///
    /// Returns a [`SubstrateError`] if the shader program or uniform buffers
    /// cannot be created.
    fn new_material_substrate(
        &self,
        material: &Material,
    ) -> Result<Arc<dyn MaterialSubstrate>, SubstrateError>;
}

/// The GPU realization of a [`Material`] for one driver.
pub trait MaterialSubstrate: Send + Sync + Debug {
    /// The lighting model the shader program was selected for.
    fn lighting_model(&self) -> LightingModel;

    /// The vertex stage function.
    fn vertex_program(&self) -> ShaderFunction;

    /// The fragment stage function.
    fn fragment_program(&self) -> ShaderFunction;

    /// Writes the material's properties for `(eye, frame)` and returns where
    /// they were written.
    ///
    /// `opacity` is the accumulated opacity of the drawing node.
    fn bind_material_uniforms(
        &self,
        material: &Material,
        opacity: f32,
        eye: EyeType,
        frame: u64,
    ) -> Result<UniformBinding, ResourceError>;

    /// Writes `lights` in this lighting model's format for `(eye, frame)` and
    /// returns where they were written.
    fn bind_lighting_uniforms(
        &self,
        lights: &[Light],
        eye: EyeType,
        frame: u64,
    ) -> Result<UniformBinding, ResourceError>;

    /// Bound texture views; the position in the list is the texture slot.
    fn textures(&self) -> &[TextureViewId];

    /// The bind group holding [`textures`](Self::textures) and their sampler.
    fn texture_bind_group(&self) -> BindGroupId;
}

/// One element draw requested from a [`GeometrySubstrate`].
#[derive(Debug, Clone, Copy)]
pub struct ElementDraw<'a> {
    /// Index of the element in the geometry.
    pub element_index: usize,
    /// The material to draw it with.
    pub material: &'a Material,
    /// World transform of the drawing node.
    pub transform: Mat4,
    /// Accumulated opacity of the drawing node.
    pub opacity: f32,
    /// If `false`, the monocular view matrix is used for every eye.
    pub stereo_enabled: bool,
}

/// The GPU realization of a [`Geometry`] for one driver.
pub trait GeometrySubstrate: Send + Sync + Debug {
    /// Records the draw calls of one element into `pass`.
    ///
    /// An element whose pipeline could not be built records nothing.
    ///
    /// ## Errors
    ///
    /// Returns a [`RenderError`] if a material substrate or a uniform write
    /// fails; the pass is left usable for other elements.
    fn render(
        &mut self,
        draw: &ElementDraw<'_>,
        context: &RenderContext,
        pass: &mut dyn RenderPass,
        driver: &dyn Driver,
    ) -> Result<(), RenderError>;
}
