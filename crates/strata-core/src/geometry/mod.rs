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

//! Renderable shapes.
//!
//! A [`Geometry`] owns immutable vertex streams ([`GeometrySource`]) and index
//! buffers ([`GeometryElement`]) plus a mutable list of materials. Element `i`
//! is drawn with material `i % materials.len()`. The GPU realization, a
//! [`GeometrySubstrate`], is created lazily by the [`Driver`] that renders it.

mod element;
mod source;

pub use self::element::{GeometryElement, GeometryPrimitiveType};
pub use self::source::{DataId, GeometrySemantic, GeometrySource, SourceLayout, VertexData};

use crate::material::Material;
use crate::math::Aabb;
use crate::renderer::context::{NodeSortInfo, RenderContext};
use crate::renderer::error::GeometryError;
use crate::renderer::sort_key::SortKey;
use crate::renderer::traits::{Driver, DriverId, ElementDraw, GeometrySubstrate, RenderPass};
use glam::{Mat4, Vec3};
use std::sync::{Arc, OnceLock};

/// A shape made of vertex streams, index buffers and materials.
#[derive(Debug)]
pub struct Geometry {
    name: String,
    sources: Arc<[GeometrySource]>,
    elements: Arc<[GeometryElement]>,
    materials: Vec<Arc<Material>>,
    rendering_order: i32,
    stereo_enabled: bool,
    bounds: OnceLock<Aabb>,
    sort_keys: Vec<SortKey>,
    substrate: Option<(DriverId, Box<dyn GeometrySubstrate>)>,
}

impl Geometry {
    /// Creates a geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NoMaterials`] if `materials` is empty.
    pub fn new(
        sources: Vec<GeometrySource>,
        elements: Vec<GeometryElement>,
        materials: Vec<Arc<Material>>,
    ) -> Result<Self, GeometryError> {
        if materials.is_empty() {
            return Err(GeometryError::NoMaterials);
        }
        Ok(Self {
            name: String::new(),
            sources: sources.into(),
            elements: elements.into(),
            materials,
            rendering_order: 0,
            stereo_enabled: true,
            bounds: OnceLock::new(),
            sort_keys: Vec::new(),
            substrate: None,
        })
    }

    /// Sets the name and returns the geometry.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the rendering order and returns the geometry.
    pub fn with_rendering_order(mut self, order: i32) -> Self {
        self.rendering_order = order;
        self
    }

    /// Debug name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// User-assigned draw order; lower draws first.
    pub fn rendering_order(&self) -> i32 {
        self.rendering_order
    }

    /// Sets the draw order.
    pub fn set_rendering_order(&mut self, order: i32) {
        self.rendering_order = order;
    }

    /// If `false`, every eye renders with the monocular view matrix.
    pub fn is_stereo_rendering_enabled(&self) -> bool {
        self.stereo_enabled
    }

    /// Enables or disables per-eye view matrices.
    pub fn set_stereo_rendering_enabled(&mut self, enabled: bool) {
        self.stereo_enabled = enabled;
    }

    /// The vertex streams.
    pub fn get_geometry_sources(&self) -> &[GeometrySource] {
        &self.sources
    }

    /// The vertex streams carrying `semantic`.
    pub fn get_geometry_sources_for_semantic(
        &self,
        semantic: GeometrySemantic,
    ) -> impl Iterator<Item = &GeometrySource> {
        self.sources
            .iter()
            .filter(move |source| source.semantic() == semantic)
    }

    /// The index buffers.
    pub fn get_geometry_elements(&self) -> &[GeometryElement] {
        &self.elements
    }

    /// The materials.
    pub fn get_materials(&self) -> &[Arc<Material>] {
        &self.materials
    }

    /// The materials, for in-place replacement.
    pub fn get_materials_mut(&mut self) -> &mut [Arc<Material>] {
        &mut self.materials
    }

    /// Replaces the material list.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NoMaterials`] if `materials` is empty; the
    /// current list is kept.
    pub fn set_materials(&mut self, materials: Vec<Arc<Material>>) -> Result<(), GeometryError> {
        if materials.is_empty() {
            return Err(GeometryError::NoMaterials);
        }
        self.materials = materials;
        Ok(())
    }

    /// The material element `index` is drawn with: `materials[index % len]`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NoMaterials`] if the list is empty.
    pub fn get_material_for_element(&self, index: usize) -> Result<&Arc<Material>, GeometryError> {
        if self.materials.is_empty() {
            return Err(GeometryError::NoMaterials);
        }
        Ok(&self.materials[index % self.materials.len()])
    }

    /// The bounds of the `Vertex` stream, computed on first call.
    ///
    /// A geometry without a readable `Vertex` stream has [`Aabb::ZERO`] bounds.
    pub fn get_bounding_box(&self) -> Aabb {
        *self.bounds.get_or_init(|| {
            self.get_geometry_sources_for_semantic(GeometrySemantic::Vertex)
                .next()
                .map(|source| Aabb::from_points(source.read_points()))
                .unwrap_or(Aabb::ZERO)
        })
    }

    /// The center of the bounding box.
    pub fn get_center(&self) -> Vec3 {
        self.get_bounding_box().center()
    }

    /// Creates a geometry sharing this one's vertex and index data, drawn
    /// with `materials`. The new geometry has no substrate.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NoMaterials`] if `materials` is empty.
    pub fn share_data(&self, materials: Vec<Arc<Material>>) -> Result<Geometry, GeometryError> {
        if materials.is_empty() {
            return Err(GeometryError::NoMaterials);
        }
        let bounds = OnceLock::new();
        if let Some(cached) = self.bounds.get() {
            let _ = bounds.set(*cached);
        }
        Ok(Self {
            name: self.name.clone(),
            sources: Arc::clone(&self.sources),
            elements: Arc::clone(&self.elements),
            materials,
            rendering_order: self.rendering_order,
            stereo_enabled: self.stereo_enabled,
            bounds,
            sort_keys: Vec::new(),
            substrate: None,
        })
    }

    /// Builds the substrate for `driver` if it has not been built yet.
    ///
    /// Calling it again with the same driver does nothing. A substrate built
    /// by another driver is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Substrate`] if the driver rejects the geometry.
    pub fn prewarm(&mut self, driver: &dyn Driver) -> Result<(), GeometryError> {
        let built_for = self.substrate.as_ref().map(|(id, _)| *id);
        if built_for == Some(driver.id()) {
            return Ok(());
        }
        if let Some(previous) = built_for {
            log::debug!(
                "Geometry '{}': rebuilding substrate built by driver {:?} for driver {:?}",
                self.name,
                previous,
                driver.id()
            );
            self.substrate = None;
        }
        let substrate = driver.new_geometry_substrate(self)?;
        self.substrate = Some((driver.id(), substrate));
        Ok(())
    }

    /// Drops the substrate. The next [`prewarm`](Self::prewarm) or render
    /// rebuilds it, e.g. after a device loss.
    pub fn invalidate_substrate(&mut self) {
        self.substrate = None;
    }

    /// Returns `true` if a substrate has been built.
    pub fn has_substrate(&self) -> bool {
        self.substrate.is_some()
    }

    /// Records the draws of element `element_index` with `material`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ElementOutOfRange`] for an unknown element,
    /// or the substrate's construction or recording error.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        element_index: usize,
        material: &Material,
        transform: Mat4,
        opacity: f32,
        context: &RenderContext,
        pass: &mut dyn RenderPass,
        driver: &dyn Driver,
    ) -> Result<(), GeometryError> {
        let count = self.elements.len();
        if element_index >= count {
            return Err(GeometryError::ElementOutOfRange {
                index: element_index,
                count,
            });
        }
        self.prewarm(driver)?;
        let draw = ElementDraw {
            element_index,
            material,
            transform,
            opacity,
            stereo_enabled: self.stereo_enabled,
        };
        if let Some((_, substrate)) = self.substrate.as_mut() {
            substrate.render(&draw, context, pass, driver)?;
        }
        Ok(())
    }

    /// Records every element in index order with its own material.
    ///
    /// A failing element is logged and skipped; its siblings are still drawn.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Substrate`] only if the substrate cannot be
    /// built, in which case nothing is drawn.
    pub fn render_elements(
        &mut self,
        transform: Mat4,
        opacity: f32,
        context: &RenderContext,
        pass: &mut dyn RenderPass,
        driver: &dyn Driver,
    ) -> Result<(), GeometryError> {
        self.prewarm(driver)?;
        for index in 0..self.elements.len() {
            let material = Arc::clone(self.get_material_for_element(index)?);
            if let Err(err) = self.render(index, &material, transform, opacity, context, pass, driver) {
                log::error!(
                    "Geometry '{}': element {} skipped: {}",
                    self.name,
                    index,
                    err
                );
            }
        }
        Ok(())
    }

    /// Recomputes one sort key per element for the node drawing this geometry.
    ///
    /// `lights_hash` identifies the light set affecting the node.
    pub fn update_sort_keys(&mut self, node: &NodeSortInfo, lights_hash: u64) {
        let center = self
            .get_bounding_box()
            .transform(&node.world_transform)
            .center();
        let distance = center.distance(node.camera_position);

        self.sort_keys.clear();
        for index in 0..self.elements.len() {
            let material = &self.materials[index % self.materials.len()];
            self.sort_keys.push(SortKey {
                rendering_order: self.rendering_order,
                transparent: material.is_transparent() || node.opacity < 1.0,
                shader: material.shader_key(lights_hash),
                textures: material.texture_key(),
                distance_from_camera: distance,
                node: node.id,
                element_index: index as u32,
            });
        }
    }

    /// Appends the keys computed by the last [`update_sort_keys`](Self::update_sort_keys).
    pub fn get_sort_keys(&self, out: &mut Vec<SortKey>) {
        out.extend_from_slice(&self.sort_keys);
    }
}
