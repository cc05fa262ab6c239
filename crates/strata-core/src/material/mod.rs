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

//! Surface appearance of geometry elements.
//!
//! A [`Material`] is plain data plus a per-driver cache of its
//! [`MaterialSubstrate`]. Crossfades are expressed by giving a material an
//! outgoing material; the geometry substrate draws the outgoing one first.

mod texture;

pub use self::texture::{Texture, TextureUid};

use crate::renderer::error::{ResourceError, SubstrateError};
use crate::renderer::light::stable_hasher;
use crate::renderer::traits::{Driver, DriverId, MaterialSubstrate};
use ahash::AHashMap;
use glam::{Vec3, Vec4};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Unique identity of a [`Material`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

impl MaterialId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        MaterialId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// How a material responds to lights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LightingModel {
    /// Unlit: diffuse color plus ambient.
    Constant,
    /// Diffuse only.
    Lambert,
    /// Diffuse and Phong specular.
    Phong,
    /// Diffuse and Blinn-Phong specular.
    #[default]
    Blinn,
}

/// A color with an optional texture and an intensity.
#[derive(Debug, Clone)]
pub struct MaterialVisual {
    /// Linear RGBA color, multiplied with the texture if any.
    pub color: Vec4,
    /// The texture sampled for this visual.
    pub texture: Option<Arc<Texture>>,
    /// Scale applied to the visual's contribution.
    pub intensity: f32,
}

impl Default for MaterialVisual {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            texture: None,
            intensity: 1.0,
        }
    }
}

/// Surface appearance of one or more geometry elements.
#[derive(Debug)]
pub struct Material {
    id: MaterialId,
    name: String,
    lighting_model: LightingModel,
    diffuse: MaterialVisual,
    specular: MaterialVisual,
    ambient_color: Vec3,
    shininess: f32,
    transparency: f32,
    reads_from_depth_buffer: bool,
    writes_to_depth_buffer: bool,
    outgoing: Option<Arc<Material>>,
    substrates: Mutex<AHashMap<DriverId, Arc<dyn MaterialSubstrate>>>,
}

impl Material {
    /// Creates an opaque white material with depth read and write enabled.
    pub fn new(lighting_model: LightingModel) -> Self {
        Self {
            id: MaterialId::next(),
            name: String::new(),
            lighting_model,
            diffuse: MaterialVisual::default(),
            specular: MaterialVisual {
                color: Vec4::ZERO,
                ..Default::default()
            },
            ambient_color: Vec3::ZERO,
            shininess: 2.0,
            transparency: 1.0,
            reads_from_depth_buffer: true,
            writes_to_depth_buffer: true,
            outgoing: None,
            substrates: Mutex::new(AHashMap::new()),
        }
    }

    /// Sets the name and returns the material.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The material's identity.
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Debug name, used as the label of the element's debug group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the material.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The lighting model.
    pub fn lighting_model(&self) -> LightingModel {
        self.lighting_model
    }

    /// Changes the lighting model. Cached substrates keep the old shaders
    /// until [`invalidate_substrates`](Self::invalidate_substrates) is called.
    pub fn set_lighting_model(&mut self, model: LightingModel) {
        self.lighting_model = model;
    }

    /// The diffuse visual.
    pub fn diffuse(&self) -> &MaterialVisual {
        &self.diffuse
    }

    /// The diffuse visual, mutably.
    pub fn diffuse_mut(&mut self) -> &mut MaterialVisual {
        &mut self.diffuse
    }

    /// Sets the diffuse color.
    pub fn set_diffuse_color(&mut self, color: Vec4) {
        self.diffuse.color = color;
    }

    /// Sets the diffuse texture.
    pub fn set_diffuse_texture(&mut self, texture: Option<Arc<Texture>>) {
        self.diffuse.texture = texture;
    }

    /// The specular visual.
    pub fn specular(&self) -> &MaterialVisual {
        &self.specular
    }

    /// The specular visual, mutably.
    pub fn specular_mut(&mut self) -> &mut MaterialVisual {
        &mut self.specular
    }

    /// Sets the specular color.
    pub fn set_specular_color(&mut self, color: Vec4) {
        self.specular.color = color;
    }

    /// Sets the specular texture.
    pub fn set_specular_texture(&mut self, texture: Option<Arc<Texture>>) {
        self.specular.texture = texture;
    }

    /// Color added regardless of lighting.
    pub fn ambient_color(&self) -> Vec3 {
        self.ambient_color
    }

    /// Sets the ambient color.
    pub fn set_ambient_color(&mut self, color: Vec3) {
        self.ambient_color = color;
    }

    /// Specular exponent.
    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    /// Sets the specular exponent.
    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }

    /// Material opacity in `[0, 1]`; 1 is opaque.
    pub fn transparency(&self) -> f32 {
        self.transparency
    }

    /// Sets the material opacity, clamped to `[0, 1]`.
    pub fn set_transparency(&mut self, transparency: f32) {
        self.transparency = transparency.clamp(0.0, 1.0);
    }

    /// If `true`, fragments are depth tested with `Less`.
    pub fn reads_from_depth_buffer(&self) -> bool {
        self.reads_from_depth_buffer
    }

    /// Enables or disables depth testing.
    pub fn set_reads_from_depth_buffer(&mut self, reads: bool) {
        self.reads_from_depth_buffer = reads;
    }

    /// If `true`, fragments write depth.
    pub fn writes_to_depth_buffer(&self) -> bool {
        self.writes_to_depth_buffer
    }

    /// Enables or disables depth writes.
    pub fn set_writes_to_depth_buffer(&mut self, writes: bool) {
        self.writes_to_depth_buffer = writes;
    }

    /// Starts a crossfade from `outgoing` to this material.
    pub fn fade_from(&mut self, outgoing: Arc<Material>) {
        self.outgoing = Some(outgoing);
    }

    /// Ends the crossfade; only this material is drawn afterwards.
    pub fn finish_fade(&mut self) {
        self.outgoing = None;
    }

    /// The material being faded out, if a crossfade is running.
    pub fn outgoing(&self) -> Option<&Arc<Material>> {
        self.outgoing.as_ref()
    }

    /// Returns `true` if the material blends with what is behind it.
    pub fn is_transparent(&self) -> bool {
        self.transparency < 1.0 || self.diffuse.color.w < 1.0 || self.outgoing.is_some()
    }

    /// Identity of the shader program this material draws with under the
    /// light set identified by `lights_hash`. Textures are bound per draw and
    /// do not change the program.
    pub fn shader_key(&self, lights_hash: u64) -> u32 {
        let mut hasher = stable_hasher();
        self.lighting_model.hash(&mut hasher);
        lights_hash.hash(&mut hasher);
        hasher.finish() as u32
    }

    /// Identity of the set of textures this material binds.
    pub fn texture_key(&self) -> u32 {
        let mut hasher = stable_hasher();
        self.diffuse.texture.as_ref().map(|t| t.id()).hash(&mut hasher);
        self.specular.texture.as_ref().map(|t| t.id()).hash(&mut hasher);
        hasher.finish() as u32
    }

    /// Returns this material's substrate for `driver`, creating it on first use.
    ///
    /// ## Errors
    ///
    /// Returns the driver's [`SubstrateError`] if creation fails; nothing is
    /// cached in that case and the next call retries.
    pub fn substrate(
        &self,
        driver: &dyn Driver,
    ) -> Result<Arc<dyn MaterialSubstrate>, SubstrateError> {
        let mut substrates = self.substrates.lock().map_err(|_| {
            SubstrateError::Resource(ResourceError::BackendError(
                "Material substrate cache lock poisoned".to_string(),
            ))
        })?;
        if let Some(substrate) = substrates.get(&driver.id()) {
            return Ok(Arc::clone(substrate));
        }
        log::debug!(
            "Material: creating {:?} substrate for '{}' on driver {:?}",
            self.lighting_model,
            self.name,
            driver.id()
        );
        let substrate = driver.new_material_substrate(self)?;
        substrates.insert(driver.id(), Arc::clone(&substrate));
        Ok(substrate)
    }

    /// Drops every cached substrate; the next draw rebuilds them.
    pub fn invalidate_substrates(&self) {
        match self.substrates.lock() {
            Ok(mut substrates) => substrates.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Clone for Material {
    /// Copies the properties under a new identity, with no cached substrates.
    fn clone(&self) -> Self {
        Self {
            id: MaterialId::next(),
            name: self.name.clone(),
            lighting_model: self.lighting_model,
            diffuse: self.diffuse.clone(),
            specular: self.specular.clone(),
            ambient_color: self.ambient_color,
            shininess: self.shininess,
            transparency: self.transparency,
            reads_from_depth_buffer: self.reads_from_depth_buffer,
            writes_to_depth_buffer: self.writes_to_depth_buffer,
            outgoing: self.outgoing.clone(),
            substrates: Mutex::new(AHashMap::new()),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(LightingModel::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::traits::mock::MockDriver;

    #[test]
    fn substrate_is_cached_per_driver() {
        let material = Material::new(LightingModel::Phong);
        let driver = MockDriver::new();
        let a = material.substrate(&driver).unwrap();
        let b = material.substrate(&driver).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(driver.material_substrate_count(), 1);
        assert_eq!(a.lighting_model(), LightingModel::Phong);

        let other = MockDriver::new();
        material.substrate(&other).unwrap();
        assert_eq!(other.material_substrate_count(), 1);
    }

    #[test]
    fn invalidate_substrates_forces_rebuild() {
        let mut material = Material::new(LightingModel::Lambert);
        let driver = MockDriver::new();
        material.substrate(&driver).unwrap();
        material.set_lighting_model(LightingModel::Constant);
        material.invalidate_substrates();
        let rebuilt = material.substrate(&driver).unwrap();
        assert_eq!(driver.material_substrate_count(), 2);
        assert_eq!(rebuilt.lighting_model(), LightingModel::Constant);
    }

    #[test]
    fn clone_gets_new_identity_and_empty_cache() {
        let material = Material::new(LightingModel::Blinn).with_name("brick");
        let driver = MockDriver::new();
        material.substrate(&driver).unwrap();

        let copy = material.clone();
        assert_ne!(copy.id(), material.id());
        assert_eq!(copy.name(), "brick");
        copy.substrate(&driver).unwrap();
        assert_eq!(driver.material_substrate_count(), 2);
    }

    #[test]
    fn transparency_sources() {
        let mut material = Material::new(LightingModel::Constant);
        assert!(!material.is_transparent());

        material.set_transparency(0.5);
        assert!(material.is_transparent());

        material.set_transparency(1.0);
        material.set_diffuse_color(Vec4::new(1.0, 1.0, 1.0, 0.9));
        assert!(material.is_transparent());

        material.set_diffuse_color(Vec4::ONE);
        material.fade_from(Arc::new(Material::new(LightingModel::Constant)));
        assert!(material.is_transparent());
        material.finish_fade();
        assert!(!material.is_transparent());
    }

    #[test]
    fn shader_key_tracks_model_and_lights() {
        let mut material = Material::new(LightingModel::Lambert);
        let base = material.shader_key(7);
        assert_eq!(base, material.clone().shader_key(7));
        assert_ne!(base, material.shader_key(8));

        // Same program with or without a texture.
        material.set_diffuse_texture(Some(Arc::new(Texture::pending("t", 1, 1))));
        assert_eq!(base, material.shader_key(7));

        let mut phong = Material::new(LightingModel::Phong);
        phong.set_diffuse_texture(material.diffuse().texture.clone());
        assert_ne!(material.shader_key(7), phong.shader_key(7));
    }

    #[test]
    fn texture_key_depends_on_texture_identity() {
        let mut a = Material::new(LightingModel::Lambert);
        let mut b = Material::new(LightingModel::Phong);
        assert_eq!(a.texture_key(), b.texture_key());

        let shared = Arc::new(Texture::from_rgba8("wood", 1, 1, vec![0; 4]));
        a.set_diffuse_texture(Some(Arc::clone(&shared)));
        b.set_diffuse_texture(Some(shared));
        assert_eq!(a.texture_key(), b.texture_key());

        b.set_diffuse_texture(Some(Arc::new(Texture::from_rgba8("wood", 1, 1, vec![0; 4]))));
        assert_ne!(a.texture_key(), b.texture_key());
    }

    #[test]
    fn transparency_is_clamped() {
        let mut material = Material::default();
        material.set_transparency(3.0);
        assert_eq!(material.transparency(), 1.0);
        material.set_transparency(-1.0);
        assert_eq!(material.transparency(), 0.0);
    }
}
