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

//! Device-backed material substrate.

use crate::driver::{DeviceDriver, ShaderProgram, TextureCache};
use std::sync::Arc;
use strata_core::material::{LightingModel, Material, Texture, TextureUid};
use strata_core::renderer::api::{
    command::BindGroupId,
    resource::{ShaderFunction, TextureViewId},
    scene::{LightUniform, LightingUniforms, MaterialUniforms, MAX_LIGHTS},
    util::{ConcurrentBuffer, UniformBinding},
};
use strata_core::renderer::{
    EyeType, GraphicsDevice, Light, LightType, MaterialSubstrate, ResourceError, SubstrateError,
};

/// Builds the material uniforms `model` reads.
///
/// Constant and Lambert leave the specular terms zeroed. The alpha is the
/// product of the material transparency, the diffuse alpha and `opacity`.
pub fn material_uniforms(model: LightingModel, material: &Material, opacity: f32) -> MaterialUniforms {
    let diffuse = material.diffuse();
    let alpha = material.transparency() * diffuse.color.w * opacity;
    let mut uniforms = MaterialUniforms {
        diffuse_color: diffuse.color.to_array(),
        specular_color: [0.0; 4],
        ambient_color: material.ambient_color().extend(1.0).to_array(),
        params: [0.0, alpha, diffuse.intensity, 0.0],
    };
    if matches!(model, LightingModel::Phong | LightingModel::Blinn) {
        let specular = material.specular();
        uniforms.specular_color = specular.color.to_array();
        uniforms.params[0] = material.shininess();
        uniforms.params[3] = specular.intensity;
    }
    uniforms
}

/// Formats `lights` for `model`.
///
/// Ambient lights are summed for every model. Constant carries nothing else;
/// Lambert carries each other light with a specular weight of 0, Phong and
/// Blinn with 1. Lights past [`MAX_LIGHTS`] are dropped.
pub fn lighting_uniforms(model: LightingModel, lights: &[Light]) -> LightingUniforms {
    let mut uniforms = LightingUniforms::default();
    let mut ambient = glam::Vec3::ZERO;
    let mut count = 0;
    let mut dropped = 0;

    for light in lights {
        if light.kind == LightType::Ambient {
            ambient += light.color;
            continue;
        }
        if model == LightingModel::Constant {
            continue;
        }
        if count == MAX_LIGHTS {
            dropped += 1;
            continue;
        }
        let specular_weight = if model == LightingModel::Lambert { 0.0 } else { 1.0 };
        uniforms.lights[count] = LightUniform {
            color: light.color.extend(light.kind.gpu_kind()).to_array(),
            position: light.position.extend(light.attenuation_start).to_array(),
            direction: light.direction.extend(light.attenuation_end).to_array(),
            params: [
                light.attenuation_falloff,
                light.spot_inner_angle.cos(),
                light.spot_outer_angle.cos(),
                specular_weight,
            ],
        };
        count += 1;
    }

    if dropped > 0 {
        log::debug!("MaterialSubstrate: {dropped} lights past the limit of {MAX_LIGHTS} dropped");
    }
    uniforms.ambient_color = ambient.extend(1.0).to_array();
    uniforms.num_lights = count as u32;
    uniforms
}

/// The GPU realization of a [`Material`] on a [`DeviceDriver`]'s device.
#[derive(Debug)]
pub struct DeviceMaterialSubstrate {
    device: Arc<dyn GraphicsDevice>,
    model: LightingModel,
    program: ShaderProgram,
    material_buffer: ConcurrentBuffer,
    lighting_buffer: ConcurrentBuffer,
    textures: Vec<TextureViewId>,
    texture_bind_group: BindGroupId,
    texture_cache: Arc<TextureCache>,
    bound_textures: Vec<TextureUid>,
}

impl DeviceMaterialSubstrate {
    /// Selects the program for the material's lighting model, allocates its
    /// uniform buffers and binds its textures.
    ///
    /// A texture the driver cannot bind is replaced by the fallback texture.
    /// Bound textures stay uploaded until the substrate is dropped.
    ///
    /// ## Errors
    ///
    /// Returns a [`SubstrateError`] if the program or a buffer cannot be created.
    pub fn new(driver: &DeviceDriver, material: &Material) -> Result<Self, SubstrateError> {
        let device = Arc::clone(driver.device());
        let settings = driver.settings();
        let model = material.lighting_model();
        let program = driver.shader_program(model)?;
        let label = if material.name().is_empty() {
            format!("Material {}", material.id().0)
        } else {
            material.name().to_string()
        };

        let material_buffer = ConcurrentBuffer::new(
            device.as_ref(),
            driver.layouts().material,
            0,
            std::mem::size_of::<MaterialUniforms>() as u64,
            settings.frames_in_flight,
            settings.uniform_entries_per_slot,
            format!("{label} Material"),
        )?;
        let lighting_buffer = match ConcurrentBuffer::new(
            device.as_ref(),
            driver.layouts().lighting,
            0,
            std::mem::size_of::<LightingUniforms>() as u64,
            settings.frames_in_flight,
            settings.uniform_entries_per_slot,
            format!("{label} Lighting"),
        ) {
            Ok(buffer) => buffer,
            Err(e) => {
                material_buffer.destroy(device.as_ref());
                return Err(e.into());
            }
        };

        let texture_cache = driver.texture_cache();
        let mut bound_textures = Vec::new();
        let mut bind = |texture: Option<&Arc<Texture>>| match texture {
            Some(texture) => match driver.bind_texture(texture) {
                Ok(view) => {
                    bound_textures.push(texture.id());
                    view
                }
                Err(e) => {
                    log::warn!(
                        "MaterialSubstrate: texture '{}' of '{}' unavailable ({}), using fallback",
                        texture.label(),
                        label,
                        e
                    );
                    driver.fallback_texture_view()
                }
            },
            None => driver.fallback_texture_view(),
        };
        let diffuse = bind(material.diffuse().texture.as_ref());
        let textures = match model {
            LightingModel::Constant | LightingModel::Lambert => vec![diffuse],
            LightingModel::Phong | LightingModel::Blinn => {
                vec![diffuse, bind(material.specular().texture.as_ref())]
            }
        };
        let specular = textures
            .get(1)
            .copied()
            .unwrap_or_else(|| driver.fallback_texture_view());

        let texture_bind_group = match driver.create_texture_bind_group(&label, diffuse, specular) {
            Ok(group) => group,
            Err(e) => {
                material_buffer.destroy(device.as_ref());
                lighting_buffer.destroy(device.as_ref());
                for uid in bound_textures {
                    texture_cache.release(uid);
                }
                return Err(e.into());
            }
        };

        Ok(Self {
            device,
            model,
            program,
            material_buffer,
            lighting_buffer,
            textures,
            texture_bind_group,
            texture_cache,
            bound_textures,
        })
    }
}

impl MaterialSubstrate for DeviceMaterialSubstrate {
    fn lighting_model(&self) -> LightingModel {
        self.model
    }

    fn vertex_program(&self) -> ShaderFunction {
        self.program.vertex
    }

    fn fragment_program(&self) -> ShaderFunction {
        self.program.fragment
    }

    fn bind_material_uniforms(
        &self,
        material: &Material,
        opacity: f32,
        eye: EyeType,
        frame: u64,
    ) -> Result<UniformBinding, ResourceError> {
        let uniforms = material_uniforms(self.model, material, opacity);
        self.material_buffer
            .write(self.device.as_ref(), eye, frame, bytemuck::bytes_of(&uniforms))
    }

    fn bind_lighting_uniforms(
        &self,
        lights: &[Light],
        eye: EyeType,
        frame: u64,
    ) -> Result<UniformBinding, ResourceError> {
        let uniforms = lighting_uniforms(self.model, lights);
        self.lighting_buffer
            .write(self.device.as_ref(), eye, frame, bytemuck::bytes_of(&uniforms))
    }

    fn textures(&self) -> &[TextureViewId] {
        &self.textures
    }

    fn texture_bind_group(&self) -> BindGroupId {
        self.texture_bind_group
    }
}

impl Drop for DeviceMaterialSubstrate {
    fn drop(&mut self) {
        let device = self.device.as_ref();
        self.material_buffer.destroy(device);
        self.lighting_buffer.destroy(device);
        if let Err(e) = device.destroy_bind_group(self.texture_bind_group) {
            log::warn!("MaterialSubstrate: failed to destroy texture bind group: {e}");
        }
        for uid in self.bound_textures.drain(..) {
            self.texture_cache.release(uid);
        }
    }
}
