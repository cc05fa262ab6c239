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

//! The device-backed [`Driver`].
//!
//! A [`DeviceDriver`] owns everything substrates of one device share: the bind
//! group layouts of the four groups, the pipeline layout, the compiled shader
//! programs, uploaded textures, the fallback texture and the sampler.

use crate::shaders;
use crate::substrate::{DeviceGeometrySubstrate, DeviceMaterialSubstrate};
use ahash::AHashMap;
use std::borrow::Cow;
use std::num::NonZeroU64;
use std::sync::{Arc, Mutex, MutexGuard};
use strata_core::geometry::Geometry;
use strata_core::material::{LightingModel, Material, Texture, TextureUid};
use strata_core::renderer::api::{
    command::{
        BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutDescriptor,
        BindGroupLayoutEntry, BindGroupLayoutId,
    },
    core::SubstrateSettings,
    pipeline::{PipelineLayoutDescriptor, PipelineLayoutId},
    resource::{
        AddressMode, Extent3D, FilterMode, Origin3D, SamplerDescriptor, SamplerId,
        ShaderFunction, ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData,
        TextureDescriptor, TextureDimension, TextureId, TextureUsage, TextureViewDescriptor,
        TextureViewId,
    },
    scene::{LightingUniforms, MaterialUniforms, ViewUniforms},
    util::{SampleCount, ShaderStageFlags, TextureFormat},
};
use strata_core::renderer::{
    Driver, DriverId, GeometrySubstrate, GraphicsDevice, MaterialSubstrate, RenderTarget,
    ResourceError, SubstrateError,
};

/// The bind group layouts of the shared binding contract, by group index.
#[derive(Debug, Clone, Copy)]
pub struct BindGroupLayouts {
    /// Group 0: view uniforms.
    pub view: BindGroupLayoutId,
    /// Group 1: material uniforms.
    pub material: BindGroupLayoutId,
    /// Group 2: lighting uniforms.
    pub lighting: BindGroupLayoutId,
    /// Group 3: diffuse texture, specular texture, sampler.
    pub textures: BindGroupLayoutId,
}

impl BindGroupLayouts {
    fn as_array(&self) -> [BindGroupLayoutId; 4] {
        [self.view, self.material, self.lighting, self.textures]
    }
}

/// The vertex and fragment functions of a lighting model's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProgram {
    /// Vertex stage.
    pub vertex: ShaderFunction,
    /// Fragment stage.
    pub fragment: ShaderFunction,
}

#[derive(Debug, Clone, Copy)]
struct UploadedTexture {
    texture: TextureId,
    view: TextureViewId,
}

impl UploadedTexture {
    fn destroy(self, device: &dyn GraphicsDevice) {
        if let Err(e) = device.destroy_texture_view(self.view) {
            log::warn!("DeviceDriver: failed to destroy texture view: {e}");
        }
        if let Err(e) = device.destroy_texture(self.texture) {
            log::warn!("DeviceDriver: failed to destroy texture: {e}");
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedTexture {
    uploaded: UploadedTexture,
    users: usize,
}

/// Uploaded textures of one driver, counted by the substrates binding them.
///
/// An entry is destroyed when its last user releases it.
#[derive(Debug)]
pub(crate) struct TextureCache {
    device: Arc<dyn GraphicsDevice>,
    entries: Mutex<AHashMap<TextureUid, CachedTexture>>,
}

impl TextureCache {
    fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            entries: Mutex::new(AHashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, AHashMap<TextureUid, CachedTexture>>, ResourceError> {
        self.entries.lock().map_err(|_| {
            ResourceError::BackendError("DeviceDriver: texture cache lock poisoned".to_string())
        })
    }

    fn acquire(&self, texture: &Texture) -> Result<TextureViewId, ResourceError> {
        let mut entries = self.lock()?;
        if let Some(cached) = entries.get_mut(&texture.id()) {
            cached.users += 1;
            return Ok(cached.uploaded.view);
        }

        let pixels = texture.pixels().ok_or(ResourceError::NotFound)?;
        if texture.width() == 0 || texture.height() == 0 || pixels.len() < texture.expected_len() {
            return Err(ResourceError::OutOfBounds);
        }
        let uploaded = DeviceDriver::upload(
            self.device.as_ref(),
            texture.label(),
            texture.width(),
            texture.height(),
            &pixels[..texture.expected_len()],
        )?;
        entries.insert(texture.id(), CachedTexture { uploaded, users: 1 });
        Ok(uploaded.view)
    }

    /// Drops one use of `uid`, destroying the texture with its last use.
    pub(crate) fn release(&self, uid: TextureUid) {
        let released = match self.lock() {
            Ok(mut entries) => match entries.get_mut(&uid) {
                Some(cached) if cached.users > 1 => {
                    cached.users -= 1;
                    None
                }
                Some(_) => entries.remove(&uid),
                None => None,
            },
            Err(e) => {
                log::warn!("{e}");
                None
            }
        };
        if let Some(cached) = released {
            log::debug!("DeviceDriver: texture {uid:?} released");
            cached.uploaded.destroy(self.device.as_ref());
        }
    }

    fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or_default()
    }

    fn drain(&self) -> Vec<UploadedTexture> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.drain().map(|(_, cached)| cached.uploaded).collect()
    }
}

/// A [`Driver`] creating substrates on a [`GraphicsDevice`].
#[derive(Debug)]
pub struct DeviceDriver {
    id: DriverId,
    device: Arc<dyn GraphicsDevice>,
    target: RenderTarget,
    settings: SubstrateSettings,
    layouts: BindGroupLayouts,
    pipeline_layout: PipelineLayoutId,
    sampler: SamplerId,
    fallback: UploadedTexture,
    programs: Mutex<AHashMap<LightingModel, ShaderModuleId>>,
    textures: Arc<TextureCache>,
}

impl DeviceDriver {
    /// Creates the shared layouts, the sampler and the 1x1 white fallback texture.
    ///
    /// # Arguments
    ///
    /// * `device` - The device every substrate of this driver allocates on.
    /// * `target` - Attachment formats pipelines are prebuilt for.
    /// * `settings` - Substrate tunables, sanitized before use.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if any shared resource cannot be created.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        target: RenderTarget,
        settings: SubstrateSettings,
    ) -> Result<Self, ResourceError> {
        let settings = settings.sanitized();
        log::info!(
            "DeviceDriver: initializing on '{}' ({} frames in flight)",
            device.get_adapter_info().name,
            settings.frames_in_flight
        );

        let layouts = Self::create_layouts(device.as_ref())?;
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(Cow::Borrowed("Substrate Pipeline Layout")),
            bind_group_layouts: &layouts.as_array(),
        })?;

        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some(Cow::Borrowed("Material Sampler")),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Nearest,
        })?;

        let fallback = Self::upload(device.as_ref(), "Fallback White", 1, 1, &[255; 4])?;

        Ok(Self {
            id: DriverId::unique(),
            textures: Arc::new(TextureCache::new(Arc::clone(&device))),
            device,
            target,
            settings,
            layouts,
            pipeline_layout,
            sampler,
            fallback,
            programs: Mutex::new(AHashMap::new()),
        })
    }

    fn create_layouts(device: &dyn GraphicsDevice) -> Result<BindGroupLayouts, ResourceError> {
        let uniform_layout = |label: &str, size: usize| {
            device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[BindGroupLayoutEntry::uniform_buffer(
                    0,
                    ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
                    true,
                    NonZeroU64::new(size as u64),
                )],
            })
        };

        let view = uniform_layout("View Layout", std::mem::size_of::<ViewUniforms>())?;
        let material = uniform_layout("Material Layout", std::mem::size_of::<MaterialUniforms>())?;
        let lighting = uniform_layout("Lighting Layout", std::mem::size_of::<LightingUniforms>())?;
        let textures = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Texture Layout"),
            entries: &[
                BindGroupLayoutEntry::texture_2d(0, ShaderStageFlags::FRAGMENT),
                BindGroupLayoutEntry::texture_2d(1, ShaderStageFlags::FRAGMENT),
                BindGroupLayoutEntry::sampler(2, ShaderStageFlags::FRAGMENT),
            ],
        })?;

        Ok(BindGroupLayouts {
            view,
            material,
            lighting,
            textures,
        })
    }

    fn upload(
        device: &dyn GraphicsDevice,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<UploadedTexture, ResourceError> {
        let size = Extent3D {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(Cow::Borrowed(label)),
            size,
            mip_level_count: 1,
            sample_count: SampleCount::X1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;
        device.write_texture(texture, pixels, Some(width * 4), Origin3D::default(), size)?;
        let view = device.create_texture_view(texture, &TextureViewDescriptor::default())?;
        Ok(UploadedTexture { texture, view })
    }

    /// The device substrates allocate on.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// The target pipelines are prebuilt for.
    pub fn target(&self) -> RenderTarget {
        self.target
    }

    /// The sanitized settings.
    pub fn settings(&self) -> &SubstrateSettings {
        &self.settings
    }

    /// The shared bind group layouts.
    pub fn layouts(&self) -> &BindGroupLayouts {
        &self.layouts
    }

    /// The pipeline layout every substrate pipeline uses.
    pub fn pipeline_layout(&self) -> PipelineLayoutId {
        self.pipeline_layout
    }

    /// The 1x1 white texture bound in place of missing textures.
    pub fn fallback_texture_view(&self) -> TextureViewId {
        self.fallback.view
    }

    /// Returns the program drawing `model`, compiling it on first request.
    ///
    /// ## Errors
    ///
    /// Returns the device's [`ResourceError`] if compilation fails; the next
    /// request retries.
    pub fn shader_program(&self, model: LightingModel) -> Result<ShaderProgram, ResourceError> {
        let mut programs = self.programs.lock().map_err(|_| {
            ResourceError::BackendError("DeviceDriver: shader cache lock poisoned".to_string())
        })?;
        let module = match programs.get(&model) {
            Some(module) => *module,
            None => {
                log::debug!("DeviceDriver: compiling {} program", shaders::label_for(model));
                let module = self.device.create_shader_module(&ShaderModuleDescriptor {
                    label: Some(shaders::label_for(model)),
                    source: ShaderSourceData::Wgsl(Cow::Borrowed(shaders::source_for(model))),
                })?;
                programs.insert(model, module);
                module
            }
        };
        Ok(ShaderProgram {
            vertex: ShaderFunction::new(module, shaders::VERTEX_ENTRY_POINT),
            fragment: ShaderFunction::new(module, shaders::FRAGMENT_ENTRY_POINT),
        })
    }

    /// Returns a view of `texture` on this device, uploading it on first request.
    ///
    /// Every successful call counts as one use; pair it with
    /// [`release_texture`](Self::release_texture).
    ///
    /// ## Errors
    ///
    /// Returns [`ResourceError::NotFound`] if the texture has no pixels yet,
    /// [`ResourceError::OutOfBounds`] if its pixels do not cover its size, or
    /// the device's error if the upload fails. Callers fall back to
    /// [`fallback_texture_view`](Self::fallback_texture_view).
    pub fn bind_texture(&self, texture: &Texture) -> Result<TextureViewId, ResourceError> {
        self.textures.acquire(texture)
    }

    /// Drops one use of a texture bound with [`bind_texture`](Self::bind_texture).
    /// The GPU texture is destroyed with its last use.
    pub fn release_texture(&self, uid: TextureUid) {
        self.textures.release(uid);
    }

    /// Number of textures currently uploaded, the fallback excluded.
    pub fn uploaded_textures(&self) -> usize {
        self.textures.len()
    }

    pub(crate) fn texture_cache(&self) -> Arc<TextureCache> {
        Arc::clone(&self.textures)
    }

    /// Creates a group 3 bind group for two texture views and the sampler.
    ///
    /// ## Errors
    ///
    /// Returns the device's [`ResourceError`] if creation fails.
    pub fn create_texture_bind_group(
        &self,
        label: &str,
        diffuse: TextureViewId,
        specular: TextureViewId,
    ) -> Result<BindGroupId, ResourceError> {
        self.device.create_bind_group(&BindGroupDescriptor {
            label: Some(label),
            layout: self.layouts.textures,
            entries: &[
                BindGroupEntry::texture_view(0, diffuse),
                BindGroupEntry::texture_view(1, specular),
                BindGroupEntry::sampler(2, self.sampler),
            ],
        })
    }
}

impl Driver for DeviceDriver {
    fn id(&self) -> DriverId {
        self.id
    }

    fn new_geometry_substrate(
        &self,
        geometry: &Geometry,
    ) -> Result<Box<dyn GeometrySubstrate>, SubstrateError> {
        Ok(Box::new(DeviceGeometrySubstrate::new(self, geometry)?))
    }

    fn new_material_substrate(
        &self,
        material: &Material,
    ) -> Result<Arc<dyn MaterialSubstrate>, SubstrateError> {
        Ok(Arc::new(DeviceMaterialSubstrate::new(self, material)?))
    }
}

impl Drop for DeviceDriver {
    fn drop(&mut self) {
        let device = self.device.as_ref();
        let warn = |what: &str, result: Result<(), ResourceError>| {
            if let Err(e) = result {
                log::warn!("DeviceDriver: failed to destroy {what}: {e}");
            }
        };

        for uploaded in self.textures.drain().into_iter().chain(std::iter::once(self.fallback)) {
            uploaded.destroy(device);
        }

        let programs = match self.programs.get_mut() {
            Ok(programs) => std::mem::take(programs),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        };
        for module in programs.into_values() {
            warn("shader module", device.destroy_shader_module(module));
        }

        warn("sampler", device.destroy_sampler(self.sampler));
        warn("pipeline layout", device.destroy_pipeline_layout(self.pipeline_layout));
        for layout in self.layouts.as_array() {
            warn("bind group layout", device.destroy_bind_group_layout(layout));
        }
    }
}
