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

//! Renders a few stereo frames offscreen: an opaque floor, a transparent
//! panel in front of it, and a material crossfade on the panel.
//!
//! An optional first argument names a JSON file of substrate settings.

use anyhow::{Context, Result};
use glam::{Mat4, Vec3, Vec4};
use std::sync::Arc;
use strata_core::geometry::{
    GeometryElement, GeometryPrimitiveType, GeometrySemantic, GeometrySource, SourceLayout,
    VertexData,
};
use strata_core::material::{LightingModel, Material};
use strata_core::renderer::{
    hash_lights, Color, CommandEncoder, EyeType, GraphicsDevice, Light, LoadOp, NodeSortInfo,
    Operations, RenderContext, RenderPassColorAttachment, RenderPassDepthStencilAttachment,
    RenderPassDescriptor, RenderTarget, SortKey, StoreOp, SubstrateSettings,
};
use strata_core::Geometry;
use strata_infra::graphics::wgpu::{WgpuDevice, WgpuGraphicsContext};
use strata_render::DeviceDriver;

const FRAMES: u64 = 6;
const FADE_START: u64 = 2;
const FADE_END: u64 = 4;
const EYE_SEPARATION: f32 = 0.064;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

const STRIDE: usize = std::mem::size_of::<Vertex>();

/// A unit quad in the XY plane facing +Z, scaled by `size`.
fn quad(name: &str, size: f32, material: Material) -> Result<Geometry> {
    let corners: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
    let vertices: Vec<Vertex> = corners
        .iter()
        .map(|[x, y]| Vertex {
            position: [x * size, y * size, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [(x + 1.0) * 0.5, (1.0 - y) * 0.5],
        })
        .collect();
    let data = VertexData::from_pod(&vertices);
    let count = vertices.len();
    let sources = vec![
        GeometrySource::new(data.clone(), GeometrySemantic::Vertex, SourceLayout::f32(count, 3, 0, STRIDE)),
        GeometrySource::new(data.clone(), GeometrySemantic::Normal, SourceLayout::f32(count, 3, 12, STRIDE)),
        GeometrySource::new(data, GeometrySemantic::Texcoord, SourceLayout::f32(count, 2, 24, STRIDE)),
    ];
    let element = GeometryElement::from_u16(&[0, 1, 2, 0, 2, 3], GeometryPrimitiveType::Triangle, 2);
    Ok(Geometry::new(sources, vec![element], vec![Arc::new(material)])?.with_name(name))
}

struct Node {
    id: u64,
    transform: Mat4,
    geometry: Geometry,
}

fn load_settings() -> Result<SubstrateSettings> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings from {path}"))?;
            Ok(SubstrateSettings::from_json_str(&json)?)
        }
        None => Ok(SubstrateSettings::default()),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let settings = load_settings()?;
    let context = WgpuGraphicsContext::headless_blocking()?;
    let device = WgpuDevice::new(context);
    let target = RenderTarget::default();
    let views = device.create_render_target_texture(512, 512, target)?;
    let driver = DeviceDriver::new(Arc::new(device.clone()), target, settings)?;
    log::info!("Adapter: {:?}", device.get_adapter_info());

    let mut floor_material = Material::new(LightingModel::Blinn).with_name("floor");
    floor_material.set_diffuse_color(Vec4::new(0.6, 0.6, 0.6, 1.0));
    floor_material.set_specular_color(Vec4::ONE);
    floor_material.set_shininess(24.0);

    let mut panel_material = Material::new(LightingModel::Lambert).with_name("panel");
    panel_material.set_diffuse_color(Vec4::new(0.9, 0.2, 0.2, 0.5));

    let mut nodes = vec![
        Node {
            id: 1,
            transform: Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            geometry: quad("floor", 4.0, floor_material)?.with_rendering_order(-1),
        },
        Node {
            id: 2,
            transform: Mat4::from_translation(Vec3::new(0.0, 0.5, 1.0)),
            geometry: quad("panel", 0.5, panel_material)?,
        },
    ];

    let head = Vec3::new(0.0, 1.5, 4.0);
    let projection = Mat4::perspective_rh(70f32.to_radians(), 1.0, 0.05, 50.0);
    let lights = vec![
        Light::ambient(Vec3::splat(0.05)),
        Light::directional(Vec3::ONE, Vec3::new(-0.3, -1.0, -0.2).normalize()),
        Light::omni(Vec3::new(1.0, 0.8, 0.6), Vec3::new(0.0, 2.0, 1.5), 1.0, 6.0),
    ];
    let lights_hash = hash_lights(&lights);

    for frame in 0..FRAMES {
        let panel = &mut nodes[1].geometry;
        if frame == FADE_START {
            let mut next = Material::new(LightingModel::Phong).with_name("panel-lit");
            next.set_diffuse_color(Vec4::new(0.2, 0.3, 0.9, 1.0));
            next.fade_from(Arc::clone(panel.get_material_for_element(0)?));
            panel.set_materials(vec![Arc::new(next)])?;
        }
        if frame == FADE_END {
            match panel.get_materials_mut().first_mut().and_then(Arc::get_mut) {
                Some(material) => material.finish_fade(),
                None => log::warn!("Frame {frame}: panel material is shared, crossfade kept"),
            }
        }

        let mut keys: Vec<SortKey> = Vec::new();
        for node in &mut nodes {
            node.geometry.update_sort_keys(
                &NodeSortInfo {
                    id: node.id,
                    world_transform: node.transform,
                    opacity: 1.0,
                    camera_position: head,
                },
                lights_hash,
            );
            node.geometry.get_sort_keys(&mut keys);
        }
        keys.sort();

        let mut encoder = device.create_command_encoder(Some("Sandbox Frame"));
        {
            let color = [RenderPassColorAttachment {
                view: views.color,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(Color::BLACK),
                    store: StoreOp::Store,
                },
            }];
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Sandbox Pass"),
                color_attachments: &color,
                depth_stencil_attachment: views.depth.map(|view| RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                }),
            });

            for (eye, offset) in [(EyeType::Left, -EYE_SEPARATION), (EyeType::Right, EYE_SEPARATION)] {
                let position = head + Vec3::X * (offset * 0.5);
                let view = Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y);
                let mut context = RenderContext::new(frame, eye, target).with_camera(view, projection, position);
                context.monocular_view_matrix = Mat4::look_at_rh(head, Vec3::ZERO, Vec3::Y);
                context.set_lights(lights.clone());

                for key in &keys {
                    let Some(node) = nodes.iter_mut().find(|n| n.id == key.node) else {
                        continue;
                    };
                    let index = key.element_index as usize;
                    let material = Arc::clone(node.geometry.get_material_for_element(index)?);
                    if let Err(e) = node.geometry.render(
                        index,
                        &material,
                        node.transform,
                        1.0,
                        &context,
                        pass.as_mut(),
                        &driver,
                    ) {
                        log::error!("Frame {frame}: {} skipped: {e}", node.geometry.name());
                    }
                }
            }
        }
        device.submit_command_buffer(encoder.finish());
        log::info!(
            "Frame {frame}: {} draws submitted, {} KiB of GPU memory in use",
            keys.len() * 2,
            device.vram_allocated_bytes() / 1024
        );
    }

    drop(nodes);
    views.destroy(&device);
    log::info!("Peak GPU memory: {} KiB", device.vram_peak_bytes() / 1024);
    Ok(())
}
