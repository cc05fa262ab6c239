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

mod common;

use common::*;
use glam::Mat4;
use std::sync::Arc;
use strata_core::geometry::{
    GeometryElement, GeometryPrimitiveType, GeometrySemantic, GeometrySource, SourceLayout,
    VertexData,
};
use strata_core::material::{LightingModel, Material, Texture};
use strata_core::renderer::api::*;
use strata_core::renderer::{
    EyeType, GeometryError, MaterialSubstrate, RenderContext, RenderTarget, SubstrateError,
};
use strata_core::Geometry;

fn context() -> RenderContext {
    RenderContext::new(0, EyeType::Monocular, RenderTarget::default())
}

#[test]
fn interleaved_sources_share_one_vertex_buffer() {
    init_logging();
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let mut geometry = quad(vec![named("a")]);

    geometry.prewarm(&driver).unwrap();

    let vertex_buffers = device.buffers_with_usage(BufferUsage::VERTEX);
    assert_eq!(vertex_buffers.len(), 1);
    assert_eq!(vertex_buffers[0].size, 4 * 32);
    let index_buffers = device.buffers_with_usage(BufferUsage::INDEX);
    assert_eq!(index_buffers.len(), 1);
    assert_eq!(index_buffers[0].size, 12);
    assert_eq!(device.pipelines()[0].vertex_buffers, 1);
}

#[test]
fn separate_data_gets_its_own_vertex_buffer() {
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let positions = VertexData::from_pod(&[0.0f32; 12]);
    let colors = VertexData::from_pod(&[1.0f32; 16]);
    let sources = vec![
        GeometrySource::new(positions, GeometrySemantic::Vertex, SourceLayout::f32(4, 3, 0, 12)),
        GeometrySource::new(colors, GeometrySemantic::Color, SourceLayout::f32(4, 4, 0, 16)),
    ];
    let mut geometry = Geometry::new(sources, vec![quad_element()], vec![named("a")]).unwrap();

    geometry.prewarm(&driver).unwrap();

    let sizes: Vec<u64> = device
        .buffers_with_usage(BufferUsage::VERTEX)
        .iter()
        .map(|b| b.size)
        .collect();
    assert_eq!(sizes, vec![48, 64]);
    assert_eq!(device.pipelines()[0].vertex_buffers, 2);
}

#[test]
fn stride_mismatch_fails_the_build_without_leaking() {
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let data = VertexData::new(vec![0u8; 128]);
    let sources = vec![
        GeometrySource::new(data.clone(), GeometrySemantic::Vertex, SourceLayout::f32(4, 3, 0, 32)),
        GeometrySource::new(data, GeometrySemantic::Normal, SourceLayout::f32(4, 3, 12, 24)),
    ];
    let mut geometry = Geometry::new(sources, vec![quad_element()], vec![named("a")]).unwrap();

    let err = geometry.prewarm(&driver).unwrap_err();
    assert!(matches!(
        err,
        GeometryError::Substrate(SubstrateError::StrideMismatch { expected: 32, found: 24, .. })
    ));
    assert!(!geometry.has_substrate());
    assert!(device.buffers_with_usage(BufferUsage::VERTEX).is_empty());
}

#[test]
fn unsupported_component_layout_is_rejected() {
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let layout = SourceLayout {
        bytes_per_component: 1,
        float_components: false,
        ..SourceLayout::f32(4, 4, 0, 4)
    };
    let sources = vec![GeometrySource::new(
        VertexData::new(vec![0u8; 16]),
        GeometrySemantic::Color,
        layout,
    )];
    let mut geometry = Geometry::new(sources, vec![quad_element()], vec![named("a")]).unwrap();

    let err = geometry.prewarm(&driver).unwrap_err();
    assert!(matches!(
        err,
        GeometryError::Substrate(SubstrateError::UnsupportedVertexLayout {
            semantic: GeometrySemantic::Color,
            bytes_per_component: 1,
            components_per_vertex: 4,
        })
    ));
}

#[test]
fn short_index_data_is_rejected() {
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let element = GeometryElement::from_u16(&[0, 1, 2], GeometryPrimitiveType::Triangle, 2);
    let mut geometry = Geometry::new(quad_sources(), vec![element], vec![named("a")]).unwrap();

    let err = geometry.prewarm(&driver).unwrap_err();
    assert!(matches!(
        err,
        GeometryError::Substrate(SubstrateError::InvalidIndexData {
            element: 0,
            expected: 12,
            found: 6,
        })
    ));
}

#[test]
fn index_counts_follow_the_primitive_type() {
    init_logging();
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let element = |kind: GeometryPrimitiveType| {
        let indices: Vec<u16> = (0..kind.index_count(10) as u16).map(|i| i % 4).collect();
        GeometryElement::from_u16(&indices, kind, 10)
    };
    let elements = vec![
        element(GeometryPrimitiveType::Triangle),
        element(GeometryPrimitiveType::TriangleStrip),
        element(GeometryPrimitiveType::Line),
        element(GeometryPrimitiveType::Point),
    ];
    let mut geometry = Geometry::new(quad_sources(), elements, vec![named("a")]).unwrap();
    let mut pass = RecordingPass::default();

    geometry
        .render_elements(Mat4::IDENTITY, 1.0, &context(), &mut pass, &driver)
        .unwrap();

    assert_eq!(pass.draws(), vec![0..30, 0..12, 0..20, 0..10]);
    let pipelines = device.pipelines();
    let strip = pipelines
        .iter()
        .find(|p| p.topology == PrimitiveTopology::TriangleStrip)
        .unwrap();
    assert_eq!(strip.strip_index_format, Some(IndexFormat::Uint16));
    assert!(pipelines
        .iter()
        .filter(|p| p.topology != PrimitiveTopology::TriangleStrip)
        .all(|p| p.strip_index_format.is_none()));
}

#[test]
fn pipelines_blend_and_follow_material_depth_settings() {
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let mut overlay = Material::default().with_name("overlay");
    overlay.set_reads_from_depth_buffer(false);
    overlay.set_writes_to_depth_buffer(false);
    let mut geometry = quad(vec![named("opaque")]);
    let mut hud = quad(vec![Arc::new(overlay)]);

    geometry.prewarm(&driver).unwrap();
    hud.prewarm(&driver).unwrap();

    let pipelines = device.pipelines();
    assert_eq!(pipelines.len(), 2);
    let opaque = pipelines[0].depth.unwrap();
    assert!(opaque.depth_write_enabled);
    assert_eq!(opaque.depth_compare, CompareFunction::Less);
    let overlay = pipelines[1].depth.unwrap();
    assert!(!overlay.depth_write_enabled);
    assert_eq!(overlay.depth_compare, CompareFunction::Always);
    assert!(pipelines
        .iter()
        .all(|p| p.blend == Some(BlendStateDescriptor::ALPHA_BLENDING)));
}

#[test]
fn targets_without_depth_get_their_own_pipeline() {
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let mut geometry = quad(vec![named("a")]);
    let target = RenderTarget {
        depth_stencil_format: None,
        ..RenderTarget::default()
    };
    let context = RenderContext::new(0, EyeType::Monocular, target);
    let mut pass = RecordingPass::default();

    geometry
        .render_elements(Mat4::IDENTITY, 1.0, &context, &mut pass, &driver)
        .unwrap();
    geometry
        .render_elements(Mat4::IDENTITY, 1.0, &context, &mut pass, &driver)
        .unwrap();

    let pipelines = device.pipelines();
    assert_eq!(pipelines.len(), 2);
    assert!(pipelines[0].depth.is_some());
    assert!(pipelines[1].depth.is_none());
    assert_eq!(pass.pipelines(), vec![pipelines[1].id.unwrap(); 2]);
}

#[test]
fn failed_pipeline_skips_only_its_element() {
    init_logging();
    let device = RecordingDevice::new();
    device.fail_pipelines_with(PrimitiveTopology::LineList);
    let driver = driver(&device);
    let lines = GeometryElement::from_u16(&[0, 1, 1, 2], GeometryPrimitiveType::Line, 2);
    let mut geometry =
        Geometry::new(quad_sources(), vec![quad_element(), lines], vec![named("a")]).unwrap();
    let mut pass = RecordingPass::default();

    geometry
        .render_elements(Mat4::IDENTITY, 1.0, &context(), &mut pass, &driver)
        .unwrap();
    geometry
        .render_elements(Mat4::IDENTITY, 1.0, &context(), &mut pass, &driver)
        .unwrap();

    assert_eq!(pass.draws(), vec![0..6, 0..6]);
    let line_attempts = device
        .pipelines()
        .iter()
        .filter(|p| p.topology == PrimitiveTopology::LineList)
        .count();
    assert_eq!(line_attempts, 1);
}

#[test]
fn unavailable_textures_fall_back_to_white() {
    init_logging();
    let device = RecordingDevice::new();
    let driver = driver(&device);
    assert_eq!(device.texture_uploads(), 1);

    let checker = Arc::new(Texture::from_rgba8("checker", 2, 2, vec![255; 16]));
    let mut first = Material::new(LightingModel::Lambert);
    first.set_diffuse_texture(Some(checker.clone()));
    let mut second = Material::new(LightingModel::Constant);
    second.set_diffuse_texture(Some(checker));
    let mut streaming = Material::new(LightingModel::Phong);
    streaming.set_diffuse_texture(Some(Arc::new(Texture::pending("streaming", 4, 4))));

    let first = first.substrate(&driver).unwrap();
    let second = second.substrate(&driver).unwrap();
    let streaming = streaming.substrate(&driver).unwrap();

    assert_eq!(device.texture_uploads(), 2);
    assert_eq!(first.textures(), second.textures());
    assert_ne!(first.textures()[0], driver.fallback_texture_view());
    assert_eq!(
        streaming.textures(),
        &[driver.fallback_texture_view(), driver.fallback_texture_view()]
    );
}

#[test]
fn textures_are_destroyed_with_their_last_material() {
    init_logging();
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let checker = Arc::new(Texture::from_rgba8("checker", 2, 2, vec![255; 16]));

    let mut first = Material::new(LightingModel::Lambert);
    first.set_diffuse_texture(Some(checker.clone()));
    let mut second = Material::new(LightingModel::Blinn);
    second.set_diffuse_texture(Some(checker.clone()));
    second.set_specular_texture(Some(checker));
    first.substrate(&driver).unwrap();
    second.substrate(&driver).unwrap();

    let uploaded = device.textures()[1];
    assert_eq!(device.textures().len(), 2);
    assert_eq!(driver.uploaded_textures(), 1);

    drop(first);
    assert!(device.destroyed_textures().is_empty());

    drop(second);
    assert_eq!(device.destroyed_textures(), vec![uploaded]);
    assert_eq!(driver.uploaded_textures(), 0);

    drop(driver);
    assert_eq!(device.destroyed_textures(), vec![uploaded, device.textures()[0]]);
}

#[test]
fn programs_are_compiled_once_per_lighting_model() {
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let materials = [
        Material::new(LightingModel::Blinn),
        Material::new(LightingModel::Blinn),
        Material::new(LightingModel::Lambert),
    ];

    let substrates: Vec<_> = materials
        .iter()
        .map(|m| m.substrate(&driver).unwrap())
        .collect();

    assert_eq!(device.shader_modules(), 2);
    assert_eq!(substrates[0].vertex_program(), substrates[1].vertex_program());
    assert_ne!(substrates[0].vertex_program(), substrates[2].vertex_program());
    assert!(Arc::ptr_eq(&substrates[0], &materials[0].substrate(&driver).unwrap()));
}

#[test]
fn invalidated_substrate_is_released_and_rebuilt() {
    let device = RecordingDevice::new();
    let driver = driver(&device);
    let mut geometry = quad(vec![named("a")]);
    geometry.prewarm(&driver).unwrap();
    let first = device.buffers_with_usage(BufferUsage::VERTEX)[0].id;

    geometry.invalidate_substrate();
    assert!(device.destroyed_buffers().contains(&first));

    geometry.prewarm(&driver).unwrap();
    let vertex_buffers = device.buffers_with_usage(BufferUsage::VERTEX);
    assert_eq!(vertex_buffers.len(), 2);
    assert!(!device.destroyed_buffers().contains(&vertex_buffers[1].id));
}
