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

//! Packing of geometry sources into vertex buffers.

use std::borrow::Cow;
use strata_core::geometry::{GeometrySource, VertexData};
use strata_core::renderer::api::pipeline::{
    VertexAttributeDescriptor, VertexBufferLayoutDescriptor, VertexFormat, VertexStepMode,
};
use strata_core::renderer::SubstrateError;

/// Sources sharing one [`VertexData`], uploaded as one vertex buffer.
#[derive(Debug, Clone)]
pub(crate) struct VertexGroup {
    pub(crate) data: VertexData,
    pub(crate) size: usize,
    pub(crate) layout: VertexBufferLayoutDescriptor<'static>,
}

/// Maps a source's component layout to a vertex format.
///
/// ## Errors
///
/// Returns [`SubstrateError::UnsupportedVertexLayout`] for any combination
/// other than 1 to 4 four-byte components or 2 or 4 two-byte components.
pub(crate) fn vertex_format(source: &GeometrySource) -> Result<VertexFormat, SubstrateError> {
    let layout = source.layout();
    match (layout.bytes_per_component, layout.components_per_vertex) {
        (4, 1) => Ok(VertexFormat::Float32),
        (4, 2) => Ok(VertexFormat::Float32x2),
        (4, 3) => Ok(VertexFormat::Float32x3),
        (4, 4) => Ok(VertexFormat::Float32x4),
        (2, 2) => Ok(VertexFormat::Float16x2),
        (2, 4) => Ok(VertexFormat::Float16x4),
        (bytes_per_component, components_per_vertex) => {
            Err(SubstrateError::UnsupportedVertexLayout {
                semantic: source.semantic(),
                bytes_per_component,
                components_per_vertex,
            })
        }
    }
}

/// Groups sources by data identity, in order of first appearance.
///
/// Each group's stride is its first source's stride and each source becomes
/// one attribute at its semantic's location. A location already taken by
/// an earlier source of any group, or an attribute reaching past the stride,
/// is skipped with a warning.
///
/// ## Errors
///
/// Returns [`SubstrateError::StrideMismatch`] if a source disagrees with its
/// group's stride, or [`SubstrateError::UnsupportedVertexLayout`].
pub(crate) fn group_sources(sources: &[GeometrySource]) -> Result<Vec<VertexGroup>, SubstrateError> {
    let mut groups: Vec<VertexGroup> = Vec::new();
    let mut attributes: Vec<Vec<VertexAttributeDescriptor>> = Vec::new();

    for source in sources {
        let format = vertex_format(source)?;
        let index = match groups.iter().position(|g| g.data.id() == source.data().id()) {
            Some(index) => index,
            None => {
                groups.push(VertexGroup {
                    data: source.data().clone(),
                    size: 0,
                    layout: VertexBufferLayoutDescriptor {
                        array_stride: source.stride() as u64,
                        step_mode: VertexStepMode::Vertex,
                        attributes: Cow::Owned(Vec::new()),
                    },
                });
                attributes.push(Vec::new());
                groups.len() - 1
            }
        };

        let group = &mut groups[index];
        let stride = group.layout.array_stride as usize;
        if source.stride() != stride {
            return Err(SubstrateError::StrideMismatch {
                group: index,
                expected: stride,
                found: source.stride(),
                semantic: source.semantic(),
            });
        }

        let size = (source.vertex_count() * stride).min(group.data.len());
        group.size = group.size.max(size);

        let location = source.semantic().shader_location();
        let bound_in = attributes
            .iter()
            .position(|attrs| attrs.iter().any(|a| a.shader_location == location));
        if let Some(bound_in) = bound_in {
            log::warn!(
                "GeometrySubstrate: {:?} source skipped, location {} already bound in vertex buffer {}",
                source.semantic(),
                location,
                bound_in
            );
            continue;
        }
        if source.offset() as u64 + format.size() > stride as u64 {
            log::warn!(
                "GeometrySubstrate: {:?} source skipped, offset {} lies outside the {}-byte vertex",
                source.semantic(),
                source.offset(),
                stride
            );
            continue;
        }
        attributes[index].push(VertexAttributeDescriptor {
            shader_location: location,
            format,
            offset: source.offset() as u64,
        });
    }

    for (group, attrs) in groups.iter_mut().zip(attributes) {
        group.layout.attributes = Cow::Owned(attrs);
    }
    Ok(groups)
}
